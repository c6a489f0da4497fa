//! Direct processing of judgments.

use super::derivation::DerivationContext;
use super::internal_experience;
use super::local_rules::{revisible, revision, try_solution};
use crate::concept::{add_to_table, Concept};
use crate::entity::{StampEq, Task};
use crate::memory::events::Event;
use crate::memory::MemoryError;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentDecision {
    /// Same evidence and time as a resident belief
    Duplicate,
    BelowThreshold,
    /// Offered to the belief table; `added` is false when it was ranked out
    Stored { added: bool, revised: bool },
}

/// Revises against the best revisible belief, answers pending questions and
/// stores the judgment in the belief table.
pub fn process_judgment(
    concept: &mut Concept,
    ctx: &mut DerivationContext<'_>,
    mut task: Task,
) -> Result<JudgmentDecision, MemoryError> {
    let config = ctx.config;
    if task.truth().is_none() {
        return Err(MemoryError::MissingTruth(task.sentence().punctuation()));
    }
    let judgment = task.sentence().clone();
    let same = StampEq {
        occurrence_time: true,
        ..StampEq::EVIDENCE
    };
    if concept
        .beliefs
        .iter()
        .any(|b| b.stamp().equals(judgment.stamp(), same))
    {
        debug!(event = "judgment.duplicate", term = %ctx.terms.render(judgment.term()));
        return Ok(JudgmentDecision::Duplicate);
    }

    let now = ctx.time();
    let mut revised = false;
    let candidate = concept
        .beliefs
        .iter()
        .find(|b| revisible(&judgment, b.sentence(), config))
        .map(|b| b.sentence().clone());
    if let Some(old) = candidate {
        let projected = old.projection(judgment.occurrence_time(), now, config.duration, config.horizon);
        revised = revision(&judgment, &projected, task.budget_mut(), ctx);
        if revised {
            debug!(event = "judgment.revised", term = %ctx.terms.render(judgment.term()));
        }
    }

    if !task.above_threshold(config.budget_threshold) {
        return Ok(JudgmentDecision::BelowThreshold);
    }
    for question in concept.questions.iter_mut() {
        try_solution(&judgment, question, ctx);
    }

    internal_experience::reflect(ctx, &task)?;
    let outcome = add_to_table(&mut concept.beliefs, task.clone(), config.bags.beliefs);
    if outcome.added {
        ctx.emit(Event::ConceptBeliefAdd {
            concept: concept.term(),
            task,
        });
    }
    if let Some(removed) = outcome.removed {
        ctx.emit(Event::ConceptBeliefRemove {
            concept: concept.term(),
            task: removed,
        });
    }
    Ok(JudgmentDecision::Stored {
        added: outcome.added,
        revised,
    })
}
