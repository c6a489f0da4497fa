//! Per-task control: direct processing inside one concept, and the seam to
//! link-mediated inference.

pub mod anticipation;
pub mod derivation;
pub mod goal;
pub mod internal_experience;
pub mod judgment;
pub mod local_rules;
pub mod operation;
pub mod question;

pub use anticipation::Anticipation;
pub use derivation::DerivationContext;
pub use goal::{precondition_parts, GoalDecision, PreconditionParts};
pub use judgment::JudgmentDecision;
pub use question::QuestionDecision;

use crate::concept::Concept;
use crate::entity::{Punctuation, Sentence, Task};
use crate::memory::MemoryError;

/// Two-premise inference over a fired concept. Implementations push their
/// conclusions through [`DerivationContext::double_premise_task`] and friends
/// so that stamps merge and weak conclusions are dropped.
pub trait Inference: Send {
    fn fire(
        &mut self,
        ctx: &mut DerivationContext<'_>,
        concept: &Concept,
        task: &Task,
        belief: Option<&Sentence>,
    ) -> Result<(), MemoryError>;
}

/// Derives nothing; the memory still selects, decays and forgets
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInference;

impl Inference for NullInference {
    fn fire(
        &mut self,
        _ctx: &mut DerivationContext<'_>,
        _concept: &Concept,
        _task: &Task,
        _belief: Option<&Sentence>,
    ) -> Result<(), MemoryError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectOutcome {
    Judgment(JudgmentDecision),
    Goal(GoalDecision),
    Question(QuestionDecision),
}

/// Routes `task` to the procedure for its punctuation
pub fn direct_process(
    concept: &mut Concept,
    ctx: &mut DerivationContext<'_>,
    task: Task,
) -> Result<DirectOutcome, MemoryError> {
    match task.sentence().punctuation() {
        Punctuation::Judgment => judgment::process_judgment(concept, ctx, task).map(DirectOutcome::Judgment),
        Punctuation::Goal => goal::process_goal(concept, ctx, task).map(DirectOutcome::Goal),
        Punctuation::Question | Punctuation::Quest => {
            Ok(DirectOutcome::Question(question::process_question(concept, ctx, task)))
        }
    }
}
