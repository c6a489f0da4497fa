//! Reflective judgments about the system's own tasks.

use super::derivation::DerivationContext;
use crate::entity::budget;
use crate::entity::{Budget, Punctuation, Sentence, Task, TruthValue};
use crate::memory::MemoryError;

fn operator_for(punctuation: Punctuation) -> &'static str {
    match punctuation {
        Punctuation::Judgment => "believe",
        Punctuation::Goal => "want",
        Punctuation::Question => "wonder",
        Punctuation::Quest => "evaluate",
    }
}

fn truth_word(truth: &TruthValue) -> &'static str {
    let e = truth.expectation();
    if e > 0.66 {
        "true"
    } else if e < 0.33 {
        "false"
    } else {
        "unsure"
    }
}

/// Derives `<(*, SELF, term[, word]) --> ^believe|^want|^wonder|^evaluate>`
/// for `task`. Returns whether a reflection was derived. A term that cannot
/// be built is a broken collaborator, not a reasoning outcome.
pub fn reflect(ctx: &mut DerivationContext<'_>, task: &Task) -> Result<bool, MemoryError> {
    let config = ctx.config;
    let settings = &config.internal_experience;
    if !settings.enabled {
        return Ok(false);
    }
    let sentence = task.sentence();
    let min_priority = match sentence.punctuation() {
        Punctuation::Judgment | Punctuation::Goal => {
            if !settings.allow_want_believe {
                return Ok(false);
            }
            settings.min_priority_want_believe
        }
        Punctuation::Question | Punctuation::Quest => settings.min_priority_wonder_evaluate,
    };
    if task.priority() < min_priority {
        return Ok(false);
    }
    // recursion guard
    if ctx.terms.is_operation(sentence.term()) {
        return Ok(false);
    }

    let now = ctx.time();
    let mut args = vec![ctx.terms.self_term(), sentence.term()];
    if sentence.truth().is_some() {
        let projected = sentence.projection(Some(now), now, config.duration, config.horizon);
        if let Some(t) = projected.truth() {
            let word = truth_word(t);
            args.push(ctx.terms_mut().atom(word));
        }
    }
    let operator = ctx.terms_mut().operator(operator_for(sentence.punctuation()));
    let reflection = ctx.terms_mut().operation(operator, &args)?;

    let truth = TruthValue::new(1.0, config.budgets.judgment_confidence);
    let stamp = sentence.stamp().with_occurrence_time(Some(now));
    let b = task.budget();
    let reflected_budget = Budget::new(
        b.priority() * settings.priority_mul,
        b.durability() * settings.durability_mul,
        budget::truth_to_quality(&truth),
    );
    Ok(ctx.single_premise_task(
        Sentence::new(reflection, Punctuation::Judgment, Some(truth), stamp),
        reflected_budget,
    ))
}
