//! Rules that act within a single concept: revision and answering.

use super::derivation::DerivationContext;
use crate::config::Config;
use crate::entity::budget;
use crate::entity::stamp::base_overlap;
use crate::entity::truth;
use crate::entity::{Budget, Punctuation, Sentence, Task};
use crate::memory::events::Event;
use tracing::debug;

/// Same term and kind, temporally close enough, and independent evidence
pub fn revisible(a: &Sentence, b: &Sentence, config: &Config) -> bool {
    if a.term() != b.term() || a.punctuation() != b.punctuation() {
        return false;
    }
    if a.truth().is_none() || b.truth().is_none() {
        return false;
    }
    if let (Some(x), Some(y)) = (a.occurrence_time(), b.occurrence_time()) {
        if (x - y).abs() > config.revision_max_occurrence_distance {
            return false;
        }
    }
    !base_overlap(a.stamp().evidential_base(), b.stamp().evidential_base())
}

/// Pools `new` with the already projected `old`. The premise task's budget
/// pays for the step. Returns whether a conclusion was derived.
pub fn revision(new: &Sentence, old: &Sentence, task_budget: &mut Budget, ctx: &mut DerivationContext<'_>) -> bool {
    let (Some(new_truth), Some(old_truth)) = (new.truth(), old.truth()) else {
        return false;
    };
    let revised = truth::revision(new_truth, old_truth, ctx.config.horizon);
    let conclusion_budget = budget::revise(new_truth, old_truth, &revised, task_budget);
    ctx.double_premise_task(
        new.term(),
        new.punctuation(),
        Some(revised),
        conclusion_budget,
        new.stamp(),
        old.stamp(),
    )
}

fn solution_quality(problem: &Sentence, solution: &Sentence) -> f32 {
    match (problem.punctuation(), solution.truth()) {
        (_, None) => 0.0,
        (Punctuation::Question | Punctuation::Quest, Some(t)) => t.expectation(),
        (Punctuation::Judgment | Punctuation::Goal, Some(t)) => t.confidence(),
    }
}

/// Offers `solution` to `task`. Keeps it when it beats the best seen so
/// far; answered questions give up priority and emit [`Event::Answer`].
pub fn try_solution(solution: &Sentence, task: &mut Task, ctx: &mut DerivationContext<'_>) -> bool {
    if solution.term() != task.term() {
        return false;
    }
    let config = ctx.config;
    let problem = task.sentence().clone();
    let projected = solution.projection(problem.occurrence_time(), ctx.time(), config.duration, config.horizon);
    let quality = solution_quality(&problem, &projected);
    if let Some(old) = task.best_solution() {
        if quality <= solution_quality(&problem, old) {
            return false;
        }
    }
    task.set_best_solution(projected.clone());

    if matches!(problem.punctuation(), Punctuation::Question | Punctuation::Quest) {
        task.budget_mut().scale_priority(1.0 - quality);
        debug!(
            event = "question.answered",
            term = %ctx.terms.render(problem.term()),
            quality,
        );
        ctx.emit(Event::Answer {
            question: task.clone(),
            solution: projected,
        });
    }
    true
}
