//! The goal decision procedure: revise, realize, ask, or act.
//!
//! A goal entering a concept runs through a fixed sequence of checks. Each
//! may end the attempt, and none of these endings is an error. The task can
//! come back on a later cycle and try again.
//!
//! 1. duplicate of the best resident desire
//! 2. answer pending quests and look up the best matching belief
//! 3. revision with a revisible desire, which ends the attempt on success
//! 4. re-projection of a stale goal to the present
//! 5. priority scaled by anti-satisfaction
//! 6. fulfilled goals are dropped
//! 7. commit: best reaction, how-question, desire table, reflection
//! 8. direct execution when the goal names an operation

use super::anticipation::{self, Anticipation};
use super::derivation::DerivationContext;
use super::internal_experience;
use super::local_rules::{revisible, revision, try_solution};
use super::operation::execute_operation;
use crate::concept::{add_to_table, select_candidate, Concept};
use crate::entity::truth;
use crate::entity::{base_overlap, Budget, Punctuation, Sentence, StampEq, Task, TruthValue};
use crate::language::{Connector, TemporalOrder, TermArena, TermId, VarKind};
use crate::memory::events::Event;
use crate::memory::MemoryError;
use tracing::{debug, warn};

/// Anti-satisfaction assumed when nothing is believed about the goal yet
const UNKNOWN_ANTI_SATISFACTION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalDecision {
    Duplicate,
    /// A revised desire was derived and will be processed on its own
    Revised,
    /// Too weak to pursue once scaled by anti-satisfaction
    BelowThreshold,
    Fulfilled,
    /// Entered the desire table; `executed` if an operation ran for it
    Committed { executed: bool },
}

/// Components of a learned `(&/, events.., ^op, +n) =/> effect` judgment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreconditionParts {
    pub events: Vec<TermId>,
    pub operation: TermId,
    /// Cycles between the operation and the effect
    pub interval: u64,
    pub effect: TermId,
}

/// Splits an executable-precondition implication, or `None` when the term
/// does not have that shape.
pub fn precondition_parts(terms: &TermArena, term: TermId) -> Option<PreconditionParts> {
    if terms.connector(term) != Some(Connector::Implication) || terms.order(term) != TemporalOrder::Forward {
        return None;
    }
    let subject = terms.subject(term)?;
    let effect = terms.predicate(term)?;
    if terms.connector(subject) != Some(Connector::Conjunction) || terms.order(subject) != TemporalOrder::Forward {
        return None;
    }
    let components = terms.components(subject);
    let [rest @ .., operation, interval] = components else {
        return None;
    };
    let interval = terms.interval_cycles(*interval)?;
    if !terms.is_operation(*operation) {
        return None;
    }
    let events = match rest {
        [events @ .., last] if terms.interval_cycles(*last).is_some() => events,
        events => events,
    };
    if events.is_empty() {
        return None;
    }
    Some(PreconditionParts {
        events: events.to_vec(),
        operation: *operation,
        interval,
        effect,
    })
}

pub fn process_goal(
    concept: &mut Concept,
    ctx: &mut DerivationContext<'_>,
    mut task: Task,
) -> Result<GoalDecision, MemoryError> {
    let config = ctx.config;
    let now = ctx.time();
    let Some(desire) = task.truth().copied() else {
        return Err(MemoryError::MissingTruth(Punctuation::Goal));
    };
    let goal = task.sentence().clone();

    let old_goal = select_candidate(&concept.desires, &goal, now, config.duration, config.horizon)
        .map(|i| concept.desires[i].clone());
    if let Some(old) = &old_goal {
        if goal.stamp().equals(old.stamp(), StampEq::EVIDENCE) {
            debug!(event = "goal.duplicate", term = %ctx.terms.render(goal.term()));
            return Ok(GoalDecision::Duplicate);
        }
    }

    let mut belief = None;
    if task.above_threshold(config.budget_threshold) {
        belief = select_candidate(&concept.beliefs, &goal, now, config.duration, config.horizon)
            .map(|i| concept.beliefs[i].sentence().clone());
        for quest in concept.quests.iter_mut() {
            try_solution(&goal, quest, ctx);
        }
        if let Some(b) = &belief {
            try_solution(b, &mut task, ctx);
        }
    }

    if let Some(old) = &old_goal {
        if revisible(&goal, old.sentence(), config) {
            let projected = old
                .sentence()
                .projection(goal.occurrence_time(), now, config.duration, config.horizon);
            if revision(&goal, &projected, task.budget_mut(), ctx) {
                debug!(event = "goal.revised", term = %ctx.terms.render(goal.term()));
                return Ok(GoalDecision::Revised);
            }
        }
    }

    let present = goal.stamp().with_occurrence_time(Some(now));
    if present.after(goal.stamp(), config.duration) {
        let current = goal.projection(Some(now), now, config.duration, config.horizon);
        if current.expectation() > config.decision_threshold {
            ctx.single_premise_task(current, *task.budget());
        }
    }

    if !task.above_threshold(config.budget_threshold) {
        return Ok(GoalDecision::BelowThreshold);
    }
    let anti_satisfaction = match &belief {
        Some(b) => {
            let projected = b.projection(goal.occurrence_time(), now, config.duration, config.horizon);
            projected
                .truth()
                .map_or(UNKNOWN_ANTI_SATISFACTION, |t| desire.exp_dif_abs(t))
        }
        None => UNKNOWN_ANTI_SATISFACTION,
    };
    task.budget_mut().scale_priority(anti_satisfaction);
    if task.priority() <= 0.0 || !task.above_threshold(config.budget_threshold) {
        debug!(
            event = "goal.below_threshold",
            term = %ctx.terms.render(goal.term()),
            anti_satisfaction,
        );
        return Ok(GoalDecision::BelowThreshold);
    }
    if anti_satisfaction < config.satisfaction_threshold {
        debug!(event = "goal.fulfilled", term = %ctx.terms.render(goal.term()));
        return Ok(GoalDecision::Fulfilled);
    }

    let projected_goal = goal.projection(Some(now), now, config.duration, config.horizon);
    let mut executed = best_reaction_for_goal(concept, ctx, &projected_goal, &task)?;
    question_from_goal(ctx, &task)?;

    let outcome = add_to_table(&mut concept.desires, task.clone(), config.bags.goals);
    if outcome.added {
        ctx.emit(Event::ConceptGoalAdd {
            concept: concept.term(),
            task: task.clone(),
        });
    }
    if let Some(removed) = outcome.removed {
        ctx.emit(Event::ConceptGoalRemove {
            concept: concept.term(),
            task: removed,
        });
    }
    internal_experience::reflect(ctx, &task)?;

    if ctx.terms.is_operation(goal.term()) {
        executed |= process_operation_goal(concept, ctx, &projected_goal, old_goal.as_ref(), &task);
    }
    debug!(
        event = "goal.committed",
        term = %ctx.terms.render(goal.term()),
        priority = task.priority(),
        executed,
    );
    Ok(GoalDecision::Committed { executed })
}

/// Executes a goal that is itself an operation, unless its evidence was
/// already acted upon through the previous desire.
fn process_operation_goal(
    concept: &Concept,
    ctx: &mut DerivationContext<'_>,
    projected_goal: &Sentence,
    old_goal: Option<&Task>,
    task: &Task,
) -> bool {
    if projected_goal.expectation() <= ctx.config.decision_threshold || !ctx.clock.decision_allowed() {
        return false;
    }
    let acted_upon = old_goal.is_some_and(|old| task.stamp().evidence_subset_of(old.stamp()));
    if acted_upon {
        return false;
    }
    if execute_operation(ctx, task) {
        return true;
    }
    warn!(event = "goal.unexecutable", term = %ctx.terms.render(task.term()));
    ctx.emit(Event::UnexecutableGoal {
        concept: concept.term(),
        task: task.clone(),
    });
    false
}

/// Asks how the goal can be reached and, separately, whether it already holds
pub fn question_from_goal(ctx: &mut DerivationContext<'_>, task: &Task) -> Result<(), MemoryError> {
    let config = ctx.config;
    let term = task.term();
    let mut questions = Vec::new();
    if config.how_question_on_decision {
        let statement = matches!(
            ctx.terms.connector(term),
            Some(Connector::Implication | Connector::Equivalence)
        );
        if !statement && !ctx.terms.is_operation(term) {
            let how = ctx.terms_mut().variable(VarKind::Query, "how");
            questions.push(ctx.terms_mut().implication(how, term, TemporalOrder::Forward)?);
        }
    }
    if config.question_on_decision {
        questions.push(term);
    }

    let now = ctx.time();
    for question in questions {
        let stamp = task
            .stamp()
            .with_creation_time(now)
            .with_occurrence_time(task.sentence().occurrence_time());
        let budget = Budget::new(
            task.priority() * config.budgets.curiosity_priority_mul,
            task.budget().durability() * config.budgets.curiosity_durability_mul,
            1.0,
        );
        ctx.single_premise_task(Sentence::new(question, Punctuation::Question, None, stamp), budget);
    }
    Ok(())
}

/// The strongest precondition whose context was just observed
#[derive(Debug, Clone)]
pub struct BestPrecondition {
    pub operation: TermId,
    pub desire: TruthValue,
    pub hypothesis: Task,
    pub min_time: i64,
    pub max_time: i64,
}

impl BestPrecondition {
    pub fn expectation(&self) -> f32 {
        self.desire.expectation()
    }
}

/// Scans the concept's executable preconditions for the one whose event
/// context was seen most recently and whose chained desire is strongest.
/// Candidates sharing evidence with the goal, or whose observed context
/// shares evidence with the hypothesis or the goal, never qualify. On equal
/// expectation the first in table order wins.
pub fn calc_best_executable_precondition(
    concept: &Concept,
    ctx: &mut DerivationContext<'_>,
    projected_goal: &Sentence,
) -> Result<Option<BestPrecondition>, MemoryError> {
    let config = ctx.config;
    let now = ctx.time();
    let Some(goal_desire) = projected_goal.truth().copied() else {
        return Ok(None);
    };
    let mut best: Option<BestPrecondition> = None;

    for hypothesis in &concept.executable_preconditions {
        let Some(parts) = precondition_parts(ctx.terms(), hypothesis.term()) else {
            continue;
        };
        let Some(hypothesis_truth) = hypothesis.truth() else {
            continue;
        };
        let precondition = ctx.terms_mut().conjunction(&parts.events, TemporalOrder::Forward)?;

        let mut newest: Option<&Task> = None;
        for event in ctx.recent_events.iter() {
            let s = event.sentence();
            let Some(at) = s.occurrence_time() else {
                continue;
            };
            if s.term() == precondition
                && s.is_judgment()
                && at <= now
                && newest.map_or(true, |n| Some(at) > n.sentence().occurrence_time())
            {
                newest = Some(event);
            }
        }
        let Some(observed) = newest else {
            continue;
        };

        let goal_base = projected_goal.stamp().evidential_base();
        let hypothesis_base = hypothesis.stamp().evidential_base();
        let observed_base = observed.stamp().evidential_base();
        if base_overlap(goal_base, hypothesis_base)
            || base_overlap(observed_base, hypothesis_base)
            || base_overlap(goal_base, observed_base)
        {
            continue;
        }

        let projected = observed
            .sentence()
            .projection(Some(now), now, config.duration, config.horizon);
        if projected.is_eternal() {
            // too long ago to count as the current context
            continue;
        }
        let Some(context_truth) = projected.truth() else {
            continue;
        };
        let left = truth::desire_ded(&goal_desire, hypothesis_truth);
        let desire = truth::desire_ded(context_truth, &left);
        if best.as_ref().map_or(0.0, BestPrecondition::expectation) < desire.expectation() {
            let tolerance = (parts.interval as f32 * config.anticipation_tolerance) as i64;
            best = Some(BestPrecondition {
                operation: parts.operation,
                desire,
                hypothesis: hypothesis.clone(),
                min_time: now,
                max_time: now + tolerance,
            });
        }
    }
    Ok(best)
}

/// Runs the best precondition's operation when it is desired strongly
/// enough, then blocks further decisions for a while and anticipates the
/// effect.
pub fn execute_precondition(
    concept: &Concept,
    ctx: &mut DerivationContext<'_>,
    best: BestPrecondition,
    projected_goal: &Sentence,
    task: &Task,
) -> bool {
    let config = ctx.config;
    if best.expectation() <= config.decision_threshold || !ctx.clock.decision_allowed() {
        return false;
    }
    let Some((operator, _)) = ctx.terms.operation_parts(best.operation) else {
        return false;
    };
    if task.stamp().evidence_is_cyclic(operator) {
        debug!(event = "goal.cyclic_evidence", operation = %ctx.terms.render(best.operation));
        return false;
    }

    let action = Task::new(
        Sentence::new(
            best.operation,
            Punctuation::Judgment,
            Some(best.desire),
            projected_goal.stamp().clone(),
        ),
        Budget::new(1.0, 1.0, 1.0),
    );
    if !execute_operation(ctx, &action) {
        warn!(event = "goal.unexecutable", operation = %ctx.terms.render(best.operation));
        ctx.emit(Event::UnexecutableGoal {
            concept: concept.term(),
            task: task.clone(),
        });
        return false;
    }

    let now = ctx.time();
    ctx.clock.set_decision_block(now + config.decision_block_cycles);
    anticipation::anticipate(
        ctx.anticipations,
        Anticipation {
            effect: concept.term(),
            hypothesis: best.hypothesis,
            min_time: best.min_time,
            max_time: best.max_time,
        },
        config.anticipation_capacity,
    );
    true
}

fn best_reaction_for_goal(
    concept: &Concept,
    ctx: &mut DerivationContext<'_>,
    projected_goal: &Sentence,
    task: &Task,
) -> Result<bool, MemoryError> {
    match calc_best_executable_precondition(concept, ctx, projected_goal)? {
        Some(best) => Ok(execute_precondition(concept, ctx, best, projected_goal, task)),
        None => Ok(false),
    }
}
