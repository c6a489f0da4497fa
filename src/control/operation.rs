//! Hands a decided operation to its registered operator.

use super::derivation::DerivationContext;
use crate::entity::budget;
use crate::entity::{Budget, Punctuation, Sentence, Stamp, Task, TruthValue};
use crate::memory::events::Event;
use tracing::{debug, info};

/// Executes the operation `task` names. Refusals are ordinary outcomes:
/// execution disabled, not an operation, unbound variables, an agent other
/// than `SELF`, no such operator, or the operator reporting failure.
pub fn execute_operation(ctx: &mut DerivationContext<'_>, task: &Task) -> bool {
    if !ctx.config.allow_execution {
        return false;
    }
    let term = task.term();
    let Some((operator, args)) = ctx.terms.operation_parts(term) else {
        return false;
    };
    let args = args.to_vec();
    let Some(name) = ctx.terms.operator_name(operator).map(str::to_string) else {
        return false;
    };
    let Some(is_function) = ctx.operators.get_mut(&name).map(|op| op.is_function()) else {
        debug!(event = "operation.unregistered", operator = %name);
        return false;
    };

    let bound = if is_function {
        // the output argument may stay open
        let inputs = &args[..args.len().saturating_sub(1)];
        inputs
            .iter()
            .all(|a| !ctx.terms.has_var_indep(*a) && !ctx.terms.has_var_dep(*a))
    } else {
        !ctx.terms.has_var_indep(term) && !ctx.terms.has_var_dep(term)
    };
    if !bound {
        debug!(event = "operation.unbound", operation = %ctx.terms.render(term));
        return false;
    }
    if args.first() != Some(&ctx.terms.self_term()) {
        debug!(event = "operation.foreign_agent", operation = %ctx.terms.render(term));
        return false;
    }

    let terms = &*ctx.terms;
    let succeeded = match ctx.operators.get_mut(&name) {
        Some(op) => op.execute(term, &args, terms),
        None => false,
    };
    if !succeeded {
        debug!(event = "operation.failed", operation = %ctx.terms.render(term));
        return false;
    }

    info!(
        event = "operation.executed",
        operation = %ctx.terms.render(term),
        expectation = task.sentence().expectation(),
    );
    ctx.emit(Event::OperationExecuted {
        operation: term,
        task: task.clone(),
    });

    // The system perceives its own action. The marker keeps this evidence
    // from triggering the same operator again.
    let now = ctx.time();
    let serial = ctx.new_serial();
    let defaults = &ctx.config.budgets;
    let truth = TruthValue::new(1.0, defaults.judgment_confidence);
    let feedback = Sentence::new(
        term,
        Punctuation::Judgment,
        Some(truth),
        Stamp::new(serial, now, Some(now)).with_execution(operator),
    );
    let budget = Budget::new(
        defaults.judgment_priority,
        defaults.judgment_durability,
        budget::truth_to_quality(&truth),
    );
    ctx.derived_task(Task::new(feedback, budget));
    true
}
