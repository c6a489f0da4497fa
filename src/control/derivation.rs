//! Per-step scratch context: stamps, budgets and collects derived tasks.

use super::anticipation::Anticipation;
use crate::bag::Bag;
use crate::concept::Concept;
use crate::config::Config;
use crate::entity::{Budget, Punctuation, Sentence, Stamp, Task, TruthValue};
use crate::language::{TermArena, TermId};
use crate::memory::clock::Clock;
use crate::memory::events::{Event, EventBus};
use crate::operator::OperatorRegistry;
use std::collections::VecDeque;
use tracing::trace;

/// Borrowed view of one memory while a single task or concept is being
/// processed. The concept being processed is owned by the caller and is
/// not reachable through `concepts`.
pub struct DerivationContext<'a> {
    pub(crate) config: &'a Config,
    pub(crate) terms: &'a mut TermArena,
    pub(crate) clock: &'a mut Clock,
    pub(crate) events: &'a mut EventBus,
    pub(crate) operators: &'a mut OperatorRegistry,
    pub(crate) concepts: &'a Bag<Concept>,
    pub(crate) recent_events: &'a VecDeque<Task>,
    pub(crate) anticipations: &'a mut Vec<Anticipation>,
    derived: Vec<Task>,
}

impl<'a> DerivationContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: &'a Config,
        terms: &'a mut TermArena,
        clock: &'a mut Clock,
        events: &'a mut EventBus,
        operators: &'a mut OperatorRegistry,
        concepts: &'a Bag<Concept>,
        recent_events: &'a VecDeque<Task>,
        anticipations: &'a mut Vec<Anticipation>,
    ) -> Self {
        Self {
            config,
            terms,
            clock,
            events,
            operators,
            concepts,
            recent_events,
            anticipations,
            derived: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn terms(&self) -> &TermArena {
        &*self.terms
    }

    pub fn terms_mut(&mut self) -> &mut TermArena {
        &mut *self.terms
    }

    pub fn time(&self) -> i64 {
        self.clock.time()
    }

    pub fn new_serial(&mut self) -> i64 {
        self.clock.new_serial()
    }

    /// Another resident concept, read-only
    pub fn concept(&self, term: TermId) -> Option<&Concept> {
        self.concepts.get(&term)
    }

    pub fn recent_events(&self) -> &VecDeque<Task> {
        self.recent_events
    }

    pub fn emit(&mut self, event: Event) {
        self.events.emit(event);
    }

    /// Tasks below the budget threshold are dropped here; this is what caps
    /// derivation fan-out.
    pub fn derived_task(&mut self, task: Task) -> bool {
        if !task.above_threshold(self.config.budget_threshold) {
            trace!(
                event = "derivation.below_threshold",
                term = %self.terms.render(task.term()),
                priority = task.priority(),
            );
            return false;
        }
        if task.sentence().is_judgment() && self.terms.has_var_query(task.term()) {
            return false;
        }
        self.derived.push(task);
        true
    }

    /// Conclusion resting on one premise; the caller supplies its stamp
    pub fn single_premise_task(&mut self, sentence: Sentence, budget: Budget) -> bool {
        self.derived_task(Task::new(sentence, budget))
    }

    /// Conclusion resting on two premises: evidential bases are merged and
    /// the conclusion takes the occurrence time of `first`
    pub fn double_premise_task(
        &mut self,
        term: TermId,
        punctuation: Punctuation,
        truth: Option<TruthValue>,
        budget: Budget,
        first: &Stamp,
        second: &Stamp,
    ) -> bool {
        let stamp = Stamp::merge(first, second, self.time(), self.config.max_evidential_base);
        self.derived_task(Task::new(Sentence::new(term, punctuation, truth, stamp), budget))
    }

    pub fn derived(&self) -> &[Task] {
        &self.derived
    }

    pub(crate) fn into_derived(self) -> Vec<Task> {
        self.derived
    }
}
