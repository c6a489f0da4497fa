//! The reasoner's working memory and its cycle driver.
//!
//! A [`Memory`] owns every concept, the logical clock and the event bus.
//! Each call to [`Memory::cycle`] processes pending input, one derived task
//! and one fired concept, strictly in that order and on the calling thread.

pub mod clock;
pub mod error;
pub mod events;

pub use clock::Clock;
pub use error::MemoryError;
pub use events::{Event, EventBus, EventKind, EventLog, Observer, SubscriptionId};

use crate::bag::{Bag, Item};
use crate::concept::{Concept, TaskLink, TermLink};
use crate::config::Config;
use crate::control::anticipation::{self, Anticipation};
use crate::control::{
    direct_process, internal_experience, precondition_parts, DerivationContext, DirectOutcome, Inference,
    JudgmentDecision, NullInference,
};
use crate::entity::budget;
use crate::entity::{Budget, Punctuation, Sentence, Stamp, Task, TruthValue};
use crate::language::{Term, TermArena, TermId};
use crate::operator::{Operator, OperatorRegistry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use tracing::{debug, debug_span, trace, warn};

/// Builds a [`DerivationContext`] from disjoint fields of a memory
macro_rules! derivation_context {
    ($memory:ident) => {
        DerivationContext::new(
            &$memory.config,
            &mut $memory.terms,
            &mut $memory.clock,
            &mut $memory.events,
            &mut $memory.operators,
            &$memory.concepts,
            &$memory.recent_events,
            &mut $memory.anticipations,
        )
    };
}

/// What one call to [`Memory::cycle`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Logical time the cycle ran at
    pub time: i64,
    /// Tasks directly processed, input and derived
    pub processed: usize,
    /// A concept was selected and fired
    pub fired: bool,
}

pub struct Memory {
    config: Config,
    terms: TermArena,
    clock: Clock,
    concepts: Bag<Concept>,
    /// Derived tasks waiting for their turn
    novel_tasks: Bag<Task>,
    /// Input tasks, all processed on the next cycle
    new_tasks: VecDeque<Task>,
    /// Latest event judgments, newest last
    recent_events: VecDeque<Task>,
    anticipations: Vec<Anticipation>,
    events: EventBus,
    operators: OperatorRegistry,
    inference: Box<dyn Inference>,
    rng: StdRng,
}

impl Memory {
    /// Creates an empty memory after validating `config`
    pub fn new(config: Config) -> Result<Self, MemoryError> {
        config.validate()?;
        let bags = &config.bags;
        let concepts = Bag::new(bags.concepts, bags.levels, bags.concept_forgetting_cycles);
        let novel_tasks = Bag::new(bags.novel_tasks, bags.levels, bags.novel_task_forgetting_cycles);
        let rng = StdRng::seed_from_u64(config.seed);
        debug!(event = "memory.created", seed = config.seed, concepts = bags.concepts);
        Ok(Self {
            terms: TermArena::new(),
            clock: Clock::default(),
            concepts,
            novel_tasks,
            new_tasks: VecDeque::new(),
            recent_events: VecDeque::new(),
            anticipations: Vec::new(),
            events: EventBus::new(),
            operators: OperatorRegistry::new(),
            inference: Box::new(NullInference),
            rng,
            config,
        })
    }

    /// Replaces the two-premise inference step
    pub fn set_inference(&mut self, inference: impl Inference + 'static) {
        self.inference = Box::new(inference);
    }

    /// Returns the operator previously registered under the same name
    pub fn register_operator(&mut self, operator: impl Operator + 'static) -> Option<Box<dyn Operator>> {
        self.operators.register(Box::new(operator))
    }

    /// Registers `observer` for one kind of event
    pub fn subscribe(&mut self, kind: EventKind, observer: impl Observer + 'static) -> SubscriptionId {
        self.events.subscribe(kind, observer)
    }

    /// The event bus, for bulk subscription
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Configuration this memory was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Term arena shared by every task
    pub fn terms(&self) -> &TermArena {
        &self.terms
    }

    /// Term arena, for building input terms
    pub fn terms_mut(&mut self) -> &mut TermArena {
        &mut self.terms
    }

    /// Current cycle
    pub fn time(&self) -> i64 {
        self.clock.time()
    }

    /// For deterministic replay
    pub fn set_time(&mut self, time: i64) {
        self.clock.set_time(time);
    }

    /// First cycle at which the next automatic decision may run
    pub fn decision_block(&self) -> i64 {
        self.clock.decision_block()
    }

    /// Restores the decision cool-down, for replay
    pub fn set_decision_block(&mut self, cycle: i64) {
        self.clock.set_decision_block(cycle);
    }

    /// Resident concept for `term`
    pub fn concept(&self, term: TermId) -> Option<&Concept> {
        self.concepts.get(&term)
    }

    /// All resident concepts
    pub fn concepts(&self) -> &Bag<Concept> {
        &self.concepts
    }

    /// Derived tasks waiting for direct processing
    pub fn novel_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.novel_tasks.iter()
    }

    /// Number of derived tasks waiting
    pub fn novel_task_count(&self) -> usize {
        self.novel_tasks.len()
    }

    /// Input tasks queued for the next cycle
    pub fn pending_input(&self) -> usize {
        self.new_tasks.len()
    }

    /// Recently observed event judgments, oldest first
    pub fn recent_events(&self) -> &VecDeque<Task> {
        &self.recent_events
    }

    /// Effects still expected from executed operations
    pub fn anticipations(&self) -> &[Anticipation] {
        &self.anticipations
    }

    /// Fresh single-evidence stamp created now
    pub fn new_stamp(&mut self, occurrence_time: Option<i64>) -> Stamp {
        let serial = self.clock.new_serial();
        Stamp::new(serial, self.clock.time(), occurrence_time)
    }

    /// Queues a task for the next cycle
    pub fn input(&mut self, task: Task) -> Result<(), MemoryError> {
        let sentence = task.sentence();
        if matches!(sentence.punctuation(), Punctuation::Judgment | Punctuation::Goal) && sentence.truth().is_none() {
            return Err(MemoryError::MissingTruth(sentence.punctuation()));
        }
        debug!(
            event = "memory.input",
            term = %self.terms.render(task.term()),
            punctuation = ?sentence.punctuation(),
            priority = task.priority(),
        );
        self.new_tasks.push_back(task);
        Ok(())
    }

    fn input_with_truth(
        &mut self,
        term: TermId,
        punctuation: Punctuation,
        truth: Option<TruthValue>,
        occurrence_time: Option<i64>,
    ) -> Result<(), MemoryError> {
        let defaults = &self.config.budgets;
        let (priority, durability) = match punctuation {
            Punctuation::Judgment => (defaults.judgment_priority, defaults.judgment_durability),
            Punctuation::Goal => (defaults.goal_priority, defaults.goal_durability),
            Punctuation::Question | Punctuation::Quest => (defaults.question_priority, defaults.question_durability),
        };
        let quality = truth.as_ref().map_or(1.0, budget::truth_to_quality);
        let budget = Budget::new(priority, durability, quality);
        let stamp = self.new_stamp(occurrence_time);
        self.input(Task::input(Sentence::new(term, punctuation, truth, stamp), budget))
    }

    /// Queues a judgment with default budget
    pub fn input_judgment(
        &mut self,
        term: TermId,
        truth: TruthValue,
        occurrence_time: Option<i64>,
    ) -> Result<(), MemoryError> {
        self.input_with_truth(term, Punctuation::Judgment, Some(truth), occurrence_time)
    }

    /// Queues a goal with default budget
    pub fn input_goal(&mut self, term: TermId, desire: TruthValue, occurrence_time: Option<i64>) -> Result<(), MemoryError> {
        self.input_with_truth(term, Punctuation::Goal, Some(desire), occurrence_time)
    }

    /// Queues a question with default budget
    pub fn input_question(&mut self, term: TermId, occurrence_time: Option<i64>) -> Result<(), MemoryError> {
        self.input_with_truth(term, Punctuation::Question, None, occurrence_time)
    }

    /// Queues a quest with default budget
    pub fn input_quest(&mut self, term: TermId, occurrence_time: Option<i64>) -> Result<(), MemoryError> {
        self.input_with_truth(term, Punctuation::Quest, None, occurrence_time)
    }

    /// One reasoning cycle at the current time, after which the clock
    /// advances. Nothing here blocks; an empty memory idles.
    pub fn cycle(&mut self) -> Result<CycleReport, MemoryError> {
        let time = self.clock.time();
        let span = debug_span!("cycle", time);
        let _guard = span.enter();
        let mut report = CycleReport {
            time,
            ..CycleReport::default()
        };

        self.expire_anticipations();
        while let Some(task) = self.new_tasks.pop_front() {
            self.process_direct(task)?;
            report.processed += 1;
        }
        if let Some(task) = self.novel_tasks.take(&mut self.rng) {
            self.process_direct(task)?;
            report.processed += 1;
        }
        report.fired = self.fire_concept()?;

        self.clock.tick();
        Ok(report)
    }

    /// Runs `cycles` cycles, stopping at the first hard failure
    pub fn run(&mut self, cycles: usize) -> Result<(), MemoryError> {
        for _ in 0..cycles {
            self.cycle()?;
        }
        Ok(())
    }

    /// Processes `task` in its concept right away, bypassing the input queue
    pub fn process_direct(&mut self, task: Task) -> Result<DirectOutcome, MemoryError> {
        let term = task.term();
        let mut concept = match self.concepts.pick_out(&term) {
            Some(mut concept) => {
                concept.budget_mut().merge(task.budget());
                concept
            }
            None => Concept::new(term, *task.budget(), &self.config.bags),
        };

        let (outcome, derived) = {
            let mut ctx = derivation_context!(self);
            let outcome = direct_process(&mut concept, &mut ctx, task.clone()).and_then(|outcome| {
                if matches!(task.sentence().punctuation(), Punctuation::Question | Punctuation::Quest) {
                    internal_experience::reflect(&mut ctx, &task)?;
                }
                Ok(outcome)
            });
            (outcome, ctx.into_derived())
        };

        let stored = matches!(outcome, Ok(DirectOutcome::Judgment(JudgmentDecision::Stored { .. })));
        if outcome.is_ok() {
            self.link(&mut concept, &task);
            self.events.emit(Event::ConceptDirectProcessedTask {
                concept: term,
                task: task.clone(),
            });
        }
        self.put_concept(concept);
        self.absorb(derived);
        let outcome = outcome?;

        if stored {
            self.observe_judgment(&task);
        }
        Ok(outcome)
    }

    /// Task link in the concept, term links between it and its components
    fn link(&mut self, concept: &mut Concept, task: &Task) {
        let budget = *task.budget();
        concept.task_links.put(TaskLink::new(task.clone(), budget));

        let components: Vec<TermId> = self
            .terms
            .components(concept.term())
            .iter()
            .copied()
            .filter(|c| !matches!(self.terms.get(*c), Some(Term::Variable(..) | Term::Interval(_))))
            .collect();
        if components.is_empty() {
            return;
        }
        let mut share = budget;
        share.set_priority(budget.priority() / components.len() as f32);
        for component in components {
            concept.term_links.put(TermLink::new(component, share));
            let mut target = match self.concepts.pick_out(&component) {
                Some(c) => c,
                None => Concept::new(component, share, &self.config.bags),
            };
            target.term_links.put(TermLink::new(concept.term(), share));
            target.task_links.put(TaskLink::new(task.clone(), share));
            self.put_concept(target);
        }
    }

    fn put_concept(&mut self, concept: Concept) {
        if let Some(forgotten) = self.concepts.put(concept) {
            trace!(event = "memory.concept_forgotten", term = %self.terms.render(forgotten.term()));
            self.events.emit(Event::ConceptForgotten {
                concept: forgotten.term(),
            });
        }
    }

    fn absorb(&mut self, derived: Vec<Task>) {
        for task in derived {
            if let Some(forgotten) = self.novel_tasks.put(task) {
                trace!(event = "memory.task_forgotten", term = %self.terms.render(forgotten.term()));
                self.events.emit(Event::TaskForgotten { task: forgotten });
            }
        }
    }

    /// Bookkeeping for a judgment that reached the belief table: learned
    /// preconditions go to their effect, events feed the recent buffer and
    /// settle anticipations.
    fn observe_judgment(&mut self, task: &Task) {
        if let Some(parts) = precondition_parts(&self.terms, task.term()) {
            let capacity = self.config.bags.preconditions;
            let mut effect = match self.concepts.pick_out(&parts.effect) {
                Some(c) => c,
                None => Concept::new(parts.effect, *task.budget(), &self.config.bags),
            };
            if effect.add_precondition(task.clone(), capacity) {
                debug!(
                    event = "memory.precondition_learned",
                    hypothesis = %self.terms.render(task.term()),
                );
            }
            self.put_concept(effect);
        }

        let sentence = task.sentence();
        if sentence.is_eternal() {
            return;
        }
        self.recent_events.push_back(task.clone());
        while self.recent_events.len() > self.config.event_buffer_size.max(1) {
            self.recent_events.pop_front();
        }
        for confirmed in anticipation::confirm(&mut self.anticipations, sentence) {
            debug!(
                event = "anticipation.confirmed",
                effect = %self.terms.render(confirmed.effect),
            );
            self.events.emit(Event::AnticipationConfirmed {
                effect: confirmed.effect,
                hypothesis: confirmed.hypothesis.sentence().clone(),
            });
        }
    }

    /// An anticipated effect that never showed up is negative evidence for
    /// the hypothesis that predicted it
    fn expire_anticipations(&mut self) {
        let now = self.clock.time();
        for failed in anticipation::expire(&mut self.anticipations, now) {
            let hypothesis = failed.hypothesis.sentence();
            warn!(
                event = "anticipation.failed",
                effect = %self.terms.render(failed.effect),
                hypothesis = %self.terms.render(hypothesis.term()),
            );
            self.events.emit(Event::AnticipationFailed {
                effect: failed.effect,
                hypothesis: hypothesis.clone(),
            });

            let truth = TruthValue::new(0.0, self.config.anticipation_confidence);
            let stamp = self.new_stamp(None);
            let defaults = &self.config.budgets;
            let budget = Budget::new(
                defaults.judgment_priority,
                defaults.judgment_durability,
                budget::truth_to_quality(&truth),
            );
            let negative = Task::new(
                Sentence::new(hypothesis.term(), Punctuation::Judgment, Some(truth), stamp),
                budget,
            );
            self.absorb(vec![negative]);
        }
    }

    /// Selects a concept, one of its task links and one of its term links,
    /// and hands the pair to inference
    fn fire_concept(&mut self) -> Result<bool, MemoryError> {
        let Some(mut concept) = self.concepts.take(&mut self.rng) else {
            return Ok(false);
        };
        let task_link = concept.task_links.take(&mut self.rng);
        let term_link = concept.term_links.take(&mut self.rng);

        let mut result = Ok(());
        let mut derived = Vec::new();
        if let Some(link) = &task_link {
            let belief = term_link
                .as_ref()
                .and_then(|l| self.concepts.get(&l.target()))
                .and_then(Concept::best_belief)
                .map(|b| b.sentence().clone());
            let mut ctx = derivation_context!(self);
            result = self.inference.fire(&mut ctx, &concept, link.task(), belief.as_ref());
            derived = ctx.into_derived();
        }
        trace!(
            event = "memory.concept_fired",
            term = %self.terms.render(concept.term()),
            derived = derived.len(),
        );

        if let Some(link) = task_link {
            concept.task_links.put(link);
        }
        if let Some(link) = term_link {
            concept.term_links.put(link);
        }
        self.put_concept(concept);
        let (valid, broken): (Vec<Task>, Vec<Task>) = derived
            .into_iter()
            .partition(|t| t.truth().is_some() || !(t.sentence().is_judgment() || t.sentence().is_goal()));
        self.absorb(valid);
        result?;
        if let Some(task) = broken.first() {
            return Err(MemoryError::CollaboratorContract(format!(
                "inference derived {} without truth",
                self.terms.render(task.term())
            )));
        }
        Ok(true)
    }
}
