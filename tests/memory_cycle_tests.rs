use narsmem::concept::Concept;
use narsmem::control::DerivationContext;
use narsmem::{
    Budget, Config, EventKind, EventLog, Inference, Item, Memory, MemoryError, Operator, Punctuation, Sentence, Task,
    TemporalOrder, TermArena, TermId, TruthValue,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[test]
fn test_empty_memory_idles() {
    let mut memory = Memory::new(Config::default()).unwrap();
    let report = memory.cycle().unwrap();
    assert_eq!(report.time, 0);
    assert_eq!(report.processed, 0);
    assert!(!report.fired);
    assert_eq!(memory.time(), 1);
    assert!(memory.concepts().is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = Config {
        decision_threshold: 1.5,
        ..Config::default()
    };
    assert!(matches!(Memory::new(config), Err(MemoryError::Config(_))));
}

#[test]
fn test_input_is_processed_next_cycle() {
    let mut memory = Memory::new(Config::default()).unwrap();
    let bird = memory.terms_mut().atom("bird");
    let animal = memory.terms_mut().atom("animal");
    let statement = memory.terms_mut().inheritance(bird, animal).unwrap();
    memory.input_judgment(statement, TruthValue::new(1.0, 0.9), None).unwrap();
    assert_eq!(memory.pending_input(), 1);
    assert!(memory.concept(statement).is_none());

    let report = memory.cycle().unwrap();
    assert_eq!(report.processed, 1);
    assert!(report.fired);
    assert_eq!(memory.pending_input(), 0);
    assert_eq!(memory.concept(statement).unwrap().beliefs().len(), 1);
    // components are linked both ways
    let component = memory.concept(bird).unwrap();
    assert!(component.term_links().contains(&statement));
    assert!(memory.concept(statement).unwrap().term_links().contains(&bird));
}

#[test]
fn test_question_is_answered_by_belief() {
    let mut memory = Memory::new(Config::default()).unwrap();
    let log = EventLog::new();
    memory.subscribe(EventKind::Answer, log.clone());
    let sky = memory.terms_mut().atom("sky_blue");
    memory.input_judgment(sky, TruthValue::new(1.0, 0.9), None).unwrap();
    memory.input_question(sky, None).unwrap();
    memory.cycle().unwrap();

    assert_eq!(log.count(EventKind::Answer), 1);
    let question = &memory.concept(sky).unwrap().questions()[0];
    assert!(question.priority() < memory.config().budgets.question_priority);
}

fn run_scenario(seed: u64) -> Vec<(TermId, f32)> {
    let config = Config {
        seed,
        ..Config::default()
    };
    let mut memory = Memory::new(config).unwrap();
    let names = ["a", "b", "c", "d", "e", "f"];
    let atoms: Vec<TermId> = names.iter().map(|n| memory.terms_mut().atom(n)).collect();
    for pair in atoms.windows(2) {
        let statement = memory.terms_mut().inheritance(pair[0], pair[1]).unwrap();
        memory.input_judgment(statement, TruthValue::new(1.0, 0.9), None).unwrap();
    }
    memory.input_goal(atoms[0], TruthValue::new(1.0, 0.9), None).unwrap();
    memory.run(60).unwrap();
    memory
        .concepts()
        .iter()
        .map(|c| (c.term(), c.budget().priority()))
        .collect()
}

#[test]
fn test_same_seed_replays_identically() {
    let first = run_scenario(42);
    let second = run_scenario(42);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

/// Derives the converse of every inheritance it is shown
struct Converse {
    fired: Arc<Mutex<usize>>,
}

impl Inference for Converse {
    fn fire(
        &mut self,
        ctx: &mut DerivationContext<'_>,
        _concept: &Concept,
        task: &Task,
        _belief: Option<&Sentence>,
    ) -> Result<(), MemoryError> {
        *self.fired.lock() += 1;
        let (Some(subject), Some(predicate)) = (ctx.terms().subject(task.term()), ctx.terms().predicate(task.term()))
        else {
            return Ok(());
        };
        if !task.sentence().is_judgment() {
            return Ok(());
        }
        let converse = ctx.terms_mut().inheritance(predicate, subject)?;
        let truth = TruthValue::new(1.0, 0.45);
        let sentence = Sentence::new(converse, Punctuation::Judgment, Some(truth), task.stamp().clone());
        ctx.single_premise_task(sentence, Budget::new(0.5, 0.5, 0.5));
        Ok(())
    }
}

#[test]
fn test_inference_conclusions_enter_memory() {
    let mut memory = Memory::new(Config::default()).unwrap();
    let fired = Arc::new(Mutex::new(0));
    memory.set_inference(Converse { fired: fired.clone() });
    let cat = memory.terms_mut().atom("cat");
    let pet = memory.terms_mut().atom("pet");
    let statement = memory.terms_mut().inheritance(cat, pet).unwrap();
    let converse = memory.terms_mut().inheritance(pet, cat).unwrap();
    memory.input_judgment(statement, TruthValue::new(1.0, 0.9), None).unwrap();

    memory.run(40).unwrap();
    assert!(*fired.lock() > 0);
    assert!(memory.concept(converse).is_some_and(|c| !c.beliefs().is_empty()));
}

/// Concludes judgments it cannot assign any truth to
struct Truthless;

impl Inference for Truthless {
    fn fire(
        &mut self,
        ctx: &mut DerivationContext<'_>,
        _concept: &Concept,
        task: &Task,
        _belief: Option<&Sentence>,
    ) -> Result<(), MemoryError> {
        let sentence = Sentence::new(task.term(), Punctuation::Judgment, None, task.stamp().clone());
        ctx.single_premise_task(sentence, Budget::new(0.5, 0.5, 0.5));
        Ok(())
    }
}

#[test]
fn test_truthless_conclusion_breaks_collaborator_contract() {
    let mut memory = Memory::new(Config::default()).unwrap();
    memory.set_inference(Truthless);
    let cat = memory.terms_mut().atom("cat");
    memory.input_judgment(cat, TruthValue::new(1.0, 0.9), None).unwrap();

    let error = (0..10).find_map(|_| memory.cycle().err());
    assert!(matches!(error, Some(MemoryError::CollaboratorContract(_))));
    assert!(!memory.novel_tasks().any(|t| t.truth().is_none()));
}

struct Press;

impl Operator for Press {
    fn name(&self) -> &str {
        "^press"
    }

    fn execute(&mut self, _operation: TermId, _args: &[TermId], _terms: &TermArena) -> bool {
        true
    }
}

struct Learned {
    memory: Memory,
    log: EventLog,
    effect: TermId,
    hypothesis: TermId,
}

fn learned_reaction(config: Config) -> Learned {
    let mut memory = Memory::new(config).unwrap();
    let log = EventLog::new();
    memory
        .events_mut()
        .subscribe_many(&[EventKind::AnticipationConfirmed, EventKind::AnticipationFailed], log.clone());
    memory.register_operator(Press);

    let terms = memory.terms_mut();
    let light = terms.atom("light");
    let effect = terms.atom("open");
    let op = terms.operator("press");
    let me = terms.self_term();
    let operation = terms.operation(op, &[me]).unwrap();
    let gap = terms.interval(1);
    let subject = terms
        .conjunction(&[light, gap, operation, gap], TemporalOrder::Forward)
        .unwrap();
    let hypothesis = terms.implication(subject, effect, TemporalOrder::Forward).unwrap();

    memory.input_judgment(hypothesis, TruthValue::new(1.0, 0.9), None).unwrap();
    memory.input_judgment(light, TruthValue::new(1.0, 0.9), Some(0)).unwrap();
    memory.input_goal(effect, TruthValue::new(1.0, 0.9), None).unwrap();
    memory.cycle().unwrap();
    assert_eq!(memory.anticipations().len(), 1);

    Learned {
        memory,
        log,
        effect,
        hypothesis,
    }
}

#[test]
fn test_anticipated_effect_is_confirmed() {
    let mut l = learned_reaction(Config {
        anticipation_tolerance: 2.0,
        ..Config::default()
    });
    l.memory.input_judgment(l.effect, TruthValue::new(1.0, 0.9), Some(1)).unwrap();
    l.memory.cycle().unwrap();

    assert_eq!(l.log.count(EventKind::AnticipationConfirmed), 1);
    assert_eq!(l.log.count(EventKind::AnticipationFailed), 0);
    assert!(l.memory.anticipations().is_empty());
}

#[test]
fn test_missing_effect_is_negative_evidence() {
    let mut l = learned_reaction(Config {
        anticipation_tolerance: 2.0,
        ..Config::default()
    });
    l.memory.run(4).unwrap();

    assert_eq!(l.log.count(EventKind::AnticipationFailed), 1);
    assert_eq!(l.log.count(EventKind::AnticipationConfirmed), 0);
    assert!(l.memory.anticipations().is_empty());

    let negative = |t: &Task| t.term() == l.hypothesis && t.truth().is_some_and(|v| v.frequency() < 0.5);
    let derived = l.memory.novel_tasks().any(|t| negative(t));
    let believed = l
        .memory
        .concept(l.hypothesis)
        .is_some_and(|c| c.beliefs().iter().any(|t| negative(t)));
    assert!(derived || believed);
}
