use narsmem::{
    Budget, Config, DirectOutcome, Event, EventKind, EventLog, GoalDecision, Memory, Operator, Punctuation, Sentence,
    Stamp, Task, TemporalOrder, TermArena, TermId, TruthValue, VarKind,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every operation it is asked to perform
#[derive(Clone)]
struct Press {
    name: &'static str,
    calls: Arc<Mutex<Vec<TermId>>>,
    succeed: bool,
}

impl Press {
    fn new(succeed: bool) -> Self {
        Self::named("^press", succeed)
    }

    fn named(name: &'static str, succeed: bool) -> Self {
        Self {
            name,
            calls: Arc::new(Mutex::new(Vec::new())),
            succeed,
        }
    }

    fn calls(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Operator for Press {
    fn name(&self) -> &str {
        self.name
    }

    fn execute(&mut self, operation: TermId, _args: &[TermId], _terms: &TermArena) -> bool {
        self.calls.lock().push(operation);
        self.succeed
    }
}

fn memory_with(config: Config) -> (Memory, EventLog) {
    let mut memory = Memory::new(config).unwrap();
    let log = EventLog::new();
    memory.events_mut().subscribe_many(&EventKind::ALL, log.clone());
    (memory, log)
}

fn goal(memory: &mut Memory, term: TermId, priority: f32, occurrence: Option<i64>) -> Task {
    let stamp = memory.new_stamp(occurrence);
    Task::input(
        Sentence::new(term, Punctuation::Goal, Some(TruthValue::new(1.0, 0.9)), stamp),
        Budget::new(priority, 0.9, 0.9),
    )
}

fn judgment(memory: &mut Memory, term: TermId, truth: TruthValue, occurrence: Option<i64>) -> Task {
    let stamp = memory.new_stamp(occurrence);
    Task::input(
        Sentence::new(term, Punctuation::Judgment, Some(truth), stamp),
        Budget::new(0.8, 0.5, 0.9),
    )
}

fn goal_decision(outcome: DirectOutcome) -> GoalDecision {
    match outcome {
        DirectOutcome::Goal(decision) => decision,
        other => panic!("expected a goal outcome, got {:?}", other),
    }
}

#[test]
fn test_fresh_goal_is_halved_and_asks_how() {
    let config = Config {
        how_question_on_decision: true,
        ..Config::default()
    };
    let (mut memory, log) = memory_with(config);
    let g = memory.terms_mut().atom("door_open");
    let task = goal(&mut memory, g, 0.9, None);

    let decision = goal_decision(memory.process_direct(task).unwrap());
    assert_eq!(decision, GoalDecision::Committed { executed: false });

    let concept = memory.concept(g).unwrap();
    assert_eq!(concept.desires().len(), 1);
    assert!((concept.desires()[0].priority() - 0.45).abs() < 1e-4);
    assert_eq!(log.count(EventKind::ConceptGoalAdd), 1);
    assert_eq!(log.count(EventKind::ConceptDirectProcessedTask), 1);

    let how = memory.terms_mut().variable(VarKind::Query, "how");
    let question = memory.terms_mut().implication(how, g, TemporalOrder::Forward).unwrap();
    assert!(memory
        .novel_tasks()
        .any(|t| t.term() == question && t.sentence().is_question()));
}

#[test]
fn test_satisfied_goal_is_not_pursued() {
    let config = Config {
        how_question_on_decision: true,
        ..Config::default()
    };
    let (mut memory, log) = memory_with(config);
    let g = memory.terms_mut().atom("door_open");
    let belief = judgment(&mut memory, g, TruthValue::new(1.0, 0.9), None);
    memory.process_direct(belief).unwrap();

    let task = goal(&mut memory, g, 0.9, None);
    let decision = goal_decision(memory.process_direct(task).unwrap());
    assert!(!matches!(decision, GoalDecision::Committed { .. }));
    assert!(memory.concept(g).unwrap().desires().is_empty());
    assert_eq!(log.count(EventKind::ConceptGoalAdd), 0);
    assert!(!memory.novel_tasks().any(|t| t.sentence().is_question()));
}

#[test]
fn test_anti_satisfaction_never_raises_priority() {
    let (mut memory, _log) = memory_with(Config::default());
    let g = memory.terms_mut().atom("door_open");
    let belief = judgment(&mut memory, g, TruthValue::new(0.0, 0.9), None);
    memory.process_direct(belief).unwrap();

    let task = goal(&mut memory, g, 0.7, None);
    memory.process_direct(task).unwrap();
    let stored = &memory.concept(g).unwrap().desires()[0];
    assert!(stored.priority() <= 0.7);
    assert!(stored.priority() > 0.0);
}

#[test]
fn test_duplicate_goal_is_ignored() {
    let (mut memory, log) = memory_with(Config::default());
    let g = memory.terms_mut().atom("door_open");
    let task = goal(&mut memory, g, 0.9, None);

    memory.process_direct(task.clone()).unwrap();
    let decision = goal_decision(memory.process_direct(task).unwrap());
    assert_eq!(decision, GoalDecision::Duplicate);
    assert_eq!(log.count(EventKind::ConceptGoalAdd), 1);
    assert_eq!(memory.concept(g).unwrap().desires().len(), 1);
}

#[test]
fn test_independent_goals_are_revised() {
    let (mut memory, _log) = memory_with(Config::default());
    let g = memory.terms_mut().atom("door_open");
    let first = goal(&mut memory, g, 0.9, None);
    let second = goal(&mut memory, g, 0.9, None);

    memory.process_direct(first).unwrap();
    let decision = goal_decision(memory.process_direct(second).unwrap());
    assert_eq!(decision, GoalDecision::Revised);

    let revised = memory
        .novel_tasks()
        .find(|t| t.term() == g && t.sentence().is_goal())
        .unwrap();
    assert_eq!(revised.stamp().evidential_base().len(), 2);
    assert!(revised.truth().unwrap().confidence() > 0.9);
}

#[test]
fn test_goal_table_eviction_reports_once() {
    let mut config = Config::default();
    config.bags.goals = 1;
    let (mut memory, log) = memory_with(config);
    let g = memory.terms_mut().atom("door_open");
    let strong = goal(&mut memory, g, 0.9, Some(0));
    let weak = goal(&mut memory, g, 0.5, Some(100));

    memory.process_direct(strong.clone()).unwrap();
    memory.process_direct(weak).unwrap();

    let desires = memory.concept(g).unwrap().desires();
    assert_eq!(desires.len(), 1);
    assert_eq!(desires[0].stamp(), strong.stamp());
    assert_eq!(log.count(EventKind::ConceptGoalRemove), 1);
    assert_eq!(log.count(EventKind::ConceptGoalAdd), 1);
}

#[test]
fn test_operation_goal_executes_once() {
    let (mut memory, log) = memory_with(Config::default());
    let press = Press::new(true);
    memory.register_operator(press.clone());
    let op = memory.terms_mut().operator("press");
    let me = memory.terms().self_term();
    let operation = memory.terms_mut().operation(op, &[me]).unwrap();

    let task = goal(&mut memory, operation, 0.9, None);
    let decision = goal_decision(memory.process_direct(task.clone()).unwrap());
    assert_eq!(decision, GoalDecision::Committed { executed: true });
    assert_eq!(press.calls(), 1);
    assert_eq!(log.count(EventKind::OperationExecuted), 1);

    let feedback = memory
        .novel_tasks()
        .find(|t| t.term() == operation && t.sentence().is_judgment())
        .unwrap();
    assert_eq!(feedback.sentence().occurrence_time(), Some(0));
    assert!(feedback.stamp().evidence_is_cyclic(op));

    // a duplicate never acts twice
    memory.process_direct(task).unwrap();
    assert_eq!(press.calls(), 1);
}

#[test]
fn test_unexecutable_goals_are_reported() {
    let (mut memory, log) = memory_with(Config::default());
    let press = Press::new(false);
    memory.register_operator(press.clone());
    let op = memory.terms_mut().operator("press");
    let fly = memory.terms_mut().operator("fly");
    let me = memory.terms().self_term();
    let bob = memory.terms_mut().atom("bob");

    let failing = memory.terms_mut().operation(op, &[me]).unwrap();
    let unknown = memory.terms_mut().operation(fly, &[me]).unwrap();
    let foreign = memory.terms_mut().operation(op, &[bob]).unwrap();
    for term in [failing, unknown, foreign] {
        let task = goal(&mut memory, term, 0.9, None);
        let decision = goal_decision(memory.process_direct(task).unwrap());
        assert_eq!(decision, GoalDecision::Committed { executed: false });
    }

    assert_eq!(press.calls(), 1);
    assert_eq!(log.count(EventKind::UnexecutableGoal), 3);
    assert_eq!(log.count(EventKind::OperationExecuted), 0);
    let reported: Vec<TermId> = log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::UnexecutableGoal { task, .. } => Some(task.term()),
            _ => None,
        })
        .collect();
    assert_eq!(reported, vec![failing, unknown, foreign]);
}

#[test]
fn test_goal_without_desire_is_an_error() {
    let mut memory = Memory::new(Config::default()).unwrap();
    let g = memory.terms_mut().atom("door_open");
    let stamp = memory.new_stamp(None);
    let task = Task::new(
        Sentence::new(g, Punctuation::Goal, None, stamp),
        Budget::new(0.9, 0.9, 0.9),
    );
    assert!(memory.input(task.clone()).is_err());
    assert!(memory.process_direct(task).is_err());
}

/// `<(&/, cause, +1, ^op(SELF), +1) =/> effect>`
fn reaction(memory: &mut Memory, cause: TermId, op: &str, effect: TermId) -> TermId {
    let terms = memory.terms_mut();
    let op = terms.operator(op);
    let me = terms.self_term();
    let operation = terms.operation(op, &[me]).unwrap();
    let gap = terms.interval(1);
    let subject = terms
        .conjunction(&[cause, gap, operation, gap], TemporalOrder::Forward)
        .unwrap();
    terms.implication(subject, effect, TemporalOrder::Forward).unwrap()
}

/// Believes `hypothesis` and returns the serial of its evidence
fn learn(memory: &mut Memory, hypothesis: TermId, truth: TruthValue) -> i64 {
    let learned = judgment(memory, hypothesis, truth, None);
    let serial = learned.stamp().evidential_base()[0];
    memory.process_direct(learned).unwrap();
    serial
}

fn see(memory: &mut Memory, term: TermId) {
    let seen = judgment(memory, term, TruthValue::new(1.0, 0.9), Some(0));
    memory.process_direct(seen).unwrap();
}

struct Scenario {
    memory: Memory,
    log: EventLog,
    press: Press,
    light: TermId,
    effect: TermId,
    hypothesis: TermId,
    hypothesis_serial: i64,
}

/// `<(&/, light, +1, ^press(SELF), +1) =/> open>` learned, `light` just seen
fn precondition_scenario(config: Config) -> Scenario {
    let (mut memory, log) = memory_with(config);
    let press = Press::new(true);
    memory.register_operator(press.clone());

    let light = memory.terms_mut().atom("light");
    let effect = memory.terms_mut().atom("open");
    let hypothesis = reaction(&mut memory, light, "press", effect);
    let hypothesis_serial = learn(&mut memory, hypothesis, TruthValue::new(1.0, 0.9));
    see(&mut memory, light);
    assert_eq!(memory.concept(effect).unwrap().executable_preconditions().len(), 1);

    Scenario {
        memory,
        log,
        press,
        light,
        effect,
        hypothesis,
        hypothesis_serial,
    }
}

fn executed_operator(log: &EventLog, terms: &TermArena) -> Vec<TermId> {
    log.events()
        .into_iter()
        .filter_map(|e| match e {
            Event::OperationExecuted { operation, .. } => terms.operation_parts(operation).map(|(op, _)| op),
            _ => None,
        })
        .collect()
}

#[test]
fn test_best_reaction_executes_and_anticipates() {
    let mut s = precondition_scenario(Config::default());
    let task = goal(&mut s.memory, s.effect, 0.9, None);
    let decision = goal_decision(s.memory.process_direct(task).unwrap());

    assert_eq!(decision, GoalDecision::Committed { executed: true });
    assert_eq!(s.press.calls(), 1);
    assert_eq!(s.memory.decision_block(), 1);
    let anticipations = s.memory.anticipations();
    assert_eq!(anticipations.len(), 1);
    assert_eq!(anticipations[0].effect, s.effect);
    assert_eq!(anticipations[0].hypothesis.term(), s.hypothesis);
    assert_eq!(anticipations[0].max_time, 100);
}

#[test]
fn test_circular_precondition_is_never_chosen() {
    let mut s = precondition_scenario(Config::default());
    let stamp = Stamp::new(s.hypothesis_serial, 0, None);
    let task = Task::input(
        Sentence::new(s.effect, Punctuation::Goal, Some(TruthValue::new(1.0, 0.9)), stamp),
        Budget::new(0.9, 0.9, 0.9),
    );
    let decision = goal_decision(s.memory.process_direct(task).unwrap());

    assert_eq!(decision, GoalDecision::Committed { executed: false });
    assert_eq!(s.press.calls(), 0);
    assert!(s.memory.anticipations().is_empty());
    assert_eq!(s.log.count(EventKind::OperationExecuted), 0);
}

#[test]
fn test_circular_strongest_precondition_yields_to_weaker() {
    let mut s = precondition_scenario(Config::default());
    let push = Press::named("^push", true);
    s.memory.register_operator(push.clone());
    let weaker = reaction(&mut s.memory, s.light, "push", s.effect);
    learn(&mut s.memory, weaker, TruthValue::new(1.0, 0.6));
    assert_eq!(s.memory.concept(s.effect).unwrap().executable_preconditions().len(), 2);

    // the goal rests on the evidence of the stronger hypothesis
    let stamp = Stamp::new(s.hypothesis_serial, 0, None);
    let task = Task::input(
        Sentence::new(s.effect, Punctuation::Goal, Some(TruthValue::new(1.0, 0.9)), stamp),
        Budget::new(0.9, 0.9, 0.9),
    );
    let decision = goal_decision(s.memory.process_direct(task).unwrap());

    assert_eq!(decision, GoalDecision::Committed { executed: true });
    assert_eq!(s.press.calls(), 0);
    assert_eq!(push.calls(), 1);
    let anticipations = s.memory.anticipations();
    assert_eq!(anticipations.len(), 1);
    assert_eq!(anticipations[0].hypothesis.term(), weaker);
}

#[test]
fn test_equal_preconditions_first_learned_wins() {
    let mut s = precondition_scenario(Config::default());
    let push = Press::named("^push", true);
    s.memory.register_operator(push.clone());
    let second = reaction(&mut s.memory, s.light, "push", s.effect);
    learn(&mut s.memory, second, TruthValue::new(1.0, 0.9));

    let task = goal(&mut s.memory, s.effect, 0.9, None);
    let decision = goal_decision(s.memory.process_direct(task).unwrap());

    assert_eq!(decision, GoalDecision::Committed { executed: true });
    assert_eq!(s.press.calls(), 1);
    assert_eq!(push.calls(), 0);
    let press = s.memory.terms_mut().operator("press");
    assert_eq!(executed_operator(&s.log, s.memory.terms()), vec![press]);
    assert_eq!(s.memory.anticipations()[0].hypothesis.term(), s.hypothesis);
}

#[test]
fn test_anticipations_keep_their_own_capacity() {
    let mut s = precondition_scenario(Config {
        anticipation_capacity: 1,
        ..Config::default()
    });
    let lit = s.memory.terms_mut().atom("lit");
    let second = reaction(&mut s.memory, s.light, "press", lit);
    learn(&mut s.memory, second, TruthValue::new(1.0, 0.9));

    let open_goal = goal(&mut s.memory, s.effect, 0.9, None);
    s.memory.process_direct(open_goal).unwrap();
    s.memory.set_decision_block(0);
    let lit_goal = goal(&mut s.memory, lit, 0.9, None);
    s.memory.process_direct(lit_goal).unwrap();

    assert_eq!(s.press.calls(), 2);
    let anticipations = s.memory.anticipations();
    assert_eq!(anticipations.len(), 1);
    assert_eq!(anticipations[0].effect, lit);
}

#[test]
fn test_decision_block_defers_action() {
    let mut s = precondition_scenario(Config::default());
    s.memory.set_decision_block(5);
    let task = goal(&mut s.memory, s.effect, 0.9, None);
    let decision = goal_decision(s.memory.process_direct(task).unwrap());
    assert_eq!(decision, GoalDecision::Committed { executed: false });
    assert_eq!(s.press.calls(), 0);
}

#[test]
fn test_satisfied_operation_goal_never_executes() {
    let (mut memory, log) = memory_with(Config::default());
    let press = Press::new(true);
    memory.register_operator(press.clone());
    let op = memory.terms_mut().operator("press");
    let me = memory.terms().self_term();
    let operation = memory.terms_mut().operation(op, &[me]).unwrap();

    let belief = judgment(&mut memory, operation, TruthValue::new(1.0, 0.9), None);
    memory.process_direct(belief).unwrap();
    let task = goal(&mut memory, operation, 0.9, None);
    let decision = goal_decision(memory.process_direct(task).unwrap());

    assert_eq!(decision, GoalDecision::BelowThreshold);
    assert_eq!(press.calls(), 0);
    assert_eq!(log.count(EventKind::OperationExecuted), 0);
    assert!(memory.concept(operation).unwrap().desires().is_empty());
}

#[test]
fn test_belief_table_eviction_reports_once() {
    let mut config = Config::default();
    config.bags.beliefs = 1;
    let (mut memory, log) = memory_with(config);
    let sky = memory.terms_mut().atom("sky_blue");
    let strong = {
        let stamp = memory.new_stamp(Some(0));
        Task::input(
            Sentence::new(sky, Punctuation::Judgment, Some(TruthValue::new(1.0, 0.9)), stamp),
            Budget::new(0.9, 0.5, 0.9),
        )
    };
    let weak = {
        let stamp = memory.new_stamp(Some(100));
        Task::input(
            Sentence::new(sky, Punctuation::Judgment, Some(TruthValue::new(1.0, 0.9)), stamp),
            Budget::new(0.5, 0.5, 0.9),
        )
    };

    memory.process_direct(strong.clone()).unwrap();
    memory.process_direct(weak).unwrap();

    let beliefs = memory.concept(sky).unwrap().beliefs();
    assert_eq!(beliefs.len(), 1);
    assert_eq!(beliefs[0].stamp(), strong.stamp());
    assert_eq!(log.count(EventKind::ConceptBeliefAdd), 1);
    assert_eq!(log.count(EventKind::ConceptBeliefRemove), 1);
}
