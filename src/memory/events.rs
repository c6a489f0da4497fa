//! Closed set of notifications the core emits, and the bus observers
//! subscribe to them on.

use crate::entity::{Sentence, Task};
use crate::language::TermId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConceptBeliefAdd,
    ConceptBeliefRemove,
    ConceptGoalAdd,
    ConceptGoalRemove,
    ConceptQuestionAdd,
    ConceptDirectProcessedTask,
    UnexecutableGoal,
    OperationExecuted,
    Answer,
    AnticipationConfirmed,
    AnticipationFailed,
    ConceptForgotten,
    TaskForgotten,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        EventKind::ConceptBeliefAdd,
        EventKind::ConceptBeliefRemove,
        EventKind::ConceptGoalAdd,
        EventKind::ConceptGoalRemove,
        EventKind::ConceptQuestionAdd,
        EventKind::ConceptDirectProcessedTask,
        EventKind::UnexecutableGoal,
        EventKind::OperationExecuted,
        EventKind::Answer,
        EventKind::AnticipationConfirmed,
        EventKind::AnticipationFailed,
        EventKind::ConceptForgotten,
        EventKind::TaskForgotten,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ConceptBeliefAdd { concept: TermId, task: Task },
    ConceptBeliefRemove { concept: TermId, task: Task },
    ConceptGoalAdd { concept: TermId, task: Task },
    ConceptGoalRemove { concept: TermId, task: Task },
    ConceptQuestionAdd { concept: TermId, task: Task },
    ConceptDirectProcessedTask { concept: TermId, task: Task },
    UnexecutableGoal { concept: TermId, task: Task },
    OperationExecuted { operation: TermId, task: Task },
    Answer { question: Task, solution: Sentence },
    AnticipationConfirmed { effect: TermId, hypothesis: Sentence },
    AnticipationFailed { effect: TermId, hypothesis: Sentence },
    /// A concept was pushed out of the global bag
    ConceptForgotten { concept: TermId },
    /// A derived task was pushed out of the novel-task bag
    TaskForgotten { task: Task },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ConceptBeliefAdd { .. } => EventKind::ConceptBeliefAdd,
            Event::ConceptBeliefRemove { .. } => EventKind::ConceptBeliefRemove,
            Event::ConceptGoalAdd { .. } => EventKind::ConceptGoalAdd,
            Event::ConceptGoalRemove { .. } => EventKind::ConceptGoalRemove,
            Event::ConceptQuestionAdd { .. } => EventKind::ConceptQuestionAdd,
            Event::ConceptDirectProcessedTask { .. } => EventKind::ConceptDirectProcessedTask,
            Event::UnexecutableGoal { .. } => EventKind::UnexecutableGoal,
            Event::OperationExecuted { .. } => EventKind::OperationExecuted,
            Event::Answer { .. } => EventKind::Answer,
            Event::AnticipationConfirmed { .. } => EventKind::AnticipationConfirmed,
            Event::AnticipationFailed { .. } => EventKind::AnticipationFailed,
            Event::ConceptForgotten { .. } => EventKind::ConceptForgotten,
            Event::TaskForgotten { .. } => EventKind::TaskForgotten,
        }
    }
}

/// Receives events synchronously, in emission order
pub trait Observer: Send {
    fn on_event(&mut self, event: &Event);
}

impl<F: FnMut(&Event) + Send> Observer for F {
    fn on_event(&mut self, event: &Event) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<EventKind, Vec<(SubscriptionId, Box<dyn Observer>)>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self.subscribers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("subscribers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for `kind`; delivery follows subscription order
    pub fn subscribe(&mut self, kind: EventKind, observer: impl Observer + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.entry(kind).or_default().push((id, Box::new(observer)));
        id
    }

    /// Subscribes a clonable observer to several kinds at once
    pub fn subscribe_many(
        &mut self,
        kinds: &[EventKind],
        observer: impl Observer + Clone + 'static,
    ) -> Vec<SubscriptionId> {
        kinds.iter().map(|k| self.subscribe(*k, observer.clone())).collect()
    }

    /// Removes a subscription; false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for subs in self.subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|(sid, _)| *sid == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn has_subscribers(&self, kind: EventKind) -> bool {
        self.subscribers.get(&kind).map_or(false, |s| !s.is_empty())
    }

    /// Delivers `event` to every subscriber of its kind
    pub fn emit(&mut self, event: Event) {
        if let Some(subs) = self.subscribers.get_mut(&event.kind()) {
            for (_, observer) in subs.iter_mut() {
                observer.on_event(&event);
            }
        }
    }
}

/// Shared, clonable observer that records every event it sees
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in emission order
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// How many recorded events are of `kind`
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Observer for EventLog {
    fn on_event(&mut self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
