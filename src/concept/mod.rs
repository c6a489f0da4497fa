//! The per-term working-memory cell.

pub mod table;

use crate::bag::{Bag, Item};
use crate::config::BagConfig;
use crate::entity::{Budget, SentenceKey, Task};
use crate::language::TermId;

pub use table::{add_to_table, rank, select_candidate, TableOutcome};

/// Reference from a concept to a task whose term equals or contains its own
#[derive(Debug, Clone, PartialEq)]
pub struct TaskLink {
    task: Task,
    budget: Budget,
}

impl TaskLink {
    /// Link to `task` carrying its own budget
    pub fn new(task: Task, budget: Budget) -> Self {
        Self { task, budget }
    }

    /// The linked task
    pub fn task(&self) -> &Task {
        &self.task
    }
}

impl Item for TaskLink {
    type Key = SentenceKey;

    fn key(&self) -> SentenceKey {
        self.task.sentence().key()
    }

    fn budget(&self) -> &Budget {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }
}

/// Structural link between a compound and one of its components
#[derive(Debug, Clone, PartialEq)]
pub struct TermLink {
    target: TermId,
    budget: Budget,
}

impl TermLink {
    /// Link to the concept of `target`
    pub fn new(target: TermId, budget: Budget) -> Self {
        Self { target, budget }
    }

    /// Term of the linked concept
    pub fn target(&self) -> TermId {
        self.target
    }
}

impl Item for TermLink {
    type Key = TermId;

    fn key(&self) -> TermId {
        self.target
    }

    fn budget(&self) -> &Budget {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }
}

#[derive(Debug)]
pub struct Concept {
    term: TermId,
    budget: Budget,
    pub(crate) beliefs: Vec<Task>,
    pub(crate) desires: Vec<Task>,
    pub(crate) questions: Vec<Task>,
    pub(crate) quests: Vec<Task>,
    /// Learned `(&/, pre.., ^op, +n) =/> term` judgments
    pub(crate) executable_preconditions: Vec<Task>,
    pub(crate) task_links: Bag<TaskLink>,
    pub(crate) term_links: Bag<TermLink>,
}

impl Concept {
    /// Empty concept for `term`, with link bags sized by `config`
    pub fn new(term: TermId, budget: Budget, config: &BagConfig) -> Self {
        Self {
            term,
            budget,
            beliefs: Vec::new(),
            desires: Vec::new(),
            questions: Vec::new(),
            quests: Vec::new(),
            executable_preconditions: Vec::new(),
            task_links: Bag::new(config.task_links, config.levels, config.task_link_forgetting_cycles),
            term_links: Bag::new(config.term_links, config.levels, config.term_link_forgetting_cycles),
        }
    }

    /// The term this concept is about
    pub fn term(&self) -> TermId {
        self.term
    }

    /// Belief table, strongest first
    pub fn beliefs(&self) -> &[Task] {
        &self.beliefs
    }

    /// Desire table, strongest first
    pub fn desires(&self) -> &[Task] {
        &self.desires
    }

    /// Pending questions, oldest first
    pub fn questions(&self) -> &[Task] {
        &self.questions
    }

    /// Pending quests, oldest first
    pub fn quests(&self) -> &[Task] {
        &self.quests
    }

    /// Learned preconditions in learning order
    pub fn executable_preconditions(&self) -> &[Task] {
        &self.executable_preconditions
    }

    /// Links to tasks processed here
    pub fn task_links(&self) -> &Bag<TaskLink> {
        &self.task_links
    }

    /// Links to component and compound concepts
    pub fn term_links(&self) -> &Bag<TermLink> {
        &self.term_links
    }

    /// Highest-ranked belief, if any
    pub fn best_belief(&self) -> Option<&Task> {
        self.beliefs.first()
    }

    /// Keeps the list within `capacity` by dropping the oldest entry
    pub(crate) fn push_bounded(list: &mut Vec<Task>, task: Task, capacity: usize) -> Option<Task> {
        if let Some(existing) = list.iter_mut().find(|t| t.sentence().equivalent(task.sentence())) {
            existing.budget_mut().merge(task.budget());
            return None;
        }
        list.push(task);
        if list.len() > capacity.max(1) {
            Some(list.remove(0))
        } else {
            None
        }
    }

    /// Stores a learned precondition, replacing one for the same term when
    /// the new judgment is at least as confident
    pub(crate) fn add_precondition(&mut self, task: Task, capacity: usize) -> bool {
        let confidence = |t: &Task| t.truth().map_or(0.0, |v| v.confidence());
        if let Some(pos) = self.executable_preconditions.iter().position(|t| t.term() == task.term()) {
            if confidence(&task) >= confidence(&self.executable_preconditions[pos]) {
                self.executable_preconditions[pos] = task;
                return true;
            }
            return false;
        }
        self.executable_preconditions.push(task);
        if self.executable_preconditions.len() > capacity.max(1) {
            let weakest = self
                .executable_preconditions
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.sentence()
                        .expectation()
                        .partial_cmp(&b.sentence().expectation())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i);
            if let Some(i) = weakest {
                self.executable_preconditions.remove(i);
            }
        }
        true
    }
}

impl Item for Concept {
    type Key = TermId;

    fn key(&self) -> TermId {
        self.term
    }

    fn budget(&self) -> &Budget {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut Budget {
        &mut self.budget
    }
}
