//! Ranked, capacity-capped belief and desire tables.

use crate::entity::{Sentence, Task};

/// Joint priority/confidence rank; recency breaks ties at insertion
pub fn rank(task: &Task) -> f32 {
    task.priority() * task.truth().map_or(1.0, |t| t.confidence())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableOutcome {
    /// The task is now resident
    pub added: bool,
    /// Pushed out by capacity; may be the newcomer itself
    pub removed: Option<Task>,
}

/// Inserts in rank order, newer first among equal ranks. An entry
/// equivalent to `task` absorbs its budget instead.
pub fn add_to_table(table: &mut Vec<Task>, task: Task, capacity: usize) -> TableOutcome {
    if let Some(existing) = table.iter_mut().find(|t| t.sentence().equivalent(task.sentence())) {
        existing.budget_mut().merge(task.budget());
        return TableOutcome {
            added: false,
            removed: None,
        };
    }

    let r = rank(&task);
    let created = task.stamp().creation_time();
    let pos = table
        .iter()
        .position(|t| r > rank(t) || (r == rank(t) && created >= t.stamp().creation_time()))
        .unwrap_or(table.len());
    table.insert(pos, task);

    if table.len() > capacity.max(1) {
        let removed = table.pop();
        TableOutcome {
            added: pos < table.len(),
            removed,
        }
    } else {
        TableOutcome {
            added: true,
            removed: None,
        }
    }
}

/// Index of the entry that best answers `query` once projected to its time;
/// the first of equally good entries wins
pub fn select_candidate(table: &[Task], query: &Sentence, now: i64, duration: i64, horizon: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, t) in table.iter().enumerate() {
        let projected = t.sentence().projection(query.occurrence_time(), now, duration, horizon);
        let quality = projected.truth().map_or(0.0, |t| t.confidence());
        if best.map_or(true, |(_, q)| quality > q) {
            best = Some((i, quality));
        }
    }
    best.map(|(i, _)| i)
}
