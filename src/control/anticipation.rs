//! Expected effects of executed operations, checked against what happens.

use crate::entity::{Sentence, Task};
use crate::language::TermId;

/// `effect` is expected to be observed within `[min_time, max_time]`
#[derive(Debug, Clone, PartialEq)]
pub struct Anticipation {
    pub effect: TermId,
    /// The `(&/, pre.., ^op, +n) =/> effect` judgment the expectation comes from
    pub hypothesis: Task,
    pub min_time: i64,
    pub max_time: i64,
}

/// Registers an anticipation, dropping the oldest once `capacity` is reached
pub(crate) fn anticipate(list: &mut Vec<Anticipation>, anticipation: Anticipation, capacity: usize) {
    list.push(anticipation);
    if list.len() > capacity.max(1) {
        list.remove(0);
    }
}

/// Removes and returns the anticipations the observed event satisfies
pub(crate) fn confirm(list: &mut Vec<Anticipation>, observed: &Sentence) -> Vec<Anticipation> {
    let Some(at) = observed.occurrence_time() else {
        return Vec::new();
    };
    if !observed.is_judgment() || observed.truth().map_or(true, |t| t.frequency() < 0.5) {
        return Vec::new();
    }
    let (confirmed, pending) = list
        .drain(..)
        .partition(|a| a.effect == observed.term() && a.min_time <= at && at <= a.max_time);
    *list = pending;
    confirmed
}

/// Removes and returns the anticipations whose window closed before `now`
pub(crate) fn expire(list: &mut Vec<Anticipation>, now: i64) -> Vec<Anticipation> {
    let (expired, pending) = list.drain(..).partition(|a| a.max_time < now);
    *list = pending;
    expired
}
