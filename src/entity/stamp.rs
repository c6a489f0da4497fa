//! Provenance of a sentence: when it was made, when it happens, and which
//! pieces of input evidence it rests on.

use crate::language::TermId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which parts of two stamps must agree for them to count as equal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampEq {
    pub creation_time: bool,
    pub occurrence_time: bool,
    pub evidential_base: bool,
}

impl StampEq {
    /// Same evidence, regardless of when it was stamped
    pub const EVIDENCE: StampEq = StampEq {
        creation_time: false,
        occurrence_time: false,
        evidential_base: true,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    creation_time: i64,
    /// `None` for eternal sentences
    occurrence_time: Option<i64>,
    evidential_base: Vec<i64>,
    /// Operators whose execution feedback this evidence went through
    executions: Vec<TermId>,
}

impl Stamp {
    /// Fresh input evidence with a singleton base
    pub fn new(serial: i64, creation_time: i64, occurrence_time: Option<i64>) -> Self {
        Self {
            creation_time,
            occurrence_time,
            evidential_base: vec![serial],
            executions: Vec::new(),
        }
    }

    /// Evidence for two-premise conclusions: bases interleaved newest first,
    /// deduplicated and truncated to `max_len`
    pub fn merge(a: &Stamp, b: &Stamp, creation_time: i64, max_len: usize) -> Stamp {
        let mut seen = HashSet::new();
        let mut base = Vec::with_capacity((a.evidential_base.len() + b.evidential_base.len()).min(max_len));
        let (mut ia, mut ib) = (a.evidential_base.iter().rev(), b.evidential_base.iter().rev());
        let mut reversed = Vec::new();
        loop {
            let (x, y) = (ia.next(), ib.next());
            if x.is_none() && y.is_none() {
                break;
            }
            for id in [x, y].into_iter().flatten() {
                if seen.insert(*id) {
                    reversed.push(*id);
                }
            }
        }
        // oldest entries are the ones dropped
        reversed.truncate(max_len);
        base.extend(reversed.into_iter().rev());

        let mut executions = a.executions.clone();
        for op in &b.executions {
            if !executions.contains(op) {
                executions.push(*op);
            }
        }
        if executions.len() > max_len {
            executions.drain(..executions.len() - max_len);
        }

        Stamp {
            creation_time,
            occurrence_time: a.occurrence_time,
            evidential_base: base,
            executions,
        }
    }

    pub fn creation_time(&self) -> i64 {
        self.creation_time
    }

    pub fn occurrence_time(&self) -> Option<i64> {
        self.occurrence_time
    }

    pub fn is_eternal(&self) -> bool {
        self.occurrence_time.is_none()
    }

    pub fn evidential_base(&self) -> &[i64] {
        &self.evidential_base
    }

    pub fn executions(&self) -> &[TermId] {
        &self.executions
    }

    pub fn with_occurrence_time(&self, occurrence_time: Option<i64>) -> Stamp {
        Stamp {
            occurrence_time,
            ..self.clone()
        }
    }

    pub fn with_creation_time(&self, creation_time: i64) -> Stamp {
        Stamp {
            creation_time,
            ..self.clone()
        }
    }

    /// Marks this evidence as resulting from executing `operator`
    pub fn with_execution(&self, operator: TermId) -> Stamp {
        let mut stamp = self.clone();
        if !stamp.executions.contains(&operator) {
            stamp.executions.push(operator);
        }
        stamp
    }

    /// Adds one more piece of evidence, keeping the base within `max_len`
    pub fn with_serial(&self, serial: i64, max_len: usize) -> Stamp {
        let mut stamp = self.clone();
        if !stamp.evidential_base.contains(&serial) {
            stamp.evidential_base.push(serial);
        }
        if stamp.evidential_base.len() > max_len {
            let excess = stamp.evidential_base.len() - max_len;
            stamp.evidential_base.drain(..excess);
        }
        stamp
    }

    pub fn equals(&self, other: &Stamp, mode: StampEq) -> bool {
        (!mode.creation_time || self.creation_time == other.creation_time)
            && (!mode.occurrence_time || self.occurrence_time == other.occurrence_time)
            && (!mode.evidential_base || self.same_evidence(other))
    }

    fn same_evidence(&self, other: &Stamp) -> bool {
        let a: HashSet<_> = self.evidential_base.iter().collect();
        let b: HashSet<_> = other.evidential_base.iter().collect();
        a == b
    }

    /// True when this evidence would re-trigger an execution of `operator`
    /// it was itself derived from, or when the base repeats an id
    pub fn evidence_is_cyclic(&self, operator: TermId) -> bool {
        if self.executions.contains(&operator) {
            return true;
        }
        let mut seen = HashSet::new();
        !self.evidential_base.iter().all(|id| seen.insert(*id))
    }

    /// `self` happened more than `duration` after `other`
    pub fn after(&self, other: &Stamp, duration: i64) -> bool {
        match (self.occurrence_time, other.occurrence_time) {
            (Some(a), Some(b)) => a > b + duration,
            _ => false,
        }
    }

    /// Every id of `self` is also in `other`
    pub fn evidence_subset_of(&self, other: &Stamp) -> bool {
        let outer: HashSet<_> = other.evidential_base.iter().collect();
        self.evidential_base.iter().all(|id| outer.contains(id))
    }
}

/// The circularity guard: do two evidential bases share any id
pub fn base_overlap(a: &[i64], b: &[i64]) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if small.len() < 8 {
        return small.iter().any(|id| large.contains(id));
    }
    let set: HashSet<_> = small.iter().collect();
    large.iter().any(|id| set.contains(id))
}
