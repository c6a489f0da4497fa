use serde::{Deserialize, Serialize};

/// The only global mutable state: logical time, the next evidence serial,
/// and the cycle before which no automatic decision may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    time: i64,
    next_serial: i64,
    decision_block: i64,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            time: 0,
            next_serial: 1,
            decision_block: 0,
        }
    }
}

impl Clock {
    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn set_time(&mut self, time: i64) {
        self.time = time;
    }

    pub fn tick(&mut self) -> i64 {
        self.time += 1;
        self.time
    }

    /// Fresh evidence id; ids are never reused
    pub fn new_serial(&mut self) -> i64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    pub fn decision_block(&self) -> i64 {
        self.decision_block
    }

    pub fn set_decision_block(&mut self, cycle: i64) {
        self.decision_block = cycle;
    }

    pub fn decision_allowed(&self) -> bool {
        self.time >= self.decision_block
    }
}
