//! Priority/durability/quality triples and the arithmetic that ages them.

use super::truth::TruthValue;
use serde::{Deserialize, Serialize};

/// Durability never reaches zero; an item always decays at a finite rate
pub const MIN_DURABILITY: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    priority: f32,
    durability: f32,
    quality: f32,
}

impl Budget {
    /// Out-of-range inputs are clamped, never propagated
    pub fn new(priority: f32, durability: f32, quality: f32) -> Self {
        Self {
            priority: clamp_unit(priority),
            durability: clamp_unit(durability).max(MIN_DURABILITY),
            quality: clamp_unit(quality),
        }
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn durability(&self) -> f32 {
        self.durability
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn set_priority(&mut self, priority: f32) {
        self.priority = clamp_unit(priority);
    }

    pub fn set_durability(&mut self, durability: f32) {
        self.durability = clamp_unit(durability).max(MIN_DURABILITY);
    }

    pub fn set_quality(&mut self, quality: f32) {
        self.quality = clamp_unit(quality);
    }

    /// Scales priority down by `factor`; never raises it
    pub fn scale_priority(&mut self, factor: f32) {
        self.priority = clamp_unit(self.priority * clamp_unit(factor));
    }

    /// Geometric mean of the three fields
    pub fn summary(&self) -> f32 {
        (self.priority * self.durability * self.quality).cbrt()
    }

    pub fn above_threshold(&self, threshold: f32) -> bool {
        self.summary() >= threshold
    }

    /// The cost of attention: priority moves toward `quality` at a rate set
    /// by durability, spread over `forget_cycles` selections. Quality is a
    /// floor; priority never decays below it.
    pub fn decay(&mut self, forget_cycles: f32) {
        let excess = self.priority - self.quality;
        if excess > 0.0 {
            let exponent = 1.0 / (forget_cycles.max(1.0) * excess);
            self.priority = clamp_unit(self.quality + excess * self.durability.powf(exponent)).max(self.quality);
        }
    }

    /// Combines two budgets for the same proposition
    pub fn merge(&mut self, other: &Budget) {
        self.priority = self.priority.max(other.priority);
        self.durability = self.durability.max(other.durability);
        self.quality = self.quality.max(other.quality);
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Probabilistic OR: at least one of the values is high
pub fn or(a: f32, b: f32) -> f32 {
    1.0 - (1.0 - a) * (1.0 - b)
}

pub fn truth_to_quality(truth: &TruthValue) -> f32 {
    let exp = truth.expectation();
    exp.max((1.0 - exp) * 0.75)
}

/// Budget of a revision conclusion. The premise task pays for the
/// redundancy: the less the revision changed, the more its own budget drops.
pub fn revise(
    task_truth: &TruthValue,
    belief_truth: &TruthValue,
    revised: &TruthValue,
    task_budget: &mut Budget,
) -> Budget {
    let dif_task = revised.exp_dif_abs(task_truth);
    let dif_belief = revised.exp_dif_abs(belief_truth);
    task_budget.scale_priority(1.0 - dif_task);
    task_budget.set_durability(task_budget.durability() * (1.0 - dif_task));
    let dif = dif_task.max(dif_belief);
    Budget::new(
        or(dif, task_budget.priority()),
        (dif + task_budget.durability()) / 2.0,
        truth_to_quality(revised),
    )
}
