//! Frequency/confidence pairs and the pure truth functions over them.

use serde::{Deserialize, Serialize};

/// Confidence never reaches 1; certainty is not representable
pub const MAX_CONFIDENCE: f32 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    frequency: f32,
    confidence: f32,
}

impl TruthValue {
    pub fn new(frequency: f32, confidence: f32) -> Self {
        Self {
            frequency: frequency.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, MAX_CONFIDENCE),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn with_frequency(&self, frequency: f32) -> Self {
        Self::new(frequency, self.confidence)
    }

    pub fn with_confidence(&self, confidence: f32) -> Self {
        Self::new(self.frequency, confidence)
    }

    pub fn expectation(&self) -> f32 {
        self.confidence * (self.frequency - 0.5) + 0.5
    }

    pub fn exp_dif_abs(&self, other: &TruthValue) -> f32 {
        (self.expectation() - other.expectation()).abs()
    }

    /// Equality up to the resolution truth values are compared at
    pub fn approx_eq(&self, other: &TruthValue) -> bool {
        (self.frequency - other.frequency).abs() < 0.005 && (self.confidence - other.confidence).abs() < 0.005
    }
}

fn c2w(confidence: f32, horizon: f32) -> f32 {
    horizon * confidence / (1.0 - confidence)
}

fn w2c(weight: f32, horizon: f32) -> f32 {
    weight / (weight + horizon)
}

/// Pools the evidence of two independent sentences about the same term
pub fn revision(a: &TruthValue, b: &TruthValue, horizon: f32) -> TruthValue {
    let w1 = c2w(a.confidence, horizon);
    let w2 = c2w(b.confidence, horizon);
    let w = w1 + w2;
    if w <= 0.0 {
        return TruthValue::new((a.frequency + b.frequency) / 2.0, 0.0);
    }
    TruthValue::new((w1 * a.frequency + w2 * b.frequency) / w, w2c(w, horizon))
}

pub fn deduction(a: &TruthValue, b: &TruthValue) -> TruthValue {
    let f = a.frequency * b.frequency;
    TruthValue::new(f, f * a.confidence * b.confidence)
}

/// Deduction over desire values: the strength of the means given the end
pub fn desire_ded(a: &TruthValue, b: &TruthValue) -> TruthValue {
    TruthValue::new(a.frequency * b.frequency, a.confidence * b.confidence)
}

/// Confidence an event keeps when generalized to all times
pub fn eternalize(t: &TruthValue, horizon: f32) -> TruthValue {
    TruthValue::new(t.frequency, w2c(t.confidence, horizon))
}

/// Factor by which confidence shrinks when an event observed at `source`
/// is carried to `target`, seen from `now`. `duration` smooths the
/// denominator so an event one step old is not discarded outright.
pub fn temporal_projection(source: i64, target: i64, now: i64, duration: i64) -> f32 {
    let denominator = ((source - now).abs() + (target - now).abs() + duration.max(1)) as f32;
    (1.0 - (source - target).abs() as f32 / denominator).clamp(0.0, 1.0)
}
