use serde::{Deserialize, Serialize};

/// Per-field extraction metadata supplied by the upstream OCR/transform
/// stage. Read-only input; never mutated by the review engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidence {
    pub value: String,
    pub confidence: f64,
}

/// The pair of scores the review engine adjusts over a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub extraction: f64,
    pub compliance: f64,
}

impl ConfidenceScores {
    pub fn new(extraction: f64, compliance: f64) -> Self {
        Self { extraction, compliance }
    }

    /// Clamp both scores into [0, 1]. Upstream scalars are contract-bound to
    /// that range already; non-finite values collapse to 0.
    pub fn clamped(self) -> Self {
        Self { extraction: clamp_unit(self.extraction), compliance: clamp_unit(self.compliance) }
    }

    /// Component-wise maximum. Used to hold the monotonic high-water mark.
    pub fn max(self, other: Self) -> Self {
        Self {
            extraction: self.extraction.max(other.extraction),
            compliance: self.compliance.max(other.compliance),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
