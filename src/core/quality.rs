/// Outcome of the quality gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityDecision {
    /// Continue to matching and dispatch
    Proceed,
    /// Persist as `low_quality` and stop; matching is never attempted
    Reject,
}

/// The single home of the lead quality threshold
#[derive(Debug, Clone, Copy)]
pub struct QualityGate {
    min_score: f64,
}

pub const DEFAULT_MIN_QUALITY_SCORE: f64 = 5.0;

impl QualityGate {
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// A hard gate: anything strictly below the threshold is rejected
    pub fn evaluate(&self, quality_score: f64) -> QualityDecision {
        if quality_score.is_nan() || quality_score < self.min_score {
            QualityDecision::Reject
        } else {
            QualityDecision::Proceed
        }
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_QUALITY_SCORE)
    }
}
