//! Scoring types

use serde::{Deserialize, Serialize};

/// Binary verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "COVER")]
    Cover,
    #[serde(rename = "STEGO")]
    Stego,
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Cover => write!(f, "COVER"),
            Label::Stego => write!(f, "STEGO"),
        }
    }
}

/// Signed influence of one feature on the fused score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub influence_score: f64,
}

/// Outcome of scoring one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "prediction")]
    pub label: Label,
    /// Fused stego probability, rounded to 4 decimal places
    pub confidence: f64,
    /// Strongest contributions, largest absolute influence first
    pub top_features: Vec<FeatureContribution>,
}

/// Fusion weights and decision rule
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Weight of the logistic model (scaled input)
    pub logistic_weight: f64,
    /// Weight of the random forest (raw input)
    pub forest_weight: f64,
    /// STEGO iff the fused probability is strictly greater than this
    pub threshold: f64,
    /// Number of contributions kept in the verdict
    pub top_k: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            logistic_weight: 0.6,
            forest_weight: 0.4,
            threshold: 0.4,
            top_k: 5,
        }
    }
}

/// Rounds to `decimals` places using the exact binary value, so a value
/// stored just below a midpoint rounds down and exact midpoints go to even.
pub(crate) fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}
