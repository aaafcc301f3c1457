//! Audit assessment of a drift decision
//!
//! Translates which signals fired into an operator-facing health status
//! and recommendation.

use serde::{Deserialize, Serialize};

use crate::threshold::DriftSignals;

/// Health of a model as seen by one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// No signal crossed its bound
    Healthy,
    /// Exactly one signal crossed its bound
    Warning,
    /// Several signals crossed their bounds
    Critical,
}

/// Status plus recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    /// Overall status
    pub status: HealthStatus,
    /// Signals behind the status
    pub signals: DriftSignals,
    /// Recommended operator action
    pub recommendation: &'static str,
}

/// Assess a set of fired signals.
#[must_use]
pub fn assess(signals: DriftSignals) -> Assessment {
    let (status, recommendation) = match signals.count() {
        0 => (
            HealthStatus::Healthy,
            "No significant drift detected. Model operating within normal parameters.",
        ),
        1 if signals.cosine => (
            HealthStatus::Warning,
            "Cosine similarity indicates a shift in the confidence distribution shape. Monitor closely.",
        ),
        1 if signals.kl => (
            HealthStatus::Warning,
            "KL divergence indicates probability distribution shift. Review model performance.",
        ),
        1 => (
            HealthStatus::Warning,
            "Embedding drift indicates a shift in the representation space. Inspect recent inputs.",
        ),
        _ => (
            HealthStatus::Critical,
            "Significant drift detected across multiple metrics. Recommend model retraining.",
        ),
    };

    Assessment {
        status,
        signals,
        recommendation,
    }
}
