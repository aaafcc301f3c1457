//! Request/response shapes at the engine boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::Assessment;
use crate::record::ModelId;
use crate::threshold::Thresholds;
use crate::{Error, Result};

const fn default_model_id() -> ModelId {
    1
}

const fn default_window_minutes() -> i64 {
    60
}

const fn default_baseline_minutes() -> i64 {
    1440
}

/// Inbound drift request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftRequest {
    /// Model to evaluate
    #[serde(default = "default_model_id")]
    pub model_id: ModelId,
    /// Recent window length in minutes
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Baseline look-back in minutes (includes the recent window)
    #[serde(default = "default_baseline_minutes")]
    pub baseline_minutes: i64,
}

impl DriftRequest {
    /// Request with default windows (60 / 1440 minutes).
    #[must_use]
    pub const fn new(model_id: ModelId) -> Self {
        Self {
            model_id,
            window_minutes: default_window_minutes(),
            baseline_minutes: default_baseline_minutes(),
        }
    }

    /// Override the window lengths.
    #[must_use]
    pub const fn windows(mut self, window_minutes: i64, baseline_minutes: i64) -> Self {
        self.window_minutes = window_minutes;
        self.baseline_minutes = baseline_minutes;
        self
    }

    /// Reject empty or inverted windows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] unless
    /// `0 < window_minutes < baseline_minutes`.
    pub fn validate(&self) -> Result<()> {
        if self.window_minutes <= 0 {
            return Err(Error::InvalidInput(format!(
                "window_minutes must be positive (got {})",
                self.window_minutes
            )));
        }
        if self.baseline_minutes <= self.window_minutes {
            return Err(Error::InvalidInput(format!(
                "baseline_minutes ({}) must exceed window_minutes ({})",
                self.baseline_minutes, self.window_minutes
            )));
        }
        Ok(())
    }
}

impl Default for DriftRequest {
    fn default() -> Self {
        Self::new(default_model_id())
    }
}

/// Outbound drift response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResponse {
    /// `D(baseline ‖ recent)`
    pub kl_divergence: f64,
    /// Cosine similarity of the confidence distributions
    pub cosine_similarity: f64,
    /// Mean-embedding cosine distance; `null` when not computed
    pub embedding_drift: Option<f64>,
    /// Outcome of the drift predicate
    pub drift_detected: bool,
    /// Recent window start (exclusive)
    pub window_start: DateTime<Utc>,
    /// Recent window end (inclusive)
    pub window_end: DateTime<Utc>,
    /// Recent sample size
    pub sample_count: usize,
    /// Baseline sample size compared against
    pub baseline_count: usize,
    /// Thresholds actually applied
    pub thresholds: Thresholds,
}

/// What happened to the audit write of an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Persistence {
    /// Run and thresholds stored
    Recorded {
        /// ID of the stored run
        run_id: String,
    },
    /// Nothing stored (insufficient recent data)
    Skipped,
    /// Decision returned but the audit write failed
    Failed {
        /// Failure description
        reason: String,
    },
}

impl Persistence {
    /// Whether the audit write failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Full result of one orchestration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftEvaluation {
    /// Boundary response
    pub response: DriftResponse,
    /// Audit write outcome
    pub persistence: Persistence,
    /// Operator-facing health assessment
    pub assessment: Assessment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: DriftRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, DriftRequest::default());
        assert_eq!(request.window_minutes, 60);
        assert_eq!(request.baseline_minutes, 1440);

        let request: DriftRequest = serde_json::from_str(r#"{"model_id": 7, "window_minutes": 15}"#).unwrap();
        assert_eq!(request.model_id, 7);
        assert_eq!(request.baseline_minutes, 1440);
    }

    #[test]
    fn test_request_validation() {
        assert!(DriftRequest::new(1).validate().is_ok());
        assert!(DriftRequest::new(1).windows(0, 10).validate().is_err());
        assert!(DriftRequest::new(1).windows(60, 60).validate().is_err());
        assert!(DriftRequest::new(1).windows(60, 30).validate().is_err());
    }

    #[test]
    fn test_response_serializes_absent_embedding_as_null() {
        let now = Utc::now();
        let response = DriftResponse {
            kl_divergence: 0.0,
            cosine_similarity: 1.0,
            embedding_drift: None,
            drift_detected: false,
            window_start: now,
            window_end: now,
            sample_count: 2,
            baseline_count: 0,
            thresholds: Thresholds::BASE,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["embedding_drift"].is_null());
        assert_eq!(json["thresholds"]["cosine"], 0.9);
    }

    #[test]
    fn test_persistence_tagging() {
        let json = serde_json::to_value(Persistence::Skipped).unwrap();
        assert_eq!(json["state"], "skipped");
        assert!(Persistence::Failed {
            reason: "disk".into()
        }
        .is_failed());
    }
}
