//! Threshold State - auditable snapshot of one derived threshold

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MetricName, ModelId};
use crate::threshold::MetricThreshold;

/// Threshold State records the threshold active for `(model_id, metric)`
/// together with the statistics it was derived from.
///
/// ## Explainability
///
/// On cold start `adapted` is false and `sample_count` is 0; `mean` and
/// `std_dev` are then `None`. Otherwise the three statistics reproduce the
/// threshold via `mean ± k·std_dev`, clamped against `base`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdState {
    model_id: ModelId,
    metric: MetricName,
    threshold: f64,
    base: f64,
    adapted: bool,
    sample_count: usize,
    mean: Option<f64>,
    std_dev: Option<f64>,
    updated_at: DateTime<Utc>,
}

impl ThresholdState {
    /// Snapshot a derived threshold.
    #[must_use]
    pub fn from_threshold(model_id: ModelId, threshold: &MetricThreshold, at: DateTime<Utc>) -> Self {
        Self {
            model_id,
            metric: threshold.metric,
            threshold: threshold.value,
            base: threshold.base,
            adapted: threshold.is_adapted(),
            sample_count: threshold.stats.map_or(0, |s| s.count),
            mean: threshold.stats.map(|s| s.mean),
            std_dev: threshold.stats.map(|s| s.std_dev),
            updated_at: at,
        }
    }

    /// Get the model ID.
    #[must_use]
    pub const fn model_id(&self) -> ModelId {
        self.model_id
    }

    /// Get the metric name.
    #[must_use]
    pub const fn metric(&self) -> MetricName {
        self.metric
    }

    /// Get the active threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Get the base bound.
    #[must_use]
    pub const fn base(&self) -> f64 {
        self.base
    }

    /// Whether history (rather than the base) produced this threshold.
    #[must_use]
    pub const fn adapted(&self) -> bool {
        self.adapted
    }

    /// Number of history values used.
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Historical mean, if adapted.
    #[must_use]
    pub const fn mean(&self) -> Option<f64> {
        self.mean
    }

    /// Historical standard deviation, if adapted.
    #[must_use]
    pub const fn std_dev(&self) -> Option<f64> {
        self.std_dev
    }

    /// When this snapshot was taken.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
