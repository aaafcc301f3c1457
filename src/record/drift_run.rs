//! Drift Run - immutable audit record of one evaluation

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DriftMetricSet, ModelId};
use crate::threshold::Thresholds;

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_run_id(model_id: ModelId, at: DateTime<Utc>) -> String {
    let seq = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{model_id}-{}-{seq}", at.timestamp_millis())
}

/// Drift Run records a single orchestrated evaluation.
///
/// Runs are append-only. The non-drifted ones form the eligible history
/// that calibrates future thresholds for the same model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftRun {
    run_id: String,
    model_id: ModelId,
    metrics: DriftMetricSet,
    thresholds: Thresholds,
    drift_detected: bool,
    sample_count: usize,
    baseline_count: usize,
    baseline_substituted: bool,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl DriftRun {
    /// Create a builder; the decision is derived from metrics and thresholds.
    #[must_use]
    pub fn builder(model_id: ModelId, metrics: DriftMetricSet) -> DriftRunBuilder {
        DriftRunBuilder::new(model_id, metrics)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the model ID.
    #[must_use]
    pub const fn model_id(&self) -> ModelId {
        self.model_id
    }

    /// Get the computed metrics.
    #[must_use]
    pub const fn metrics(&self) -> &DriftMetricSet {
        &self.metrics
    }

    /// Get the thresholds the decision was made against.
    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Whether drift was detected.
    #[must_use]
    pub const fn drift_detected(&self) -> bool {
        self.drift_detected
    }

    /// Recent window sample size.
    #[must_use]
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Baseline sample size actually compared against.
    #[must_use]
    pub const fn baseline_count(&self) -> usize {
        self.baseline_count
    }

    /// Whether the recent sample stood in for a too-small baseline.
    #[must_use]
    pub const fn baseline_substituted(&self) -> bool {
        self.baseline_substituted
    }

    /// Start of the recent window (exclusive).
    #[must_use]
    pub const fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    /// End of the recent window (inclusive).
    #[must_use]
    pub const fn window_end(&self) -> DateTime<Utc> {
        self.window_end
    }

    /// When the run was recorded.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Eligible for threshold history under the given policy.
    #[must_use]
    pub const fn is_eligible(&self, include_substituted: bool) -> bool {
        !self.drift_detected && (include_substituted || !self.baseline_substituted)
    }
}

/// Builder for `DriftRun`.
#[derive(Debug)]
pub struct DriftRunBuilder {
    run_id: Option<String>,
    model_id: ModelId,
    metrics: DriftMetricSet,
    thresholds: Thresholds,
    sample_count: usize,
    baseline_count: usize,
    baseline_substituted: bool,
    window_start: Option<DateTime<Utc>>,
    window_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl DriftRunBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(model_id: ModelId, metrics: DriftMetricSet) -> Self {
        Self {
            run_id: None,
            model_id,
            metrics,
            thresholds: Thresholds::BASE,
            sample_count: 0,
            baseline_count: 0,
            baseline_substituted: false,
            window_start: None,
            window_end: None,
            created_at: Utc::now(),
        }
    }

    /// Set an explicit run ID (generated otherwise).
    #[must_use]
    pub fn run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Set the thresholds applied.
    #[must_use]
    pub const fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set recent and baseline sample sizes.
    #[must_use]
    pub const fn counts(mut self, sample_count: usize, baseline_count: usize) -> Self {
        self.sample_count = sample_count;
        self.baseline_count = baseline_count;
        self
    }

    /// Mark the baseline as substituted by the recent sample.
    #[must_use]
    pub const fn baseline_substituted(mut self, substituted: bool) -> Self {
        self.baseline_substituted = substituted;
        self
    }

    /// Set the recent window bounds.
    #[must_use]
    pub const fn window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window_start = Some(start);
        self.window_end = Some(end);
        self
    }

    /// Set a custom creation timestamp.
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `DriftRun`.
    #[must_use]
    pub fn build(self) -> DriftRun {
        let drift_detected = self.thresholds.evaluate(&self.metrics).any();
        DriftRun {
            run_id: self
                .run_id
                .unwrap_or_else(|| next_run_id(self.model_id, self.created_at)),
            model_id: self.model_id,
            metrics: self.metrics,
            thresholds: self.thresholds,
            drift_detected,
            sample_count: self.sample_count,
            baseline_count: self.baseline_count,
            baseline_substituted: self.baseline_substituted,
            window_start: self.window_start.unwrap_or(self.created_at),
            window_end: self.window_end.unwrap_or(self.created_at),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_derived_from_thresholds() {
        let quiet = DriftRun::builder(1, DriftMetricSet::new(0.01, 0.99, None)).build();
        assert!(!quiet.drift_detected());

        let loud = DriftRun::builder(1, DriftMetricSet::new(0.5, 0.99, None)).build();
        assert!(loud.drift_detected());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let at = Utc::now();
        let a = DriftRun::builder(3, DriftMetricSet::identical()).created_at(at).build();
        let b = DriftRun::builder(3, DriftMetricSet::identical()).created_at(at).build();
        assert_ne!(a.run_id(), b.run_id());
        assert!(a.run_id().starts_with("3-"));
    }

    #[test]
    fn test_eligibility() {
        let substituted = DriftRun::builder(1, DriftMetricSet::identical())
            .baseline_substituted(true)
            .build();
        assert!(!substituted.is_eligible(false));
        assert!(substituted.is_eligible(true));

        let drifted = DriftRun::builder(1, DriftMetricSet::new(1.0, 0.1, None)).build();
        assert!(!drifted.is_eligible(true));
    }
}
