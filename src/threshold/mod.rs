//! Adaptive Threshold Engine
//!
//! Thresholds track the model's own recent non-drifted behaviour:
//!
//! ```text
//! KL, embedding (upper bounds):  threshold = max(μ + k·σ, base)
//! cosine        (lower bound):   threshold = min(μ − k·σ, base)
//! ```
//!
//! The base values are safety bounds. Upper-bound metrics may only rise
//! above their base and the lower-bound metric may only fall below it, so
//! a long quiet period can never make the detector more sensitive than the
//! fixed cold-start configuration.
//!
//! Toyota Way: Jidoka (stop on abnormality, never learn from it). Only runs
//! whose own outcome was "no drift" feed the statistics.

mod stats;

pub use stats::MetricStats;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{DriftMetricSet, MetricName, ModelId, ThresholdState};

/// Per-metric decision thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// KL divergence upper bound
    pub kl: f64,
    /// Cosine similarity lower bound
    pub cosine: f64,
    /// Embedding cosine-distance upper bound
    pub embedding: f64,
}

impl Thresholds {
    /// Fixed base thresholds used on cold start.
    pub const BASE: Self = Self {
        kl: 0.1,
        cosine: 0.9,
        embedding: 0.15,
    };

    /// Threshold for a single metric.
    #[must_use]
    pub const fn get(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::KlDivergence => self.kl,
            MetricName::CosineSimilarity => self.cosine,
            MetricName::EmbeddingDrift => self.embedding,
        }
    }

    /// Evaluate each signal independently against these thresholds.
    ///
    /// An absent embedding metric never fires.
    #[must_use]
    pub fn evaluate(&self, metrics: &DriftMetricSet) -> DriftSignals {
        DriftSignals {
            kl: metrics.kl_divergence > self.kl,
            cosine: metrics.cosine_similarity < self.cosine,
            embedding: metrics
                .embedding_drift
                .is_some_and(|drift| drift > self.embedding),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::BASE
    }
}

/// Which signals crossed their bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftSignals {
    /// KL divergence above its threshold
    pub kl: bool,
    /// Cosine similarity below its threshold
    pub cosine: bool,
    /// Embedding drift present and above its threshold
    pub embedding: bool,
}

impl DriftSignals {
    /// Logical OR across all signals.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.kl || self.cosine || self.embedding
    }

    /// Number of signals that fired.
    #[must_use]
    pub fn count(&self) -> usize {
        [self.kl, self.cosine, self.embedding]
            .into_iter()
            .filter(|fired| *fired)
            .count()
    }
}

/// Direction in which a threshold bounds its metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Drift when the metric rises above the threshold
    Upper,
    /// Drift when the metric falls below the threshold
    Lower,
}

impl Bound {
    /// Bound direction for a metric.
    #[must_use]
    pub const fn of(metric: MetricName) -> Self {
        match metric {
            MetricName::KlDivergence | MetricName::EmbeddingDrift => Self::Upper,
            MetricName::CosineSimilarity => Self::Lower,
        }
    }
}

/// Tunables of the adaptation rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    /// Fixed safety bounds
    pub base: Thresholds,
    /// Multiplier on σ (`k`)
    pub sensitivity: f64,
    /// Most recent history rows consulted (`W`)
    pub window: usize,
    /// Usable values needed before a metric adapts (`M`)
    pub min_samples: usize,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            base: Thresholds::BASE,
            sensitivity: crate::config::DEFAULT_SENSITIVITY,
            window: crate::config::DEFAULT_HISTORY_WINDOW,
            min_samples: crate::config::DEFAULT_MIN_ADAPTIVE_SAMPLES,
        }
    }
}

impl From<&crate::DriftConfig> for ThresholdPolicy {
    fn from(config: &crate::DriftConfig) -> Self {
        Self {
            base: config.base_thresholds,
            sensitivity: config.sensitivity,
            window: config.history_window,
            min_samples: config.min_adaptive_samples,
        }
    }
}

/// One derived threshold with the evidence behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricThreshold {
    /// Metric this threshold applies to
    pub metric: MetricName,
    /// Active threshold
    pub value: f64,
    /// Base bound it was clamped against
    pub base: f64,
    /// Bound direction
    pub bound: Bound,
    /// Statistics used; `None` on cold start
    pub stats: Option<MetricStats>,
}

impl MetricThreshold {
    /// Whether the threshold was derived from history.
    #[must_use]
    pub const fn is_adapted(&self) -> bool {
        self.stats.is_some()
    }

    fn cold(metric: MetricName, base: f64) -> Self {
        Self {
            metric,
            value: base,
            base,
            bound: Bound::of(metric),
            stats: None,
        }
    }

    fn adapted(metric: MetricName, base: f64, sensitivity: f64, stats: MetricStats) -> Self {
        let bound = Bound::of(metric);
        let value = match bound {
            // Floor: may only rise above base.
            Bound::Upper => (sensitivity.mul_add(stats.std_dev, stats.mean)).max(base),
            // Ceiling: may only fall below base.
            Bound::Lower => (sensitivity.mul_add(-stats.std_dev, stats.mean)).min(base),
        };
        Self {
            metric,
            value,
            base,
            bound,
            stats: Some(stats),
        }
    }
}

/// Thresholds derived for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedThresholds {
    /// KL divergence threshold
    pub kl: MetricThreshold,
    /// Cosine similarity threshold
    pub cosine: MetricThreshold,
    /// Embedding drift threshold
    pub embedding: MetricThreshold,
}

impl DerivedThresholds {
    /// Base thresholds with no statistics attached.
    #[must_use]
    pub fn cold_start(base: Thresholds) -> Self {
        Self {
            kl: MetricThreshold::cold(MetricName::KlDivergence, base.kl),
            cosine: MetricThreshold::cold(MetricName::CosineSimilarity, base.cosine),
            embedding: MetricThreshold::cold(MetricName::EmbeddingDrift, base.embedding),
        }
    }

    /// Plain threshold triple.
    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        Thresholds {
            kl: self.kl.value,
            cosine: self.cosine.value,
            embedding: self.embedding.value,
        }
    }

    /// Iterate the three metric thresholds in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricThreshold> {
        [&self.kl, &self.cosine, &self.embedding].into_iter()
    }

    /// Audit records for persisting this derivation.
    #[must_use]
    pub fn to_states(&self, model_id: ModelId, at: DateTime<Utc>) -> Vec<ThresholdState> {
        self.iter()
            .map(|t| ThresholdState::from_threshold(model_id, t, at))
            .collect()
    }
}

/// Derive thresholds from eligible history (most recent first).
///
/// At most `policy.window` entries are consulted. Each metric adapts
/// independently once it has `policy.min_samples` usable values; absent
/// and non-finite values are skipped rather than treated as zero.
///
/// # Example
///
/// ```rust
/// use trueno_drift::record::DriftMetricSet;
/// use trueno_drift::threshold::{derive_thresholds, ThresholdPolicy, Thresholds};
///
/// let policy = ThresholdPolicy::default();
///
/// // Cold start: too little history
/// let history = vec![DriftMetricSet::new(0.01, 0.99, None); 3];
/// let derived = derive_thresholds(&history, &policy);
/// assert_eq!(derived.thresholds(), Thresholds::BASE);
///
/// // Noisy history raises the KL threshold above its floor
/// let history: Vec<_> = (0..20)
///     .map(|i| DriftMetricSet::new(if i % 2 == 0 { 0.0 } else { 0.4 }, 0.95, None))
///     .collect();
/// let derived = derive_thresholds(&history, &policy);
/// assert!(derived.thresholds().kl > 0.1);
/// ```
#[must_use]
pub fn derive_thresholds(history: &[DriftMetricSet], policy: &ThresholdPolicy) -> DerivedThresholds {
    let window = &history[..history.len().min(policy.window)];

    let derive = |metric: MetricName, base: f64| {
        let values = window.iter().filter_map(|set| set.get(metric));
        match MetricStats::from_values(values) {
            Some(stats) if stats.count >= policy.min_samples => {
                MetricThreshold::adapted(metric, base, policy.sensitivity, stats)
            }
            _ => MetricThreshold::cold(metric, base),
        }
    };

    DerivedThresholds {
        kl: derive(MetricName::KlDivergence, policy.base.kl),
        cosine: derive(MetricName::CosineSimilarity, policy.base.cosine),
        embedding: derive(MetricName::EmbeddingDrift, policy.base.embedding),
    }
}
