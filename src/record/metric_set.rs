//! Drift Metric Set - the three signals computed per evaluation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a drift metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    /// KL divergence of recent against baseline confidence
    KlDivergence,
    /// Cosine similarity of the confidence distributions
    CosineSimilarity,
    /// Cosine distance between mean embeddings
    EmbeddingDrift,
}

impl MetricName {
    /// All metrics in stable order.
    pub const ALL: [Self; 3] = [Self::KlDivergence, Self::CosineSimilarity, Self::EmbeddingDrift];

    /// Stable string name (used as storage key).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KlDivergence => "kl_divergence",
            Self::CosineSimilarity => "cosine_similarity",
            Self::EmbeddingDrift => "embedding_drift",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics computed for one request.
///
/// `embedding_drift` is `None` when either embedding set was empty. Absence
/// is kept distinct from `Some(0.0)` all the way into storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftMetricSet {
    /// `D(baseline ‖ recent)`, ≥ 0
    pub kl_divergence: f64,
    /// In `[-1, 1]`; 1 means identical shape
    pub cosine_similarity: f64,
    /// Mean-embedding cosine distance, if computed
    pub embedding_drift: Option<f64>,
}

impl DriftMetricSet {
    /// Create a metric set.
    #[must_use]
    pub const fn new(kl_divergence: f64, cosine_similarity: f64, embedding_drift: Option<f64>) -> Self {
        Self {
            kl_divergence,
            cosine_similarity,
            embedding_drift,
        }
    }

    /// Metrics reported when there is not enough signal to judge.
    #[must_use]
    pub const fn identical() -> Self {
        Self::new(0.0, 1.0, None)
    }

    /// Value of one metric, `None` if absent.
    #[must_use]
    pub const fn get(&self, metric: MetricName) -> Option<f64> {
        match metric {
            MetricName::KlDivergence => Some(self.kl_divergence),
            MetricName::CosineSimilarity => Some(self.cosine_similarity),
            MetricName::EmbeddingDrift => self.embedding_drift,
        }
    }

    /// Copy with every present value rounded to `decimals` places.
    #[must_use]
    pub fn rounded(&self, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        let round = |v: f64| (v * scale).round() / scale;
        Self {
            kl_divergence: round(self.kl_divergence),
            cosine_similarity: round(self.cosine_similarity),
            embedding_drift: self.embedding_drift.map(round),
        }
    }
}
