//! Distribution Builder
//!
//! Turns a sample of scalar confidence values into a smoothed probability
//! distribution over `B` equal-width bins spanning `[0, 1]`.
//!
//! Invariants of every [`Distribution`]:
//! - exactly `B` entries
//! - every entry strictly positive (additive smoothing)
//! - entries sum to 1
//!
//! Strict positivity is what keeps `D(P‖Q)` finite for any pair.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_HISTOGRAM_BINS, DEFAULT_SMOOTHING_EPSILON};

/// Smoothed histogram density over `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    bins: Vec<f64>,
}

impl Distribution {
    /// Uniform distribution over `bins` bins.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn uniform(bins: usize) -> Self {
        Self {
            bins: vec![1.0 / bins as f64; bins],
        }
    }

    /// Build with the default bin count and smoothing.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        Self::build(values, DEFAULT_HISTOGRAM_BINS, DEFAULT_SMOOTHING_EPSILON)
    }

    /// Build a smoothed density histogram.
    ///
    /// Values outside `[0, 1]` are clamped into the boundary bins; `1.0`
    /// lands in the last bin. Non-finite values are skipped. With no usable
    /// value the uniform distribution is returned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trueno_drift::distribution::Distribution;
    ///
    /// let dist = Distribution::build(&[0.05, 0.15, 0.95], 10, 1e-10);
    /// assert_eq!(dist.len(), 10);
    /// assert!(dist.bins().iter().all(|&p| p > 0.0));
    /// assert!((dist.bins().iter().sum::<f64>() - 1.0).abs() < 1e-9);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    pub fn build(values: &[f64], bins: usize, epsilon: f64) -> Self {
        if bins == 0 {
            return Self { bins: Vec::new() };
        }

        let mut counts = vec![0usize; bins];
        let mut total = 0usize;
        for &value in values.iter().filter(|v| v.is_finite()) {
            let idx = ((value.clamp(0.0, 1.0) * bins as f64) as usize).min(bins - 1);
            counts[idx] += 1;
            total += 1;
        }

        if total == 0 {
            return Self::uniform(bins);
        }

        // Density: count / (n · bin_width), bin_width = 1/B
        let width = 1.0 / bins as f64;
        let norm = total as f64 * width;
        let smoothed: Vec<f64> = counts
            .iter()
            .map(|&c| c as f64 / norm + epsilon)
            .collect();
        let sum: f64 = smoothed.iter().sum();

        Self {
            bins: smoothed.into_iter().map(|p| p / sum).collect(),
        }
    }

    /// Probability mass per bin.
    #[must_use]
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True only for the degenerate zero-bin distribution.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
