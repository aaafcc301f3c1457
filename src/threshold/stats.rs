//! Summary statistics over historical metric values

use serde::{Deserialize, Serialize};

/// Count, mean and population standard deviation of a metric's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Number of usable values
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divisor `n`)
    pub std_dev: f64,
}

impl MetricStats {
    /// Summarise the finite values of `values`.
    ///
    /// Returns `None` when no finite value remains. NaN and infinities are
    /// dropped so a single corrupt row cannot poison the mean.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            count: finite.len(),
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_none() {
        assert!(MetricStats::from_values(Vec::new()).is_none());
        assert!(MetricStats::from_values(vec![f64::NAN, f64::INFINITY]).is_none());
    }

    #[test]
    fn test_population_std() {
        let stats = MetricStats::from_values(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_zero_spread() {
        let stats = MetricStats::from_values(vec![0.3]).unwrap();
        assert!((stats.mean - 0.3).abs() < 1e-12);
        assert!(stats.std_dev.abs() < 1e-12);
    }
}
