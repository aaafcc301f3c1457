//! Engine configuration
//!
//! Every tunable of the drift engine lives in [`DriftConfig`]. Values come
//! from (in increasing precedence) built-in defaults, a JSON document, and
//! `DRIFT_*` environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::threshold::Thresholds;
use crate::{Error, Result};

/// Default number of histogram bins.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;
/// Additive smoothing applied to every histogram bin.
pub const DEFAULT_SMOOTHING_EPSILON: f64 = 1e-10;
/// Minimum recent (and baseline) sample size before a comparison is made.
pub const DEFAULT_MIN_SAMPLES: usize = 5;
/// Most recent eligible runs consulted for threshold adaptation.
pub const DEFAULT_HISTORY_WINDOW: usize = 100;
/// Eligible runs required before thresholds adapt.
pub const DEFAULT_MIN_ADAPTIVE_SAMPLES: usize = 10;
/// Standard deviations above/below the historical mean.
pub const DEFAULT_SENSITIVITY: f64 = 2.0;
/// Bound on every data-access call.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;
/// Bound on every persistence call.
pub const DEFAULT_PERSIST_TIMEOUT_MS: u64 = 5_000;

/// Drift engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Number of equal-width bins spanning `[0, 1]`
    pub histogram_bins: usize,
    /// Additive smoothing per bin (keeps KL finite)
    pub smoothing_epsilon: f64,
    /// Minimum sample size for recent and baseline windows
    pub min_samples: usize,
    /// Eligible history rows consulted (`W`)
    pub history_window: usize,
    /// Eligible history rows required to adapt (`M`)
    pub min_adaptive_samples: usize,
    /// Multiplier on the standard deviation (`k`)
    pub sensitivity: f64,
    /// Fixed safety bounds and cold-start thresholds
    pub base_thresholds: Thresholds,
    /// Bound on sample fetches, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Bound on history reads and audit writes, in milliseconds
    pub persist_timeout_ms: u64,
    /// Whether runs that compared the recent window against itself count
    /// as eligible history
    pub history_includes_substituted_baseline: bool,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            smoothing_epsilon: DEFAULT_SMOOTHING_EPSILON,
            min_samples: DEFAULT_MIN_SAMPLES,
            history_window: DEFAULT_HISTORY_WINDOW,
            min_adaptive_samples: DEFAULT_MIN_ADAPTIVE_SAMPLES,
            sensitivity: DEFAULT_SENSITIVITY,
            base_thresholds: Thresholds::BASE,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            persist_timeout_ms: DEFAULT_PERSIST_TIMEOUT_MS,
            history_includes_substituted_baseline: false,
        }
    }
}

impl DriftConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> DriftConfigBuilder {
        DriftConfigBuilder::default()
    }

    /// Fetch timeout as a [`Duration`].
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Persistence timeout as a [`Duration`].
    #[must_use]
    pub const fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    /// Parse a JSON document, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed JSON and
    /// [`Error::InvalidInput`] if the resulting config fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `DRIFT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but unparsable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DriftConfig::from_env`] but with an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value is unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_from(&lookup, "DRIFT_HISTOGRAM_BINS", &mut config.histogram_bins)?;
        override_from(&lookup, "DRIFT_SMOOTHING_EPSILON", &mut config.smoothing_epsilon)?;
        override_from(&lookup, "DRIFT_MIN_SAMPLES", &mut config.min_samples)?;
        override_from(&lookup, "DRIFT_HISTORY_WINDOW", &mut config.history_window)?;
        override_from(
            &lookup,
            "DRIFT_MIN_ADAPTIVE_SAMPLES",
            &mut config.min_adaptive_samples,
        )?;
        override_from(&lookup, "DRIFT_SENSITIVITY", &mut config.sensitivity)?;
        override_from(&lookup, "DRIFT_BASE_KL", &mut config.base_thresholds.kl)?;
        override_from(&lookup, "DRIFT_BASE_COSINE", &mut config.base_thresholds.cosine)?;
        override_from(
            &lookup,
            "DRIFT_BASE_EMBEDDING",
            &mut config.base_thresholds.embedding,
        )?;
        override_from(&lookup, "DRIFT_FETCH_TIMEOUT_MS", &mut config.fetch_timeout_ms)?;
        override_from(&lookup, "DRIFT_PERSIST_TIMEOUT_MS", &mut config.persist_timeout_ms)?;
        override_from(
            &lookup,
            "DRIFT_HISTORY_INCLUDES_SUBSTITUTED_BASELINE",
            &mut config.history_includes_substituted_baseline,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.histogram_bins == 0 {
            return Err(Error::InvalidInput("histogram_bins must be > 0".to_string()));
        }
        if !(self.smoothing_epsilon.is_finite() && self.smoothing_epsilon > 0.0) {
            return Err(Error::InvalidInput(format!(
                "smoothing_epsilon must be a positive finite number (got {})",
                self.smoothing_epsilon
            )));
        }
        if self.min_samples == 0 {
            return Err(Error::InvalidInput("min_samples must be > 0".to_string()));
        }
        if self.history_window == 0 {
            return Err(Error::InvalidInput("history_window must be > 0".to_string()));
        }
        if !(self.sensitivity.is_finite() && self.sensitivity >= 0.0) {
            return Err(Error::InvalidInput(format!(
                "sensitivity must be a non-negative finite number (got {})",
                self.sensitivity
            )));
        }
        let base = self.base_thresholds;
        for (name, value) in [
            ("kl", base.kl),
            ("cosine", base.cosine),
            ("embedding", base.embedding),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "base_thresholds.{name} must be finite (got {value})"
                )));
            }
        }
        if self.fetch_timeout_ms == 0 || self.persist_timeout_ms == 0 {
            return Err(Error::InvalidInput("timeouts must be > 0 ms".to_string()));
        }
        Ok(())
    }
}

fn override_from<F, T>(lookup: &F, key: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}")))?;
    }
    Ok(())
}

/// Builder for [`DriftConfig`]
#[derive(Debug, Default)]
pub struct DriftConfigBuilder {
    config: DriftConfig,
}

impl DriftConfigBuilder {
    /// Set histogram bin count
    #[must_use]
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.config.histogram_bins = bins;
        self
    }

    /// Set minimum sample size per window
    #[must_use]
    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.config.min_samples = min_samples;
        self
    }

    /// Set history window (`W`)
    #[must_use]
    pub fn history_window(mut self, window: usize) -> Self {
        self.config.history_window = window;
        self
    }

    /// Set adaptive minimum (`M`)
    #[must_use]
    pub fn min_adaptive_samples(mut self, min: usize) -> Self {
        self.config.min_adaptive_samples = min;
        self
    }

    /// Set sensitivity (`k`)
    #[must_use]
    pub fn sensitivity(mut self, k: f64) -> Self {
        self.config.sensitivity = k;
        self
    }

    /// Set base thresholds
    #[must_use]
    pub fn base_thresholds(mut self, base: Thresholds) -> Self {
        self.config.base_thresholds = base;
        self
    }

    /// Set fetch timeout
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set persistence timeout
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn persist_timeout(mut self, timeout: Duration) -> Self {
        self.config.persist_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Count substituted-baseline runs as eligible history
    #[must_use]
    pub fn history_includes_substituted_baseline(mut self, include: bool) -> Self {
        self.config.history_includes_substituted_baseline = include;
        self
    }

    /// Build the config
    ///
    /// # Errors
    ///
    /// Returns error if validation fails
    pub fn build(self) -> Result<DriftConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_engine_constants() {
        let config = DriftConfig::default();
        assert_eq!(config.histogram_bins, 10);
        assert_eq!(config.min_samples, 5);
        assert_eq!(config.history_window, 100);
        assert_eq!(config.min_adaptive_samples, 10);
        assert!((config.sensitivity - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.base_thresholds, Thresholds::BASE);
        assert!(!config.history_includes_substituted_baseline);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = DriftConfig::builder()
            .histogram_bins(20)
            .min_samples(3)
            .sensitivity(3.0)
            .fetch_timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(config.histogram_bins, 20);
        assert_eq!(config.min_samples, 3);
        assert_eq!(config.fetch_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_builder_rejects_zero_bins() {
        let result = DriftConfig::builder().histogram_bins(0).build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let env: HashMap<&str, &str> = [
            ("DRIFT_MIN_SAMPLES", "8"),
            ("DRIFT_BASE_KL", "0.25"),
            ("DRIFT_HISTORY_INCLUDES_SUBSTITUTED_BASELINE", "true"),
        ]
        .into_iter()
        .collect();

        let config =
            DriftConfig::from_lookup(|key| env.get(key).map(|v| (*v).to_string())).unwrap();
        assert_eq!(config.min_samples, 8);
        assert!((config.base_thresholds.kl - 0.25).abs() < f64::EPSILON);
        assert!(config.history_includes_substituted_baseline);
        assert_eq!(config.history_window, DEFAULT_HISTORY_WINDOW);
    }

    #[test]
    fn test_from_lookup_unparsable() {
        let result = DriftConfig::from_lookup(|key| {
            (key == "DRIFT_SENSITIVITY").then(|| "very".to_string())
        });
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("DRIFT_SENSITIVITY")));
    }

    #[test]
    fn test_from_json_partial() {
        let config = DriftConfig::from_json(r#"{"histogram_bins": 16, "sensitivity": 1.5}"#).unwrap();
        assert_eq!(config.histogram_bins, 16);
        assert!((config.sensitivity - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.min_samples, DEFAULT_MIN_SAMPLES);
    }

    #[test]
    fn test_from_json_invalid_values() {
        let result = DriftConfig::from_json(r#"{"smoothing_epsilon": 0.0}"#);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_non_finite_base_thresholds() {
        let result = DriftConfig::from_lookup(|key| (key == "DRIFT_BASE_KL").then(|| "NaN".to_string()));
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("base_thresholds.kl")));

        let base = Thresholds {
            cosine: f64::INFINITY,
            ..Thresholds::BASE
        };
        assert!(DriftConfig::builder().base_thresholds(base).build().is_err());

        let result = DriftConfig::from_json(r#"{"base_thresholds": {"kl": 0.1, "cosine": 0.9, "embedding": 1e400}}"#);
        assert!(result.is_err());
    }
}
