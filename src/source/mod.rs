//! Sample Source - data-access collaborator
//!
//! The orchestrator never reads inference logs directly; it asks a
//! [`SampleSource`] for the confidence scalars and embeddings recorded for a
//! model inside a half-open interval `(start, end]`.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::{Duration, Utc};
//! use trueno_drift::source::{InferenceEvent, MemorySampleSource, SampleSource, TimeWindow};
//!
//! # async fn example() -> trueno_drift::Result<()> {
//! let source = MemorySampleSource::new();
//! let now = Utc::now();
//! source.record(InferenceEvent::new(1, now).confidence(0.82));
//! source.record(InferenceEvent::new(1, now)); // missing confidence
//!
//! let window = TimeWindow::new(now - Duration::minutes(5), now);
//! let values = source.confidences(1, &window).await?;
//! assert_eq!(values, vec![0.82, 0.5]);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::{InferenceEvent, MemorySampleSource};

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Embedding, ModelId};
use crate::{Error, Result};

/// Confidence substituted for inference events that recorded none.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

fn minutes_before(now: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>> {
    Duration::try_minutes(minutes)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| {
            Error::InvalidInput(format!("{minutes} minutes before {now} is out of range"))
        })
}

/// Half-open time interval `(start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Exclusive lower bound
    pub start: DateTime<Utc>,
    /// Inclusive upper bound
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window covering `(now − minutes, now]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the start is not representable.
    pub fn trailing(now: DateTime<Utc>, minutes: i64) -> Result<Self> {
        Ok(Self::new(minutes_before(now, minutes)?, now))
    }

    /// Recent and baseline windows for a request evaluated at `now`.
    ///
    /// Recent: `(now − window, now]`. Baseline: `(now − baseline, now − window]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either bound is not representable.
    pub fn split(
        now: DateTime<Utc>,
        window_minutes: i64,
        baseline_minutes: i64,
    ) -> Result<(Self, Self)> {
        let boundary = minutes_before(now, window_minutes)?;
        let start = minutes_before(now, baseline_minutes)?;
        Ok((Self::new(boundary, now), Self::new(start, boundary)))
    }

    /// Whether `at` falls inside `(start, end]`.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at > self.start && at <= self.end
    }
}

/// Data-access collaborator trait.
///
/// Implementations must return an error (not an empty sample) when the
/// backing store cannot be reached, so callers can tell "no data" apart
/// from "no access".
pub trait SampleSource: Send + Sync {
    /// Confidence scalars for `model_id` in `window`.
    ///
    /// Missing confidences are reported as [`NEUTRAL_CONFIDENCE`] so the
    /// sample size equals the number of inference events.
    fn confidences(
        &self,
        model_id: ModelId,
        window: &TimeWindow,
    ) -> impl Future<Output = Result<Vec<f64>>> + Send;

    /// Embedding vectors for `model_id` in `window` (events without one are skipped).
    fn embeddings(
        &self,
        model_id: ModelId,
        window: &TimeWindow,
    ) -> impl Future<Output = Result<Vec<Embedding>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_half_open() {
        let now = Utc::now();
        let window = TimeWindow::trailing(now, 10).unwrap();
        assert!(window.contains(now));
        assert!(!window.contains(now - Duration::minutes(10)));
        assert!(window.contains(now - Duration::minutes(10) + Duration::milliseconds(1)));
        assert!(!window.contains(now + Duration::milliseconds(1)));
    }

    #[test]
    fn test_split_windows_are_adjacent() {
        let now = Utc::now();
        let (recent, baseline) = TimeWindow::split(now, 60, 1440).unwrap();
        assert_eq!(recent.start, baseline.end);
        assert_eq!(recent.end, now);
        assert_eq!(baseline.start, now - Duration::minutes(1440));

        // The boundary instant belongs to the baseline only
        assert!(baseline.contains(recent.start));
        assert!(!recent.contains(recent.start));
    }

    #[test]
    fn test_split_rejects_unrepresentable_spans() {
        let now = Utc::now();
        assert!(matches!(
            TimeWindow::split(now, 60, 1_000_000_000_000),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            TimeWindow::split(now, 60, i64::MAX),
            Err(Error::InvalidInput(_))
        ));
        assert!(TimeWindow::trailing(now, i64::MAX).is_err());
    }
}
