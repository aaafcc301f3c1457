//! Drift Orchestrator
//!
//! Per-request state machine:
//!
//! ```text
//! fetch ──► recent < MIN_SAMPLES? ──yes──► "not enough signal" (no persistence)
//!                 │ no
//!                 ▼
//!           baseline < MIN_SAMPLES? ──yes──► baseline := recent
//!                 │
//!                 ▼
//!   distributions ► KL / cosine / embedding ► adaptive thresholds
//!                 │
//!                 ▼
//!      decide (OR of signals) ► persist run + thresholds ► respond
//! ```
//!
//! The orchestrator holds no mutable state: everything that crosses
//! requests lives in the [`DriftStore`]. Every collaborator call is bounded
//! by a timeout so a hung backend fails the request instead of stalling it.
//!
//! # Example
//!
//! ```rust,no_run
//! use trueno_drift::orchestrator::{DriftOrchestrator, DriftRequest};
//! use trueno_drift::source::MemorySampleSource;
//! use trueno_drift::store::MemoryDriftStore;
//! use trueno_drift::DriftConfig;
//!
//! # async fn example() -> trueno_drift::Result<()> {
//! let orchestrator = DriftOrchestrator::new(
//!     DriftConfig::default(),
//!     MemorySampleSource::new(),
//!     MemoryDriftStore::new(),
//! )?;
//!
//! let evaluation = orchestrator.detect(&DriftRequest::new(1)).await?;
//! println!("drift: {}", evaluation.response.drift_detected);
//! # Ok(())
//! # }
//! ```

mod api;

pub use api::{DriftEvaluation, DriftRequest, DriftResponse, Persistence};

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::audit::assess;
use crate::distribution::Distribution;
use crate::divergence::{cosine_similarity, embedding_drift, kl_divergence};
use crate::record::{DriftMetricSet, DriftRun, Embedding, ModelId, ThresholdState};
use crate::source::{SampleSource, TimeWindow};
use crate::store::{DriftStore, HistoryQuery};
use crate::threshold::{derive_thresholds, DriftSignals, ThresholdPolicy};
use crate::{DriftConfig, Error, Result};

/// Decimal places kept in response metrics.
const RESPONSE_DECIMALS: i32 = 6;

/// Samples fetched for one request.
#[derive(Debug, Clone, Default, PartialEq)]
struct WindowSamples {
    recent: Vec<f64>,
    baseline: Vec<f64>,
    recent_embeddings: Vec<Embedding>,
    baseline_embeddings: Vec<Embedding>,
}

#[allow(clippy::cast_possible_truncation)]
async fn bounded<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout {
            operation,
            after_ms: limit.as_millis() as u64,
        })?
}

fn unavailable(err: Error) -> Error {
    match err {
        Error::DataUnavailable(_) => err,
        other => Error::DataUnavailable(other.to_string()),
    }
}

/// Compute the metric set for a baseline/recent pair.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if embedding dimensions disagree.
pub fn compute_metrics(
    config: &DriftConfig,
    baseline: &[f64],
    recent: &[f64],
    baseline_embeddings: &[Embedding],
    recent_embeddings: &[Embedding],
) -> Result<DriftMetricSet> {
    let p = Distribution::build(baseline, config.histogram_bins, config.smoothing_epsilon);
    let q = Distribution::build(recent, config.histogram_bins, config.smoothing_epsilon);

    Ok(DriftMetricSet::new(
        kl_divergence(&p, &q)?,
        cosine_similarity(&p, &q)?,
        embedding_drift(baseline_embeddings, recent_embeddings)?,
    ))
}

/// Coordinates sample fetching, metric computation, adaptive thresholds and
/// audit persistence for drift requests.
#[derive(Debug)]
pub struct DriftOrchestrator<S, P> {
    config: DriftConfig,
    source: S,
    store: P,
}

impl<S, P> DriftOrchestrator<S, P>
where
    S: SampleSource,
    P: DriftStore,
{
    /// Create an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the config fails validation.
    pub fn new(config: DriftConfig, source: S, store: P) -> Result<Self> {
        config.validate()?;
        info!(
            bins = config.histogram_bins,
            min_samples = config.min_samples,
            history_window = config.history_window,
            min_adaptive_samples = config.min_adaptive_samples,
            sensitivity = config.sensitivity,
            "Creating drift orchestrator"
        );
        Ok(Self {
            config,
            source,
            store,
        })
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &DriftConfig {
        &self.config
    }

    /// Data-access collaborator.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Persistence collaborator.
    #[must_use]
    pub const fn store(&self) -> &P {
        &self.store
    }

    /// Evaluate drift as of now.
    ///
    /// # Errors
    ///
    /// See [`DriftOrchestrator::detect_at`].
    pub async fn detect(&self, request: &DriftRequest) -> Result<DriftEvaluation> {
        self.detect_at(request, Utc::now()).await
    }

    /// Evaluate drift as of `now`.
    ///
    /// A failed audit write does not fail the request; it is reported in
    /// [`DriftEvaluation::persistence`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a malformed request or unrepresentable windows
    /// - [`Error::DataUnavailable`] if samples or history cannot be read in time
    /// - [`Error::DimensionMismatch`] if embeddings disagree in dimension
    pub async fn detect_at(
        &self,
        request: &DriftRequest,
        now: DateTime<Utc>,
    ) -> Result<DriftEvaluation> {
        request.validate()?;
        let model_id = request.model_id;
        let (recent_window, baseline_window) =
            TimeWindow::split(now, request.window_minutes, request.baseline_minutes)?;

        let samples = self
            .fetch(model_id, &recent_window, &baseline_window)
            .await?;

        if samples.recent.len() < self.config.min_samples {
            debug!(
                model_id,
                recent_samples = samples.recent.len(),
                min_required = self.config.min_samples,
                "Insufficient recent samples for drift detection"
            );
            return Ok(self.insufficient(&samples, &recent_window));
        }

        let substituted = samples.baseline.len() < self.config.min_samples;
        let (baseline, baseline_embeddings) = if substituted {
            debug!(
                model_id,
                baseline_samples = samples.baseline.len(),
                "Insufficient baseline; comparing recent window against itself"
            );
            (&samples.recent, &samples.recent_embeddings)
        } else {
            (&samples.baseline, &samples.baseline_embeddings)
        };

        let metrics = compute_metrics(
            &self.config,
            baseline,
            &samples.recent,
            baseline_embeddings,
            &samples.recent_embeddings,
        )?;

        let history = self.history(model_id).await?;
        let derived = derive_thresholds(&history, &ThresholdPolicy::from(&self.config));
        let thresholds = derived.thresholds();
        let signals = thresholds.evaluate(&metrics);

        let run = DriftRun::builder(model_id, metrics)
            .thresholds(thresholds)
            .counts(samples.recent.len(), baseline.len())
            .baseline_substituted(substituted)
            .window(recent_window.start, recent_window.end)
            .created_at(now)
            .build();

        info!(
            model_id,
            kl = metrics.kl_divergence,
            cosine = metrics.cosine_similarity,
            embedding = ?metrics.embedding_drift,
            kl_threshold = thresholds.kl,
            cosine_threshold = thresholds.cosine,
            embedding_threshold = thresholds.embedding,
            history = history.len(),
            drift_detected = signals.any(),
            "Drift evaluation complete"
        );

        let shown = metrics.rounded(RESPONSE_DECIMALS);
        let response = DriftResponse {
            kl_divergence: shown.kl_divergence,
            cosine_similarity: shown.cosine_similarity,
            embedding_drift: shown.embedding_drift,
            drift_detected: run.drift_detected(),
            window_start: recent_window.start,
            window_end: recent_window.end,
            sample_count: run.sample_count(),
            baseline_count: run.baseline_count(),
            thresholds,
        };

        let persistence = self.persist(run, derived.to_states(model_id, now)).await;

        Ok(DriftEvaluation {
            response,
            persistence,
            assessment: assess(signals),
        })
    }

    async fn fetch(
        &self,
        model_id: ModelId,
        recent: &TimeWindow,
        baseline: &TimeWindow,
    ) -> Result<WindowSamples> {
        let limit = self.config.fetch_timeout();
        let (recent_values, baseline_values, recent_embeddings, baseline_embeddings) = tokio::try_join!(
            bounded("recent confidence fetch", limit, self.source.confidences(model_id, recent)),
            bounded("baseline confidence fetch", limit, self.source.confidences(model_id, baseline)),
            bounded("recent embedding fetch", limit, self.source.embeddings(model_id, recent)),
            bounded("baseline embedding fetch", limit, self.source.embeddings(model_id, baseline)),
        )
        .map_err(unavailable)?;

        Ok(WindowSamples {
            recent: recent_values,
            baseline: baseline_values,
            recent_embeddings,
            baseline_embeddings,
        })
    }

    async fn history(&self, model_id: ModelId) -> Result<Vec<DriftMetricSet>> {
        let query = HistoryQuery::new(model_id, self.config.history_window)
            .include_substituted_baseline(self.config.history_includes_substituted_baseline);

        bounded(
            "eligible history read",
            self.config.persist_timeout(),
            self.store.eligible_history(&query),
        )
        .await
        .map_err(|e| Error::DataUnavailable(format!("eligible history: {e}")))
    }

    async fn persist(&self, run: DriftRun, states: Vec<ThresholdState>) -> Persistence {
        let run_id = run.run_id().to_string();
        let model_id = run.model_id();

        match bounded("audit write", self.config.persist_timeout(), self.store.record(run, states))
            .await
        {
            Ok(()) => Persistence::Recorded { run_id },
            Err(e) => {
                let failure = match e {
                    Error::PersistenceFailure(_) => e,
                    other => Error::PersistenceFailure(other.to_string()),
                };
                warn!(
                    model_id,
                    run_id = %run_id,
                    error = %failure,
                    "Failed to persist drift run"
                );
                Persistence::Failed {
                    reason: failure.to_string(),
                }
            }
        }
    }

    fn insufficient(&self, samples: &WindowSamples, recent_window: &TimeWindow) -> DriftEvaluation {
        let identical = DriftMetricSet::identical();
        DriftEvaluation {
            response: DriftResponse {
                kl_divergence: identical.kl_divergence,
                cosine_similarity: identical.cosine_similarity,
                embedding_drift: identical.embedding_drift,
                drift_detected: false,
                window_start: recent_window.start,
                window_end: recent_window.end,
                sample_count: samples.recent.len(),
                baseline_count: samples.baseline.len(),
                thresholds: self.config.base_thresholds,
            },
            persistence: Persistence::Skipped,
            assessment: assess(DriftSignals::default()),
        }
    }
}
