//! Drift Store - persistence collaborator
//!
//! Eligible history is a bounded, most-recent-N query over an append-only
//! log of [`DriftRun`]s, not an in-process accumulator: any instance sharing
//! the store sees the same history, and it survives restarts of the engine.
//!
//! # Example
//!
//! ```rust,no_run
//! use trueno_drift::record::{DriftMetricSet, DriftRun};
//! use trueno_drift::store::{DriftStore, HistoryQuery, MemoryDriftStore};
//!
//! # async fn example() -> trueno_drift::Result<()> {
//! let store = MemoryDriftStore::new();
//!
//! let run = DriftRun::builder(1, DriftMetricSet::new(0.02, 0.97, None)).build();
//! store.record(run, Vec::new()).await?;
//!
//! let history = store.eligible_history(&HistoryQuery::new(1, 100)).await?;
//! assert_eq!(history.len(), 1);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryDriftStore;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{DriftMetricSet, DriftRun, ModelId, ThresholdState};
use crate::Result;

/// Query for the most recent eligible (non-drifted) runs of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Model whose history is requested
    pub model_id: ModelId,
    /// Maximum number of rows returned
    pub limit: usize,
    /// Include runs whose baseline was substituted by the recent sample
    pub include_substituted_baseline: bool,
}

impl HistoryQuery {
    /// Query excluding substituted-baseline runs.
    #[must_use]
    pub const fn new(model_id: ModelId, limit: usize) -> Self {
        Self {
            model_id,
            limit,
            include_substituted_baseline: false,
        }
    }

    /// Set whether substituted-baseline runs are eligible.
    #[must_use]
    pub const fn include_substituted_baseline(mut self, include: bool) -> Self {
        self.include_substituted_baseline = include;
        self
    }
}

/// Per-model summary for audit listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model identifier
    pub model_id: ModelId,
    /// Number of recorded runs
    pub run_count: usize,
    /// Creation time of the latest run
    pub last_updated: DateTime<Utc>,
}

/// Persistence collaborator trait.
///
/// `record` is atomic: the run and its threshold snapshots become visible
/// together or not at all. The history read that precedes it is a separate
/// call, so two evaluations of the same model may interleave; each derives
/// its thresholds from the history committed before its own read.
pub trait DriftStore: Send + Sync {
    /// Append a run and upsert its threshold snapshots.
    ///
    /// Threshold snapshots are last-writer-wins per `(model_id, metric)`
    /// and are also appended to the threshold audit log.
    fn record(
        &self,
        run: DriftRun,
        thresholds: Vec<ThresholdState>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Metrics of the most recent eligible runs, most recent first.
    fn eligible_history(
        &self,
        query: &HistoryQuery,
    ) -> impl Future<Output = Result<Vec<DriftMetricSet>>> + Send;

    /// Current threshold snapshot for each metric of a model.
    fn current_thresholds(
        &self,
        model_id: ModelId,
    ) -> impl Future<Output = Result<Vec<ThresholdState>>> + Send;

    /// Every threshold snapshot ever recorded for a model, oldest first.
    fn threshold_log(
        &self,
        model_id: ModelId,
    ) -> impl Future<Output = Result<Vec<ThresholdState>>> + Send;

    /// Models with recorded runs, most recently updated first.
    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelSummary>>> + Send;
}
