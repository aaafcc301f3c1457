//! In-memory drift store using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.
//! Durable deployments implement [`DriftStore`] over a database table with
//! an index on `(model_id, drift_detected, created_at DESC)`.

use dashmap::DashMap;

use super::{DriftStore, HistoryQuery, ModelSummary};
use crate::record::{DriftMetricSet, DriftRun, MetricName, ModelId, ThresholdState};
use crate::Result;

/// In-memory drift store using lock-free concurrent hashmaps.
///
/// ## Consistency
///
/// `record` holds the model's run-log shard while it appends the run and
/// writes the threshold log and snapshots, so a concurrent
/// `eligible_history` for the same model sees either all of an evaluation
/// or none of it. Locks are always taken in the order runs → log →
/// snapshots.
#[derive(Debug, Default)]
pub struct MemoryDriftStore {
    runs: DashMap<ModelId, Vec<DriftRun>>,
    threshold_log: DashMap<ModelId, Vec<ThresholdState>>,
    current: DashMap<(ModelId, MetricName), ThresholdState>,
}

impl MemoryDriftStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Total number of runs across all models.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.iter().map(|entry| entry.value().len()).sum()
    }

    /// All runs recorded for a model, oldest first.
    #[must_use]
    pub fn runs(&self, model_id: ModelId) -> Vec<DriftRun> {
        self.runs
            .get(&model_id)
            .map_or_else(Vec::new, |runs| runs.value().clone())
    }

    /// Clear all runs and thresholds.
    pub fn clear(&self) {
        self.runs.clear();
        self.threshold_log.clear();
        self.current.clear();
    }
}

impl DriftStore for MemoryDriftStore {
    async fn record(&self, run: DriftRun, thresholds: Vec<ThresholdState>) -> Result<()> {
        let model_id = run.model_id();
        let mut runs = self.runs.entry(model_id).or_default();
        runs.push(run);

        if !thresholds.is_empty() {
            let mut log = self.threshold_log.entry(model_id).or_default();
            for state in thresholds {
                log.push(state.clone());
                self.current.insert((state.model_id(), state.metric()), state);
            }
        }

        drop(runs);
        Ok(())
    }

    async fn eligible_history(&self, query: &HistoryQuery) -> Result<Vec<DriftMetricSet>> {
        Ok(self.runs.get(&query.model_id).map_or_else(Vec::new, |runs| {
            runs.iter()
                .rev()
                .filter(|run| run.is_eligible(query.include_substituted_baseline))
                .take(query.limit)
                .map(|run| *run.metrics())
                .collect()
        }))
    }

    async fn current_thresholds(&self, model_id: ModelId) -> Result<Vec<ThresholdState>> {
        Ok(MetricName::ALL
            .iter()
            .filter_map(|metric| {
                self.current
                    .get(&(model_id, *metric))
                    .map(|state| state.value().clone())
            })
            .collect())
    }

    async fn threshold_log(&self, model_id: ModelId) -> Result<Vec<ThresholdState>> {
        Ok(self
            .threshold_log
            .get(&model_id)
            .map_or_else(Vec::new, |log| log.value().clone()))
    }

    async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        let mut models: Vec<ModelSummary> = self
            .runs
            .iter()
            .filter_map(|entry| {
                let last = entry.value().iter().map(DriftRun::created_at).max()?;
                Some(ModelSummary {
                    model_id: *entry.key(),
                    run_count: entry.value().len(),
                    last_updated: last,
                })
            })
            .collect();

        models.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::{DerivedThresholds, Thresholds};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn quiet_run(model_id: ModelId, kl: f64) -> DriftRun {
        DriftRun::builder(model_id, DriftMetricSet::new(kl, 0.99, None)).build()
    }

    #[tokio::test]
    async fn test_history_most_recent_first() {
        let store = MemoryDriftStore::new();
        for i in 0..5 {
            store.record(quiet_run(1, f64::from(i) * 0.01), Vec::new()).await.unwrap();
        }

        let history = store.eligible_history(&HistoryQuery::new(1, 3)).await.unwrap();
        let kls: Vec<f64> = history.iter().map(|m| m.kl_divergence).collect();
        assert_eq!(kls.len(), 3);
        assert!((kls[0] - 0.04).abs() < 1e-12);
        assert!((kls[2] - 0.02).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_drifted_runs_not_eligible() {
        let store = MemoryDriftStore::new();
        store.record(quiet_run(1, 0.01), Vec::new()).await.unwrap();
        store.record(quiet_run(1, 5.0), Vec::new()).await.unwrap();

        let history = store.eligible_history(&HistoryQuery::new(1, 100)).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(store.run_count(), 2);
    }

    #[tokio::test]
    async fn test_substituted_baseline_filter() {
        let store = MemoryDriftStore::new();
        let run = DriftRun::builder(1, DriftMetricSet::identical())
            .baseline_substituted(true)
            .build();
        store.record(run, Vec::new()).await.unwrap();

        let excluded = store.eligible_history(&HistoryQuery::new(1, 10)).await.unwrap();
        assert!(excluded.is_empty());

        let query = HistoryQuery::new(1, 10).include_substituted_baseline(true);
        assert_eq!(store.eligible_history(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_threshold_upsert_and_log() {
        let store = MemoryDriftStore::new();
        let states = DerivedThresholds::cold_start(Thresholds::BASE).to_states(4, Utc::now());

        store.record(quiet_run(4, 0.0), states.clone()).await.unwrap();
        store.record(quiet_run(4, 0.0), states).await.unwrap();

        assert_eq!(store.current_thresholds(4).await.unwrap().len(), 3);
        assert_eq!(store.threshold_log(4).await.unwrap().len(), 6);
        assert!(store.current_thresholds(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_models_ordering() {
        let store = MemoryDriftStore::new();
        let now = Utc::now();
        let old = DriftRun::builder(1, DriftMetricSet::identical())
            .created_at(now - Duration::hours(1))
            .build();
        let new = DriftRun::builder(2, DriftMetricSet::identical()).created_at(now).build();
        store.record(old, Vec::new()).await.unwrap();
        store.record(new, Vec::new()).await.unwrap();

        let models = store.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].model_id, 2);
        assert_eq!(models[1].run_count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_record() {
        let store = Arc::new(MemoryDriftStore::new());
        let mut handles = vec![];

        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record(quiet_run(i % 5, 0.01), Vec::new()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.run_count(), 50);
        assert_eq!(store.runs(0).len(), 10);
    }
}
