//! In-memory sample source using `DashMap`.
//!
//! Events are kept per model; data is lost on process restart. Production
//! deployments implement [`SampleSource`] over their inference log store.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::{SampleSource, TimeWindow, NEUTRAL_CONFIDENCE};
use crate::record::{Embedding, ModelId};
use crate::Result;

/// One logged inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceEvent {
    /// Model that served the inference
    pub model_id: ModelId,
    /// When the inference was logged
    pub created_at: DateTime<Utc>,
    /// Model confidence, if recorded
    pub confidence: Option<f64>,
    /// Representation vector, if recorded
    pub embedding: Option<Embedding>,
}

impl InferenceEvent {
    /// Event with neither confidence nor embedding.
    #[must_use]
    pub const fn new(model_id: ModelId, created_at: DateTime<Utc>) -> Self {
        Self {
            model_id,
            created_at,
            confidence: None,
            embedding: None,
        }
    }

    /// Attach a confidence value.
    #[must_use]
    pub const fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attach an embedding.
    #[must_use]
    pub fn embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// Concurrent in-memory inference log.
///
/// Thread-safe; writers for different models never contend.
#[derive(Debug, Default)]
pub struct MemorySampleSource {
    events: DashMap<ModelId, Vec<InferenceEvent>>,
}

impl MemorySampleSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event.
    pub fn record(&self, event: InferenceEvent) {
        self.events.entry(event.model_id).or_default().push(event);
    }

    /// Append many events.
    pub fn extend<I>(&self, events: I)
    where
        I: IntoIterator<Item = InferenceEvent>,
    {
        for event in events {
            self.record(event);
        }
    }

    /// Total number of events across all models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }

    /// Check if no event has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect<T, F>(&self, model_id: ModelId, window: &TimeWindow, project: F) -> Vec<T>
    where
        F: Fn(&InferenceEvent) -> Option<T>,
    {
        self.events.get(&model_id).map_or_else(Vec::new, |events| {
            events
                .iter()
                .filter(|event| window.contains(event.created_at))
                .filter_map(project)
                .collect()
        })
    }
}

impl SampleSource for MemorySampleSource {
    async fn confidences(&self, model_id: ModelId, window: &TimeWindow) -> Result<Vec<f64>> {
        Ok(self.collect(model_id, window, |event| {
            Some(event.confidence.unwrap_or(NEUTRAL_CONFIDENCE))
        }))
    }

    async fn embeddings(&self, model_id: ModelId, window: &TimeWindow) -> Result<Vec<Embedding>> {
        Ok(self.collect(model_id, window, |event| event.embedding.clone()))
    }
}
