//! # Trueno-Drift: Adaptive Drift Detection for Model Outputs
//!
//! **Version**: 0.1.0
//!
//! Trueno-Drift compares a recent window of a model's production confidence
//! scores (and, optionally, embeddings) against a historical baseline and
//! decides whether the difference is anomalous. Decision thresholds adapt
//! to the model's own recent non-drifted history while never crossing fixed
//! safety bounds.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: Only non-drifted runs calibrate thresholds; anomalies never
//!   teach the detector that they are normal
//! - **Poka-Yoke safety**: Smoothed histograms keep KL finite; base
//!   thresholds floor (KL, embedding) and cap (cosine) adaptation
//! - **Genchi Genbutsu**: Every decision is persisted with the statistics
//!   that produced its thresholds
//! - **Heijunka**: Every collaborator call is time-bounded
//!
//! ## Pipeline
//!
//! ```text
//! SampleSource ─► Distribution ─► KL / cosine / embedding ─► thresholds ─► decision ─► DriftStore
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::{Duration, Utc};
//! use trueno_drift::orchestrator::{DriftOrchestrator, DriftRequest};
//! use trueno_drift::source::{InferenceEvent, MemorySampleSource};
//! use trueno_drift::store::MemoryDriftStore;
//! use trueno_drift::DriftConfig;
//!
//! # async fn example() -> trueno_drift::Result<()> {
//! let source = MemorySampleSource::new();
//! let now = Utc::now();
//! for i in 0..20 {
//!     source.record(InferenceEvent::new(1, now - Duration::minutes(i)).confidence(0.9));
//!     source.record(InferenceEvent::new(1, now - Duration::hours(3 + i)).confidence(0.2));
//! }
//!
//! let orchestrator = DriftOrchestrator::new(DriftConfig::from_env()?, source, MemoryDriftStore::new())?;
//! let evaluation = orchestrator.detect(&DriftRequest::new(1)).await?;
//! assert!(evaluation.response.drift_detected);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod audit;
pub mod config;
pub mod distribution;
pub mod divergence;
pub mod error;
pub mod orchestrator;
pub mod record;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod threshold;

pub use config::{DriftConfig, DriftConfigBuilder};
pub use error::{Error, Result};
pub use orchestrator::{DriftEvaluation, DriftOrchestrator, DriftRequest, DriftResponse};
pub use threshold::Thresholds;
