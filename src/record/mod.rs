//! Drift Audit Schema
//!
//! Durable records produced by the orchestrator and owned by the
//! persistence collaborator.
//!
//! ## Schema Overview
//!
//! ```text
//! model_id (1) ──< DriftRun (N)        [append-only, feeds eligible history]
//!              │        └── DriftMetricSet
//!              └──< ThresholdState (3 per evaluation) [audit log + current snapshot]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use trueno_drift::record::{DriftMetricSet, DriftRun};
//! use trueno_drift::threshold::Thresholds;
//!
//! let now = Utc::now();
//! let run = DriftRun::builder(42, DriftMetricSet::new(0.02, 0.98, None))
//!     .thresholds(Thresholds::BASE)
//!     .counts(120, 900)
//!     .window(now - Duration::minutes(60), now)
//!     .build();
//!
//! assert_eq!(run.model_id(), 42);
//! assert!(!run.drift_detected());
//! ```

mod drift_run;
mod metric_set;
mod threshold_state;

pub use drift_run::{DriftRun, DriftRunBuilder};
pub use metric_set::{DriftMetricSet, MetricName};
pub use threshold_state::ThresholdState;

/// Model identifier.
pub type ModelId = i64;

/// Fixed-dimension embedding vector.
pub type Embedding = Vec<f32>;
