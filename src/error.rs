//! Error types for Trueno-Drift
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Insufficient data is deliberately absent from this enum: too few samples
//! is a defined fallback state of the orchestrator, not a failure.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trueno-Drift error types
#[derive(Error, Debug)]
pub enum Error {
    /// Sample source (or history read) unreachable or timed out
    #[error("Data unavailable: {0}\nThe drift decision was not computed; retry once the data source is reachable")]
    DataUnavailable(String),

    /// Audit write failed after a decision was computed
    #[error("Persistence failure: {0}\nAdaptive thresholds will not learn from this run")]
    PersistenceFailure(String),

    /// Collaborator call exceeded its bounded timeout
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout {
        /// Name of the external operation
        operation: &'static str,
        /// Configured bound in milliseconds
        after_ms: u64,
    },

    /// Request or parameter validation failed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two vectors that must share a length do not
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Reference length
        expected: usize,
        /// Offending length
        actual: usize,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unanticipated failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from a collaborator exceeding its time bound.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
