//! Error types for trueno-metrics
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-metrics error types
#[derive(Error, Debug)]
pub enum Error {
    /// Run (or run/key pair) unknown to the store
    #[error("Run not found: {0}\nRegister the run before recording or querying its metrics")]
    NotFound(String),

    /// Sample rejected at the boundary before entering history
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Persistence collaborator rejected a durable append or read
    #[error("Metric sink error: {0}\nNo in-memory state was modified")]
    Sink(String),

    /// Storage error (Parquet/Arrow snapshots)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow/Parquet error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Wire record (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error reports an unknown run.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error reports a rejected sample.
    #[must_use]
    pub const fn is_invalid_value(&self) -> bool {
        matches!(self, Self::InvalidValue(_))
    }
}
