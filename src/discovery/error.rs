//! Error types for the discovery module

use crate::data::DataError;
use crate::math::MathError;
use crate::recording::RecordError;
use thiserror::Error;

/// Errors that can occur during pair discovery
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Insufficient historical data for analysis
    #[error("Insufficient data: expected at least {expected} data points, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Series failed a structural check (ordering, non-finite values)
    #[error("Malformed series: {0}")]
    MalformedSeries(String),

    /// Loading from the time-series source failed
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Regression or unit-root test failed
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Persisting a result failed
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Per-pair time limit exceeded
    #[error("Timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Background task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(String),
}
