//! Error types for the backtest module

use crate::recording::RecordError;
use thiserror::Error;

/// Errors that can occur while backtesting ranked pairs
#[derive(Error, Debug)]
pub enum BacktestError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Ranking or spread table could not be read or written
    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}
