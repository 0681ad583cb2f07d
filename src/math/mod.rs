//! Mathematical utilities for pair discovery and backtesting.
//!
//! This module provides the statistical primitives used by the pipeline:
//! sample moments, ordinary least squares, rolling z-scores and the
//! Augmented Dickey-Fuller unit-root test.

pub mod adf;
pub mod ols;
pub mod rolling;

pub use adf::{AugmentedDickeyFuller, StationarityTest};
pub use rolling::rolling_zscore;

use thiserror::Error;

/// Errors raised by numerical routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Not enough observations for the requested computation
    #[error("Insufficient observations: need at least {needed}, got {actual}")]
    InsufficientObservations { needed: usize, actual: usize },

    /// Design matrix is rank deficient
    #[error("Singular design matrix")]
    Singular,

    /// Result is NaN or infinite
    #[error("Non-finite result: {0}")]
    NonFinite(&'static str),

    /// Input slices have different lengths
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1 denominator), `None` below two points.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}
