//! Time-series sources.
//!
//! The pipeline reads instrument histories through the [`TimeSeriesSource`]
//! trait so discovery can run against CSV directories in production and
//! against in-memory fixtures in tests.

pub mod csv_source;
pub mod resample;

pub use csv_source::CsvDirectorySource;
pub use resample::resample_ffill;

use crate::types::InstrumentSeries;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading instrument data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Malformed series for {instrument}: {reason}")]
    MalformedSeries { instrument: String, reason: String },

    #[error("Timestamp parse error: {0}")]
    TimestampParse(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Supplier of regularised per-instrument price series.
#[async_trait]
pub trait TimeSeriesSource: Send + Sync {
    /// Instrument identifiers in discovery order.
    async fn list_instruments(&self) -> Result<Vec<String>, DataError>;

    /// Load one instrument's series, already resampled to the bar interval.
    async fn load(&self, instrument: &str) -> Result<InstrumentSeries, DataError>;
}

/// In-memory source, mostly for tests and replay.
///
/// Listing order is insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    order: Vec<String>,
    series: HashMap<String, Result<InstrumentSeries, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series under its own identifier.
    pub fn insert(&mut self, series: InstrumentSeries) {
        let id = series.id.clone();
        if !self.series.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.series.insert(id, Ok(series));
    }

    /// Register an instrument whose load always fails with `reason`.
    pub fn insert_broken(&mut self, id: impl Into<String>, reason: impl Into<String>) {
        let id = id.into();
        if !self.series.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.series.insert(id, Err(reason.into()));
    }
}

#[async_trait]
impl TimeSeriesSource for MemorySource {
    async fn list_instruments(&self) -> Result<Vec<String>, DataError> {
        Ok(self.order.clone())
    }

    async fn load(&self, instrument: &str) -> Result<InstrumentSeries, DataError> {
        match self.series.get(instrument) {
            Some(Ok(series)) => Ok(series.clone()),
            Some(Err(reason)) => Err(DataError::MalformedSeries {
                instrument: instrument.to_string(),
                reason: reason.clone(),
            }),
            None => Err(DataError::UnknownInstrument(instrument.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source_preserves_order_and_failures() {
        let mut source = MemorySource::new();
        source.insert(InstrumentSeries::new("B", vec![]));
        source.insert_broken("A", "truncated file");

        assert_eq!(source.list_instruments().await.unwrap(), vec!["B", "A"]);
        assert!(source.load("B").await.is_ok());
        assert!(matches!(
            source.load("A").await,
            Err(DataError::MalformedSeries { .. })
        ));
        assert!(matches!(
            source.load("Z").await,
            Err(DataError::UnknownInstrument(_))
        ));
    }
}
