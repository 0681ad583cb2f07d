//! Result Recording System
//!
//! Provides pluggable sinks for pipeline artifacts:
//! - spread/z-score tables per accepted pair
//! - the pair ranking table
//! - per-pair trade ledgers and equity curves
//! - the aggregated backtest summary
//!
//! The backtest stage reads spreads and rankings back through [`SpreadSource`].

use crate::backtest::{EquityCurve, PerformanceSummary, Trade};
use crate::types::SpreadSeries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for recording operations
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Requested artifact was never recorded
    #[error("Missing artifact: {0}")]
    Missing(String),
}

/// One row of the pair ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    /// Pair identifier ("A-B")
    pub pair: String,
    pub adf_pvalue: f64,
}

/// Flat ledger row with the position as a signed integer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// +1 long spread, -1 short spread
    pub position: i8,
    pub entry_z: f64,
    pub exit_z: Option<f64>,
    pub pnl: f64,
    pub duration_h: f64,
}

impl From<&Trade> for TradeRow {
    fn from(trade: &Trade) -> Self {
        Self {
            entry_time: trade.entry_time,
            exit_time: trade.exit_time,
            position: trade.side.sign(),
            entry_z: trade.entry_z,
            exit_z: trade.exit_z,
            pnl: trade.pnl,
            duration_h: trade.duration_h,
        }
    }
}

/// Trait for persisting pipeline results
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist the spread/z-score table of an accepted pair.
    async fn record_spread(&self, pair: &str, spread: &SpreadSeries) -> Result<(), RecordError>;

    /// Persist the ranked pair table (already sorted and truncated).
    async fn record_ranking(&self, ranking: &[RankingRecord]) -> Result<(), RecordError>;

    /// Persist one pair's trade ledger and equity curve.
    async fn record_backtest(
        &self,
        pair: &str,
        trades: &[Trade],
        equity: &EquityCurve,
    ) -> Result<(), RecordError>;

    /// Persist the summary table across all processed pairs.
    async fn record_summaries(&self, summaries: &[PerformanceSummary]) -> Result<(), RecordError>;

    /// Flush any buffered records (optional, default no-op)
    async fn flush(&self) -> Result<(), RecordError> {
        Ok(())
    }
}

/// Read side used by the backtest stage
#[async_trait]
pub trait SpreadSource: Send + Sync {
    async fn load_ranking(&self) -> Result<Vec<RankingRecord>, RecordError>;

    async fn load_spread(&self, pair: &str) -> Result<SpreadSeries, RecordError>;
}

/// A sink that fans out to multiple backends.
///
/// The first backend is the system of record: its errors are returned.
/// Errors from the remaining backends are logged and dropped.
pub struct MultiSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl MultiSink {
    /// Create a new multi-sink; `sinks[0]` is the primary backend
    pub fn new(sinks: Vec<Box<dyn ResultSink>>) -> Self {
        Self { sinks }
    }

    /// Add a secondary sink
    pub fn add(&mut self, sink: Box<dyn ResultSink>) {
        self.sinks.push(sink);
    }

    fn settle(&self, results: Vec<Result<(), RecordError>>) -> Result<(), RecordError> {
        let mut primary = Ok(());
        for (index, result) in results.into_iter().enumerate() {
            if let Err(e) = result {
                tracing::error!(backend = index, error = %e, "Failed to record to backend");
                if index == 0 {
                    primary = Err(e);
                }
            }
        }
        primary
    }
}

#[async_trait]
impl ResultSink for MultiSink {
    async fn record_spread(&self, pair: &str, spread: &SpreadSeries) -> Result<(), RecordError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.record_spread(pair, spread).await);
        }
        self.settle(results)
    }

    async fn record_ranking(&self, ranking: &[RankingRecord]) -> Result<(), RecordError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.record_ranking(ranking).await);
        }
        self.settle(results)
    }

    async fn record_backtest(
        &self,
        pair: &str,
        trades: &[Trade],
        equity: &EquityCurve,
    ) -> Result<(), RecordError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.record_backtest(pair, trades, equity).await);
        }
        self.settle(results)
    }

    async fn record_summaries(&self, summaries: &[PerformanceSummary]) -> Result<(), RecordError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.record_summaries(summaries).await);
        }
        self.settle(results)
    }

    async fn flush(&self) -> Result<(), RecordError> {
        let mut results = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            results.push(sink.flush().await);
        }
        self.settle(results)
    }
}
