//! Common Types Module
//!
//! Typed records shared by the discovery and backtest pipelines.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single regularised close price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Bar timestamp (bar label after resampling)
    pub time: DateTime<Utc>,
    /// Closing price
    pub close: f64,
}

/// Timestamp-keyed price history for one instrument.
///
/// Timestamps are strictly increasing; gaps are not imputed beyond what
/// the source already filled.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSeries {
    /// Instrument identifier (e.g. "BTCUSDT")
    pub id: String,
    /// Ordered price points
    pub points: Vec<PricePoint>,
}

impl InstrumentSeries {
    pub fn new(id: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.time)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.time)
    }

    /// Whole days between the first and last bar (floored).
    pub fn history_days(&self) -> Option<i64> {
        match (self.first_time(), self.last_time()) {
            (Some(first), Some(last)) => Some((last - first).num_days()),
            _ => None,
        }
    }

    /// Close prices in time order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Close prices of the trailing `n` bars (fewer if the series is shorter).
    pub fn tail_closes(&self, n: usize) -> Vec<f64> {
        let start = self.points.len().saturating_sub(n);
        self.points[start..].iter().map(|p| p.close).collect()
    }

    /// Check the strictly-increasing timestamp invariant.
    pub fn is_strictly_ordered(&self) -> bool {
        self.points.windows(2).all(|w| w[0].time < w[1].time)
    }
}

/// Unordered pair identity, kept in candidate-generation orientation (A, B).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId {
    /// Leg A (regressor)
    pub a: String,
    /// Leg B (regressand)
    pub b: String,
}

impl PairId {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }
}

/// Formats as "A-B".
impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// One row of a spread/z-score table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadPoint {
    pub time: DateTime<Utc>,
    pub spread: f64,
    /// Undefined during warm-up or when the rolling deviation is zero
    pub zscore: Option<f64>,
}

/// Spread and z-score series sharing one time index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadSeries {
    pub points: Vec<SpreadPoint>,
}

impl SpreadSeries {
    pub fn new(points: Vec<SpreadPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rows whose calendar date (UTC) lies within `[start, end]`, both inclusive.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> &[SpreadPoint] {
        let from = self
            .points
            .partition_point(|p| p.time.date_naive() < start);
        let to = self
            .points
            .partition_point(|p| p.time.date_naive() <= end);
        if from >= to {
            &[]
        } else {
            &self.points[from..to]
        }
    }
}
