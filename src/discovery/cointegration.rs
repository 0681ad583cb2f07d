//! Cointegration testing for candidate pairs
//!
//! # Algorithm
//! 1. Inner-join the two series on timestamp
//! 2. Fit B = α + β·A by least squares and keep β only
//! 3. Form the raw spread B - β·A (no intercept correction; the rolling
//!    z-score re-centres it)
//! 4. Run the stationarity test on the spread
//! 5. Accept when the p-value is strictly below the threshold, attaching the
//!    rolling z-score series

use super::config::DiscoveryConfig;
use super::error::DiscoveryError;
use crate::math::{ols, rolling_zscore, MathError, StationarityTest};
use crate::recording::RankingRecord;
use crate::types::{InstrumentSeries, PairId, SpreadPoint, SpreadSeries};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Two legs on their shared timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPair {
    pub times: Vec<DateTime<Utc>>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Inner join of two time-sorted series.
pub fn align(a: &InstrumentSeries, b: &InstrumentSeries) -> AlignedPair {
    let mut aligned = AlignedPair::default();
    let (mut i, mut j) = (0, 0);
    while i < a.points.len() && j < b.points.len() {
        let (pa, pb) = (&a.points[i], &b.points[j]);
        match pa.time.cmp(&pb.time) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                aligned.times.push(pa.time);
                aligned.a.push(pa.close);
                aligned.b.push(pb.close);
                i += 1;
                j += 1;
            }
        }
    }
    aligned
}

/// An accepted pair with its hedge ratio and spread table
#[derive(Debug, Clone, PartialEq)]
pub struct CointegratedPair {
    pub pair: PairId,
    /// Slope of B on A
    pub beta: f64,
    pub p_value: f64,
    /// Spread B - β·A with its rolling z-score, on the aligned index
    pub spread: SpreadSeries,
}

impl CointegratedPair {
    pub fn ranking_record(&self) -> RankingRecord {
        RankingRecord {
            pair: self.pair.to_string(),
            adf_pvalue: self.p_value,
        }
    }
}

/// Result of testing one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum PairOutcome {
    Accepted(CointegratedPair),
    /// Spread not stationary enough
    Rejected { beta: f64, p_value: f64 },
}

/// Tests candidate pairs with a pluggable stationarity test.
#[derive(Clone)]
pub struct CointegrationTester {
    test: Arc<dyn StationarityTest>,
    p_value_threshold: f64,
    min_observations: usize,
    zscore_lookback: usize,
}

impl CointegrationTester {
    pub fn new(
        test: Arc<dyn StationarityTest>,
        p_value_threshold: f64,
        min_observations: usize,
        zscore_lookback: usize,
    ) -> Self {
        Self {
            test,
            p_value_threshold,
            min_observations,
            zscore_lookback,
        }
    }

    pub fn from_config(test: Arc<dyn StationarityTest>, config: &DiscoveryConfig) -> Self {
        Self::new(
            test,
            config.adf_pvalue_threshold,
            config.min_aligned_observations(),
            config.zscore_lookback,
        )
    }

    /// Align, fit, test and (on acceptance) attach z-scores.
    pub fn test(
        &self,
        pair: &PairId,
        a: &InstrumentSeries,
        b: &InstrumentSeries,
    ) -> Result<PairOutcome, DiscoveryError> {
        let aligned = align(a, b);
        if aligned.len() < self.min_observations.max(2) {
            return Err(DiscoveryError::InsufficientData {
                expected: self.min_observations.max(2),
                actual: aligned.len(),
            });
        }

        let beta = ols::slope(&aligned.a, &aligned.b)?;
        let spread: Vec<f64> = aligned
            .a
            .iter()
            .zip(&aligned.b)
            .map(|(x, y)| y - beta * x)
            .collect();

        let p_value = self.test.p_value(&spread)?;
        if !p_value.is_finite() {
            return Err(MathError::NonFinite("stationarity p-value").into());
        }

        if p_value >= self.p_value_threshold {
            debug!(
                pair = %pair,
                beta = format!("{:.4}", beta),
                p_value = format!("{:.4}", p_value),
                "Spread not stationary"
            );
            return Ok(PairOutcome::Rejected { beta, p_value });
        }

        let zscores = rolling_zscore(&spread, self.zscore_lookback);
        let points = aligned
            .times
            .iter()
            .zip(spread.iter().zip(zscores))
            .map(|(&time, (&spread, zscore))| SpreadPoint {
                time,
                spread,
                zscore,
            })
            .collect();

        Ok(PairOutcome::Accepted(CointegratedPair {
            pair: pair.clone(),
            beta,
            p_value,
            spread: SpreadSeries::new(points),
        }))
    }
}
