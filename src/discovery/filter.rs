//! Instrument-level filtering
//!
//! Drops instruments with too little history, too little recent volatility
//! or a negligible price, then optionally keeps only the most volatile
//! survivors.

use super::config::DiscoveryConfig;
use super::error::DiscoveryError;
use crate::math::{mean, sample_std};
use crate::types::InstrumentSeries;
use std::fmt;
use tracing::{debug, info};

/// Why an otherwise well-formed instrument was filtered out
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    ShortHistory { days: i64, min_days: u32 },
    LowVolatility { pct: f64, min_pct: f64 },
    LowPrice { avg: f64, min_avg: f64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ShortHistory { days, min_days } => {
                write!(f, "history {}d < {}d", days, min_days)
            }
            RejectReason::LowVolatility { pct, min_pct } => {
                write!(f, "volatility {:.3}% < {}%", pct, min_pct)
            }
            RejectReason::LowPrice { avg, min_avg } => {
                write!(f, "average price {:.4} < {}", avg, min_avg)
            }
        }
    }
}

/// Outcome of filtering one instrument
#[derive(Debug, Clone, PartialEq)]
pub enum TickerVerdict {
    /// Passed; carries the long-lookback volatility used for top-N ranking
    Accepted { long_volatility: f64 },
    Rejected(RejectReason),
}

/// Applies the history, volatility and price checks.
#[derive(Debug, Clone)]
pub struct TickerFilter {
    min_history_days: u32,
    min_volatility_pct: f64,
    min_avg_price: f64,
    recent_window_bars: usize,
    volatility_lookback_bars: usize,
    top_n: Option<usize>,
}

impl TickerFilter {
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            min_history_days: config.min_history_days,
            min_volatility_pct: config.min_volatility_pct,
            min_avg_price: config.min_avg_price,
            recent_window_bars: config.recent_window_bars(),
            volatility_lookback_bars: config.volatility_lookback_bars(),
            top_n: config
                .use_volatility_filter
                .then_some(config.volatility_top_n),
        }
    }

    /// Check one instrument.
    ///
    /// Structural problems (empty, unordered, non-finite statistics) are
    /// errors; threshold misses are a `Rejected` verdict.
    pub fn evaluate(&self, series: &InstrumentSeries) -> Result<TickerVerdict, DiscoveryError> {
        let Some(history_days) = series.history_days() else {
            return Err(DiscoveryError::MalformedSeries(format!(
                "{}: empty series",
                series.id
            )));
        };
        if !series.is_strictly_ordered() {
            return Err(DiscoveryError::MalformedSeries(format!(
                "{}: timestamps not strictly increasing",
                series.id
            )));
        }

        if history_days < i64::from(self.min_history_days) {
            return Ok(TickerVerdict::Rejected(RejectReason::ShortHistory {
                days: history_days,
                min_days: self.min_history_days,
            }));
        }

        let recent = series.tail_closes(self.recent_window_bars);
        let (Some(avg_price), Some(std)) = (mean(&recent), sample_std(&recent)) else {
            return Err(DiscoveryError::InsufficientData {
                expected: 2,
                actual: recent.len(),
            });
        };
        let volatility_pct = 100.0 * std / avg_price;
        if !volatility_pct.is_finite() && avg_price < self.min_avg_price {
            return Ok(TickerVerdict::Rejected(RejectReason::LowPrice {
                avg: avg_price,
                min_avg: self.min_avg_price,
            }));
        }
        if !volatility_pct.is_finite() {
            return Err(DiscoveryError::MalformedSeries(format!(
                "{}: non-finite volatility (mean price {})",
                series.id, avg_price
            )));
        }

        if volatility_pct < self.min_volatility_pct {
            return Ok(TickerVerdict::Rejected(RejectReason::LowVolatility {
                pct: volatility_pct,
                min_pct: self.min_volatility_pct,
            }));
        }
        if avg_price < self.min_avg_price {
            return Ok(TickerVerdict::Rejected(RejectReason::LowPrice {
                avg: avg_price,
                min_avg: self.min_avg_price,
            }));
        }

        let lookback = series.tail_closes(self.volatility_lookback_bars);
        let long_volatility = sample_std(&lookback).ok_or(DiscoveryError::InsufficientData {
            expected: 2,
            actual: lookback.len(),
        })?;

        debug!(
            instrument = %series.id,
            history_days = history_days,
            volatility_pct = format!("{:.3}", volatility_pct),
            avg_price = format!("{:.4}", avg_price),
            "Instrument passed filter"
        );

        Ok(TickerVerdict::Accepted { long_volatility })
    }

    /// Final survivor order.
    ///
    /// With the volatility cap the survivors are sorted by long-lookback
    /// volatility, descending, and truncated; equal volatilities keep their
    /// input order. Without it the input order is returned unchanged.
    pub fn select(&self, survivors: Vec<(String, f64)>) -> Vec<String> {
        let Some(top_n) = self.top_n else {
            return survivors.into_iter().map(|(id, _)| id).collect();
        };

        let mut ranked = survivors;
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_n);

        info!(
            kept = ranked.len(),
            top_n = top_n,
            "Applied volatility filter"
        );

        ranked.into_iter().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricePoint;
    use chrono::{Duration, TimeZone, Utc};

    fn series(id: &str, closes: &[f64]) -> InstrumentSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InstrumentSeries::new(
            id,
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    time: start + Duration::hours(i as i64),
                    close,
                })
                .collect(),
        )
    }

    fn filter(top_n: Option<usize>) -> TickerFilter {
        TickerFilter {
            min_history_days: 2,
            min_volatility_pct: 1.0,
            min_avg_price: 0.05,
            recent_window_bars: 48,
            volatility_lookback_bars: 24,
            top_n,
        }
    }

    fn oscillating(base: f64, amplitude: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| base + amplitude * (i as f64 / 5.0).sin())
            .collect()
    }

    #[test]
    fn test_short_history_rejected() {
        let verdict = filter(None)
            .evaluate(&series("X", &oscillating(100.0, 10.0, 40)))
            .unwrap();
        assert!(matches!(
            verdict,
            TickerVerdict::Rejected(RejectReason::ShortHistory { days: 1, .. })
        ));
    }

    #[test]
    fn test_low_volatility_rejected() {
        let verdict = filter(None)
            .evaluate(&series("X", &oscillating(100.0, 0.01, 100)))
            .unwrap();
        assert!(matches!(
            verdict,
            TickerVerdict::Rejected(RejectReason::LowVolatility { .. })
        ));
    }

    #[test]
    fn test_low_price_rejected() {
        let verdict = filter(None)
            .evaluate(&series("X", &oscillating(0.01, 0.005, 100)))
            .unwrap();
        assert!(matches!(
            verdict,
            TickerVerdict::Rejected(RejectReason::LowPrice { .. })
        ));
    }

    #[test]
    fn test_zero_price_window_is_price_floor_miss() {
        let verdict = filter(None).evaluate(&series("X", &[0.0; 100])).unwrap();
        assert!(matches!(
            verdict,
            TickerVerdict::Rejected(RejectReason::LowPrice { .. })
        ));
    }

    #[test]
    fn test_accepted_reports_long_volatility() {
        let verdict = filter(None)
            .evaluate(&series("X", &oscillating(100.0, 10.0, 100)))
            .unwrap();
        match verdict {
            TickerVerdict::Accepted { long_volatility } => assert!(long_volatility > 0.0),
            other => panic!("expected acceptance, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_series_is_error() {
        assert!(filter(None).evaluate(&series("X", &[])).is_err());
    }

    #[test]
    fn test_select_orders_by_volatility_with_stable_ties() {
        let survivors = vec![
            ("A".to_string(), 1.0),
            ("B".to_string(), 3.0),
            ("C".to_string(), 1.0),
            ("D".to_string(), 2.0),
        ];
        assert_eq!(filter(Some(3)).select(survivors.clone()), vec!["B", "D", "A"]);
        assert_eq!(filter(None).select(survivors), vec!["A", "B", "C", "D"]);
    }
}
