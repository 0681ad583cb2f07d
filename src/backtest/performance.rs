//! Summary statistics for a simulated ledger.

use super::simulator::{EquityCurve, Trade};
use crate::math::{mean, sample_std};
use serde::{Deserialize, Serialize};

/// Read-only performance summary for one pair.
///
/// `total_pnl` is NaN when no trade closed; an empty backtest window yields
/// NaN in every numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub pair: String,
    pub total_pnl: f64,
    pub sharpe: f64,
    pub max_dd: f64,
    pub num_trades: usize,
    pub win_rate: f64,
    pub avg_duration_h: f64,
}

impl PerformanceSummary {
    /// Summary for a pair whose backtest window contained no bars.
    pub fn empty(pair: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            total_pnl: f64::NAN,
            sharpe: f64::NAN,
            max_dd: f64::NAN,
            num_trades: 0,
            win_rate: f64::NAN,
            avg_duration_h: f64::NAN,
        }
    }
}

/// Reduces a ledger and equity curve to a [`PerformanceSummary`].
#[derive(Debug, Clone, Copy)]
pub struct PerformanceAnalyzer {
    annualization_factor: f64,
}

impl PerformanceAnalyzer {
    /// `annualization_factor` is the number of bars per year (e.g. 252 × 24 for hourly).
    pub fn new(annualization_factor: f64) -> Self {
        Self {
            annualization_factor,
        }
    }

    pub fn analyze(&self, pair: &str, trades: &[Trade], equity: &EquityCurve) -> PerformanceSummary {
        let values = equity.values();

        let total_pnl = if trades.is_empty() {
            f64::NAN
        } else {
            values.last().copied().unwrap_or(f64::NAN)
        };

        let win_rate = if trades.is_empty() {
            0.0
        } else {
            trades.iter().filter(|t| t.pnl > 0.0).count() as f64 / trades.len() as f64
        };

        let durations: Vec<f64> = trades.iter().map(|t| t.duration_h).collect();

        PerformanceSummary {
            pair: pair.to_string(),
            total_pnl,
            sharpe: self.sharpe_ratio(&values),
            max_dd: max_drawdown(&values),
            num_trades: trades.len(),
            win_rate,
            avg_duration_h: mean(&durations).unwrap_or(0.0),
        }
    }

    /// Annualised mean/std of equity deltas; 0 with fewer than two deltas or zero deviation.
    pub fn sharpe_ratio(&self, equity: &[f64]) -> f64 {
        let deltas: Vec<f64> = equity.windows(2).map(|w| w[1] - w[0]).collect();
        let (Some(m), Some(std)) = (mean(&deltas), sample_std(&deltas)) else {
            return 0.0;
        };
        if std == 0.0 || !std.is_finite() {
            return 0.0;
        }
        m / std * self.annualization_factor.sqrt()
    }
}

/// Largest fall from a running peak; 0 for an empty curve.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &value in equity {
        peak = peak.max(value);
        worst = worst.max(peak - value);
    }
    worst
}
