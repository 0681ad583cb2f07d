//! Configuration for the backtest stage

use super::simulator::Thresholds;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Trading days used to annualise per-bar ratios
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Configuration for backtesting ranked pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Z-score magnitude that opens a position (must be positive)
    #[serde(default = "default_z_entry")]
    pub z_entry: f64,

    /// Z-score level that closes a position (must be < z_entry)
    #[serde(default = "default_z_exit")]
    pub z_exit: f64,

    /// First calendar day of the backtest window (inclusive, UTC)
    #[serde(default = "default_start")]
    pub start: NaiveDate,

    /// Last calendar day of the backtest window (inclusive, UTC)
    #[serde(default = "default_end")]
    pub end: NaiveDate,

    /// Bars per year for the Sharpe ratio; derived from the bar interval when unset
    #[serde(default)]
    pub annualization_factor: Option<f64>,
}

fn default_z_entry() -> f64 {
    2.0
}
fn default_z_exit() -> f64 {
    0.0
}
fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}
fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default()
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            z_entry: default_z_entry(),
            z_exit: default_z_exit(),
            start: default_start(),
            end: default_end(),
            annualization_factor: None,
        }
    }
}

impl BacktestConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            entry: self.z_entry,
            exit: self.z_exit,
        }
    }

    /// Explicit factor, or 252 trading days × bars per day.
    pub fn annualization(&self, bars_per_day: f64) -> f64 {
        self.annualization_factor
            .unwrap_or(TRADING_DAYS_PER_YEAR * bars_per_day)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.z_entry.is_finite() || self.z_entry <= 0.0 {
            return Err(format!("z_entry must be positive, got {}", self.z_entry));
        }
        if !self.z_exit.is_finite() || self.z_exit >= self.z_entry {
            return Err(format!(
                "z_exit must be below z_entry ({}), got {}",
                self.z_entry, self.z_exit
            ));
        }
        if self.start > self.end {
            return Err(format!(
                "start ({}) must not be after end ({})",
                self.start, self.end
            ));
        }
        if let Some(factor) = self.annualization_factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(format!(
                    "annualization_factor must be positive, got {}",
                    factor
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BacktestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_exit_above_entry_invalid() {
        let config = BacktestConfig {
            z_exit: 2.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reversed_window_invalid() {
        let config = BacktestConfig {
            start: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_annualization_derived_from_bars() {
        let config = BacktestConfig::default();
        assert_eq!(config.annualization(24.0), 252.0 * 24.0);
        let fixed = BacktestConfig {
            annualization_factor: Some(100.0),
            ..Default::default()
        };
        assert_eq!(fixed.annualization(24.0), 100.0);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: BacktestConfig =
            serde_json::from_str(r#"{"z_entry": 1.5, "start": "2024-02-01"}"#).unwrap();
        assert_eq!(config.z_entry, 1.5);
        assert_eq!(config.z_exit, 0.0);
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
