//! Configuration for pair discovery

use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 1440;

/// Configuration for the discovery pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Minimum span between first and last bar, in days
    #[serde(default = "default_min_history_days")]
    pub min_history_days: u32,

    /// Minimum recent-window volatility (std / mean × 100)
    #[serde(default = "default_min_volatility_pct")]
    pub min_volatility_pct: f64,

    /// Minimum recent-window mean price
    #[serde(default = "default_min_avg_price")]
    pub min_avg_price: f64,

    /// Recent window used by the volatility and price checks, in days
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,

    /// Minimum absolute Pearson correlation (0.0-1.0)
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,

    /// Keep only the most volatile survivors
    #[serde(default = "default_use_volatility_filter")]
    pub use_volatility_filter: bool,

    /// Lookback for the volatility ranking, in days
    #[serde(default = "default_volatility_lookback_days")]
    pub volatility_lookback_days: u32,

    /// Survivors kept by the volatility ranking
    #[serde(default = "default_volatility_top_n")]
    pub volatility_top_n: usize,

    /// A pair is accepted when the unit-root p-value is strictly below this
    #[serde(default = "default_adf_pvalue_threshold")]
    pub adf_pvalue_threshold: f64,

    /// Maximum number of ranked pairs to keep
    #[serde(default = "default_top_n_pairs")]
    pub top_n_pairs: usize,

    /// Bar interval the source resamples to, in minutes
    #[serde(default = "default_bar_interval_minutes")]
    pub bar_interval_minutes: u32,

    /// Rolling window for spread z-scores, in bars
    #[serde(default = "default_zscore_lookback")]
    pub zscore_lookback: usize,

    /// Concurrent instrument loads / pair tests
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-pair time limit; a timeout skips the pair
    #[serde(default)]
    pub pair_timeout_secs: Option<u64>,
}

// Default value functions for serde
fn default_min_history_days() -> u32 {
    30
}
fn default_min_volatility_pct() -> f64 {
    1.0
}
fn default_min_avg_price() -> f64 {
    0.05
}
fn default_recent_window_days() -> u32 {
    60
}
fn default_correlation_threshold() -> f64 {
    0.8
}
fn default_use_volatility_filter() -> bool {
    true
}
fn default_volatility_lookback_days() -> u32 {
    30
}
fn default_volatility_top_n() -> usize {
    50
}
fn default_adf_pvalue_threshold() -> f64 {
    0.05
}
fn default_top_n_pairs() -> usize {
    50
}
fn default_bar_interval_minutes() -> u32 {
    60
}
fn default_zscore_lookback() -> usize {
    60
}
fn default_workers() -> usize {
    8
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_history_days: default_min_history_days(),
            min_volatility_pct: default_min_volatility_pct(),
            min_avg_price: default_min_avg_price(),
            recent_window_days: default_recent_window_days(),
            correlation_threshold: default_correlation_threshold(),
            use_volatility_filter: default_use_volatility_filter(),
            volatility_lookback_days: default_volatility_lookback_days(),
            volatility_top_n: default_volatility_top_n(),
            adf_pvalue_threshold: default_adf_pvalue_threshold(),
            top_n_pairs: default_top_n_pairs(),
            bar_interval_minutes: default_bar_interval_minutes(),
            zscore_lookback: default_zscore_lookback(),
            workers: default_workers(),
            pair_timeout_secs: None,
        }
    }
}

impl DiscoveryConfig {
    /// Bars in one day at the configured interval
    pub fn bars_per_day(&self) -> usize {
        (MINUTES_PER_DAY / self.bar_interval_minutes.max(1)) as usize
    }

    pub fn recent_window_bars(&self) -> usize {
        self.recent_window_days as usize * self.bars_per_day()
    }

    pub fn volatility_lookback_bars(&self) -> usize {
        self.volatility_lookback_days as usize * self.bars_per_day()
    }

    /// Aligned observations a pair needs before it is tested
    pub fn min_aligned_observations(&self) -> usize {
        self.min_history_days as usize * self.bars_per_day()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(format!(
                "correlation_threshold must be between 0.0 and 1.0, got {}",
                self.correlation_threshold
            ));
        }
        if !(self.adf_pvalue_threshold > 0.0 && self.adf_pvalue_threshold <= 1.0) {
            return Err(format!(
                "adf_pvalue_threshold must be in (0.0, 1.0], got {}",
                self.adf_pvalue_threshold
            ));
        }
        if self.bar_interval_minutes == 0 || self.bar_interval_minutes > MINUTES_PER_DAY {
            return Err(format!(
                "bar_interval_minutes must be between 1 and {}, got {}",
                MINUTES_PER_DAY, self.bar_interval_minutes
            ));
        }
        if self.recent_window_days == 0 {
            return Err("recent_window_days must be at least 1".to_string());
        }
        if self.use_volatility_filter && self.volatility_lookback_days == 0 {
            return Err("volatility_lookback_days must be at least 1".to_string());
        }
        if self.zscore_lookback < 2 {
            return Err(format!(
                "zscore_lookback must be at least 2, got {}",
                self.zscore_lookback
            ));
        }
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if !self.min_volatility_pct.is_finite() || !self.min_avg_price.is_finite() {
            return Err("volatility and price floors must be finite".to_string());
        }
        if self.pair_timeout_secs == Some(0) {
            return Err("pair_timeout_secs must be positive when set".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DiscoveryConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_bar_counts() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.bars_per_day(), 24);
        assert_eq!(config.recent_window_bars(), 60 * 24);
        assert_eq!(config.volatility_lookback_bars(), 30 * 24);
        assert_eq!(config.min_aligned_observations(), 30 * 24);

        let quarter_hour = DiscoveryConfig {
            bar_interval_minutes: 15,
            ..Default::default()
        };
        assert_eq!(quarter_hour.bars_per_day(), 96);
    }

    #[test]
    fn test_invalid_correlation() {
        let config = DiscoveryConfig {
            correlation_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_invalid() {
        let config = DiscoveryConfig {
            bar_interval_minutes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_workers_invalid() {
        let config = DiscoveryConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: DiscoveryConfig =
            serde_json::from_str(r#"{"top_n_pairs": 5, "pair_timeout_secs": 30}"#).unwrap();
        assert_eq!(config.top_n_pairs, 5);
        assert_eq!(config.pair_timeout_secs, Some(30));
        assert_eq!(config.correlation_threshold, 0.8);
    }
}
