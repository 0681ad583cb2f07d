//! Flag groups that override fields of [`AppConfig`].
//!
//! Every flag is optional; unset flags leave the file/default value alone.

use crate::config::AppConfig;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

/// Filesystem locations
#[derive(Args, Debug, Clone, Default)]
pub struct PathOverrides {
    /// Directory of per-instrument price CSVs
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Output directory for spreads, rankings and backtest logs
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

impl PathOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
    }
}

/// Discovery thresholds
#[derive(Args, Debug, Clone, Default)]
pub struct DiscoveryOverrides {
    /// Minimum correlation for a candidate pair
    #[arg(long)]
    pub correlation_threshold: Option<f64>,
    /// Maximum ADF p-value for acceptance
    #[arg(long)]
    pub adf_pvalue_threshold: Option<f64>,
    /// Number of ranked pairs to keep
    #[arg(long)]
    pub top_n_pairs: Option<usize>,
    /// Keep only the N most volatile instruments
    #[arg(long)]
    pub volatility_top_n: Option<usize>,
    /// Skip the volatility cap
    #[arg(long, default_value_t = false)]
    pub no_volatility_filter: bool,
    /// Bar interval in minutes
    #[arg(long)]
    pub bar_interval_minutes: Option<u32>,
    /// Concurrent instrument/pair tasks
    #[arg(long)]
    pub workers: Option<usize>,
    /// Per-pair time limit in seconds
    #[arg(long)]
    pub pair_timeout_secs: Option<u64>,
}

impl DiscoveryOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        let d = &mut config.discovery;
        if let Some(v) = self.correlation_threshold {
            d.correlation_threshold = v;
        }
        if let Some(v) = self.adf_pvalue_threshold {
            d.adf_pvalue_threshold = v;
        }
        if let Some(v) = self.top_n_pairs {
            d.top_n_pairs = v;
        }
        if let Some(v) = self.volatility_top_n {
            d.volatility_top_n = v;
        }
        if self.no_volatility_filter {
            d.use_volatility_filter = false;
        }
        if let Some(v) = self.bar_interval_minutes {
            d.bar_interval_minutes = v;
        }
        if let Some(v) = self.workers {
            d.workers = v;
        }
        if self.pair_timeout_secs.is_some() {
            d.pair_timeout_secs = self.pair_timeout_secs;
        }
    }
}

/// Backtest thresholds and window
#[derive(Args, Debug, Clone, Default)]
pub struct BacktestOverrides {
    /// |z| at which a position opens
    #[arg(long)]
    pub z_entry: Option<f64>,
    /// z level at which a position closes
    #[arg(long, allow_hyphen_values = true)]
    pub z_exit: Option<f64>,
    /// First day of the backtest window (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last day of the backtest window, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Bars per year for the Sharpe ratio
    #[arg(long)]
    pub annualization_factor: Option<f64>,
}

impl BacktestOverrides {
    pub fn apply(&self, config: &mut AppConfig) {
        let b = &mut config.backtest;
        if let Some(v) = self.z_entry {
            b.z_entry = v;
        }
        if let Some(v) = self.z_exit {
            b.z_exit = v;
        }
        if let Some(v) = self.start {
            b.start = v;
        }
        if let Some(v) = self.end {
            b.end = v;
        }
        if self.annualization_factor.is_some() {
            b.annualization_factor = self.annualization_factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_flags_keep_config() {
        let mut config = AppConfig::default();
        config.discovery.top_n_pairs = 7;
        DiscoveryOverrides::default().apply(&mut config);
        BacktestOverrides::default().apply(&mut config);
        PathOverrides::default().apply(&mut config);
        assert_eq!(config.discovery.top_n_pairs, 7);
        assert_eq!(config.backtest.z_entry, 2.0);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = AppConfig::default();
        DiscoveryOverrides {
            no_volatility_filter: true,
            pair_timeout_secs: Some(5),
            ..Default::default()
        }
        .apply(&mut config);
        BacktestOverrides {
            z_exit: Some(-0.5),
            ..Default::default()
        }
        .apply(&mut config);

        assert!(!config.discovery.use_volatility_filter);
        assert_eq!(config.discovery.pair_timeout_secs, Some(5));
        assert_eq!(config.backtest.z_exit, -0.5);
    }
}
