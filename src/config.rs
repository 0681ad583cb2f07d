//! Application configuration: filesystem layout plus per-stage settings.

use crate::backtest::BacktestConfig;
use crate::discovery::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading an [`AppConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration, loadable from JSON. Missing fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory of per-instrument price CSVs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root directory for spreads, rankings and backtest logs
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub backtest: BacktestConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            results_dir: default_results_dir(),
            discovery: DiscoveryConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file and validate both sections.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.discovery.validate().map_err(ConfigError::Invalid)?;
        self.backtest.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Default log file location under the results directory
    pub fn default_log_file(&self) -> PathBuf {
        self.results_dir.join("pair_selector.log")
    }
}
