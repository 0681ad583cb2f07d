//! CLI argument parsing using clap.
//!
//! Defines the `statarb` command line: global logging/config flags and the
//! `discover`, `backtest` and `run` subcommands.

mod config;

pub use config::{BacktestOverrides, DiscoveryOverrides, PathOverrides};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Statistical-arbitrage pair discovery and backtesting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,

    /// JSON configuration file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log file path (defaults to <results_dir>/pair_selector.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Disable the log file and log to stderr only
    #[arg(long, global = true, default_value_t = false)]
    pub no_log_file: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover cointegrated pairs and write spreads plus the ranking table
    Discover {
        #[command(flatten)]
        paths: PathOverrides,
        #[command(flatten)]
        discovery: DiscoveryOverrides,
    },

    /// Backtest the ranked pairs found by a previous discovery run
    Backtest {
        #[command(flatten)]
        paths: PathOverrides,
        #[command(flatten)]
        backtest: BacktestOverrides,
        /// Bar interval in minutes (sets the Sharpe annualisation)
        #[arg(long)]
        bar_interval_minutes: Option<u32>,
    },

    /// Discover pairs, then backtest them in one process
    Run {
        #[command(flatten)]
        paths: PathOverrides,
        #[command(flatten)]
        discovery: DiscoveryOverrides,
        #[command(flatten)]
        backtest: BacktestOverrides,
    },
}

impl Commands {
    pub fn paths(&self) -> &PathOverrides {
        match self {
            Commands::Discover { paths, .. }
            | Commands::Backtest { paths, .. }
            | Commands::Run { paths, .. } => paths,
        }
    }
}
