//! Backtesting engine for ranked spread pairs.
//!
//! Replays each pair's spread/z-score table through a threshold state
//! machine and reduces the resulting ledger to performance statistics.

pub mod config;
pub mod error;
pub mod performance;
pub mod runner;
pub mod simulator;

pub use config::BacktestConfig;
pub use error::BacktestError;
pub use performance::{PerformanceAnalyzer, PerformanceSummary};
pub use runner::{backtest_pair, backtest_ranked_pairs, BacktestReport, PairBacktest};
pub use simulator::{
    EquityCurve, EquityPoint, PositionSide, PositionState, SimulationResult, Thresholds, Trade,
    TradeSimulator,
};
