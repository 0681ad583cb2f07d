//! Backtest command handler.
//!
//! Implements the `backtest` subcommand over a results tree produced by a
//! previous `discover` run.

use super::result_sink;
use crate::backtest::{backtest_ranked_pairs, BacktestReport};
use crate::config::AppConfig;
use crate::recording::{CsvResultSink, SpreadSource};

use std::sync::Arc;
use tracing::info;

/// Backtest every pair in `<results_dir>/top_pairs.csv`.
///
/// # Errors
/// Returns error if the ranking table is missing or unreadable.
pub async fn run_backtest(config: &AppConfig) -> Result<BacktestReport, Box<dyn std::error::Error>> {
    info!("--- statarb: Running Backtest ---");
    info!(
        results_dir = %config.results_dir.display(),
        start = %config.backtest.start,
        end = %config.backtest.end,
        z_entry = config.backtest.z_entry,
        z_exit = config.backtest.z_exit,
        "Backtest configuration"
    );

    let csv = CsvResultSink::create(&config.results_dir)?;
    let summary_path = csv.summary_path();
    let source: Arc<dyn SpreadSource> = Arc::new(csv.clone());

    let report = backtest_ranked_pairs(
        source,
        result_sink(csv),
        &config.backtest,
        config.discovery.bars_per_day(),
        config.discovery.workers,
    )
    .await?;

    println!(
        "\n{:<24} | {:>10} | {:>7} | {:>8} | {:>6} | {:>7} | {:>7}",
        "Pair", "PnL", "Sharpe", "MaxDD", "Trades", "WinRate", "AvgDur"
    );
    println!("{}", "-".repeat(90));
    for s in &report.summaries {
        println!(
            "{:<24} | {:>10.2} | {:>7.2} | {:>8.2} | {:>6} | {:>6.2}% | {:>6.1}h",
            s.pair,
            s.total_pnl,
            s.sharpe,
            s.max_dd,
            s.num_trades,
            s.win_rate * 100.0,
            s.avg_duration_h
        );
    }
    println!(
        "\n✓ Backtested {} pairs, summary saved to {}",
        report.summaries.len(),
        summary_path.display()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_ranking_fails() {
        let results = tempdir().unwrap();
        let config = AppConfig {
            results_dir: results.path().to_path_buf(),
            ..Default::default()
        };
        assert!(run_backtest(&config).await.is_err());
    }
}
