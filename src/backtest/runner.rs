//! Backtest orchestration over the ranked pair table.

use super::config::BacktestConfig;
use super::error::BacktestError;
use super::performance::{PerformanceAnalyzer, PerformanceSummary};
use super::simulator::{SimulationResult, TradeSimulator};
use crate::discovery::{Diagnostics, Stage};
use crate::recording::{ResultSink, SpreadSource};
use crate::types::SpreadSeries;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::info;

/// Outcome of backtesting one pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairBacktest {
    pub summary: PerformanceSummary,
    /// `None` when the window held no bars
    pub simulation: Option<SimulationResult>,
}

/// Results across all ranked pairs
#[derive(Debug, Clone)]
pub struct BacktestReport {
    /// One summary per processed pair, in ranking order
    pub summaries: Vec<PerformanceSummary>,
    pub diagnostics: Diagnostics,
}

/// Slice `spread` to the configured window, simulate and summarise.
pub fn backtest_pair(
    pair: &str,
    spread: &SpreadSeries,
    config: &BacktestConfig,
    annualization_factor: f64,
) -> PairBacktest {
    let window = spread.window(config.start, config.end);
    if window.is_empty() {
        info!(pair = %pair, "No data in selected window");
        return PairBacktest {
            summary: PerformanceSummary::empty(pair),
            simulation: None,
        };
    }

    let simulation = TradeSimulator::new(config.thresholds()).run(window);
    let summary = PerformanceAnalyzer::new(annualization_factor).analyze(
        pair,
        &simulation.trades,
        &simulation.equity,
    );

    PairBacktest {
        summary,
        simulation: Some(simulation),
    }
}

/// Backtest every pair in the ranking table.
///
/// Pairs run concurrently; summaries keep ranking order. A pair whose spread
/// table cannot be loaded is skipped with a diagnostic. An unreadable ranking
/// table or an invalid configuration fails the run.
pub async fn backtest_ranked_pairs(
    source: Arc<dyn SpreadSource>,
    sink: Arc<dyn ResultSink>,
    config: &BacktestConfig,
    bars_per_day: usize,
    workers: usize,
) -> Result<BacktestReport, BacktestError> {
    config.validate().map_err(BacktestError::InvalidConfig)?;
    let ranking = source.load_ranking().await?;
    let annualization = config.annualization(bars_per_day as f64);

    info!(
        pairs = ranking.len(),
        start = %config.start,
        end = %config.end,
        z_entry = config.z_entry,
        z_exit = config.z_exit,
        "Starting backtest"
    );

    let results: Vec<(String, Result<PairBacktest, (Stage, String)>)> =
        stream::iter(ranking.into_iter().map(|r| r.pair))
            .map(|pair| {
                let source = Arc::clone(&source);
                let config = config.clone();
                async move {
                    let spread = match source.load_spread(&pair).await {
                        Ok(spread) => spread,
                        Err(e) => return (pair, Err((Stage::Load, e.to_string()))),
                    };
                    let name = pair.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        backtest_pair(&name, &spread, &config, annualization)
                    })
                    .await
                    .map_err(|e| (Stage::Backtest, e.to_string()));
                    (pair, result)
                }
            })
            .buffered(workers.max(1))
            .collect()
            .await;

    let mut diagnostics = Diagnostics::new();
    let mut summaries = Vec::with_capacity(results.len());
    for (pair, result) in results {
        let backtest = match result {
            Ok(backtest) => backtest,
            Err((stage, reason)) => {
                diagnostics.push(pair, stage, reason);
                continue;
            }
        };

        if let Some(simulation) = &backtest.simulation {
            if let Err(e) = sink
                .record_backtest(&pair, &simulation.trades, &simulation.equity)
                .await
            {
                diagnostics.push(pair.clone(), Stage::Persist, e);
            }
        }

        let s = &backtest.summary;
        info!(
            pair = %s.pair,
            pnl = format!("{:.2}", s.total_pnl),
            sharpe = format!("{:.2}", s.sharpe),
            max_dd = format!("{:.2}", s.max_dd),
            trades = s.num_trades,
            win_rate = format!("{:.2}%", s.win_rate * 100.0),
            avg_duration = format!("{:.1}h", s.avg_duration_h),
            "Backtest summary"
        );
        summaries.push(backtest.summary);
    }

    sink.record_summaries(&summaries).await?;
    sink.flush().await?;

    info!(
        pairs = summaries.len(),
        skipped = diagnostics.len(),
        "Backtest completed"
    );

    Ok(BacktestReport {
        summaries,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{MemorySink, RankingRecord};
    use crate::types::SpreadPoint;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn spread_series(start_day: u32, zscores: &[Option<f64>], spreads: &[f64]) -> SpreadSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, start_day, 0, 0, 0).unwrap();
        SpreadSeries::new(
            zscores
                .iter()
                .zip(spreads)
                .enumerate()
                .map(|(i, (&zscore, &spread))| SpreadPoint {
                    time: start + Duration::hours(i as i64),
                    spread,
                    zscore,
                })
                .collect(),
        )
    }

    fn january() -> BacktestConfig {
        BacktestConfig {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_backtest_pair_empty_window() {
        let spread = spread_series(1, &[Some(3.0)], &[1.0]);
        let config = BacktestConfig {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            ..Default::default()
        };
        let result = backtest_pair("A-B", &spread, &config, 252.0 * 24.0);
        assert!(result.simulation.is_none());
        assert_eq!(result.summary.num_trades, 0);
        assert!(result.summary.total_pnl.is_nan());
    }

    #[tokio::test]
    async fn test_ranked_pairs_in_order_with_missing_spread() {
        let sink = Arc::new(MemorySink::new());
        sink.record_spread(
            "A-B",
            &spread_series(
                2,
                &[Some(0.0), Some(2.5), Some(2.5), Some(-0.1), Some(0.0)],
                &[10.0, 12.0, 13.0, 9.0, 8.0],
            ),
        )
        .await
        .unwrap();
        sink.record_spread("C-D", &spread_series(1, &[None], &[0.0]))
            .await
            .unwrap();
        sink.record_ranking(&[
            RankingRecord {
                pair: "C-D".to_string(),
                adf_pvalue: 0.001,
            },
            RankingRecord {
                pair: "MISSING-X".to_string(),
                adf_pvalue: 0.002,
            },
            RankingRecord {
                pair: "A-B".to_string(),
                adf_pvalue: 0.003,
            },
        ])
        .await
        .unwrap();

        let report = backtest_ranked_pairs(sink.clone(), sink.clone(), &january(), 24, 4)
            .await
            .unwrap();

        let pairs: Vec<&str> = report.summaries.iter().map(|s| s.pair.as_str()).collect();
        assert_eq!(pairs, vec!["C-D", "A-B"]);
        assert_eq!(report.summaries[1].total_pnl, 3.0);
        assert_eq!(report.summaries[0].num_trades, 0);
        assert!(report.summaries[0].total_pnl.is_nan());
        assert_eq!(report.summaries[0].sharpe, 0.0);
        assert_eq!(report.diagnostics.len(), 1);

        let (trades, equity) = sink.ledger("A-B").unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(equity.values(), vec![0.0, 3.0]);
        assert_eq!(sink.summaries().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_ranking_is_fatal() {
        let sink = Arc::new(MemorySink::new());
        let result = backtest_ranked_pairs(sink.clone(), sink, &january(), 24, 2).await;
        assert!(matches!(result, Err(BacktestError::Record(_))));
    }
}
