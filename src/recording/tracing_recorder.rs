//! Tracing-based Result Recorder
//!
//! Emits structured logs for pipeline results that any tracing subscriber
//! can capture. Nothing is stored.

use super::recorder::{RankingRecord, RecordError, ResultSink};
use crate::backtest::{EquityCurve, PerformanceSummary, Trade};
use crate::types::SpreadSeries;
use async_trait::async_trait;
use tracing::{debug, info};

/// Recorder that emits structured tracing logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResultSink for TracingSink {
    async fn record_spread(&self, pair: &str, spread: &SpreadSeries) -> Result<(), RecordError> {
        debug!(
            target: "results",
            pair = %pair,
            rows = spread.len(),
            defined_z = spread.points.iter().filter(|p| p.zscore.is_some()).count(),
            "Spread recorded"
        );
        Ok(())
    }

    async fn record_ranking(&self, ranking: &[RankingRecord]) -> Result<(), RecordError> {
        for (rank, record) in ranking.iter().enumerate() {
            info!(
                target: "results",
                rank = rank + 1,
                pair = %record.pair,
                adf_pvalue = record.adf_pvalue,
                "Ranked pair"
            );
        }
        Ok(())
    }

    async fn record_backtest(
        &self,
        pair: &str,
        trades: &[Trade],
        equity: &EquityCurve,
    ) -> Result<(), RecordError> {
        for trade in trades {
            debug!(
                target: "results",
                pair = %pair,
                position = trade.side.sign(),
                entry_time = %trade.entry_time.to_rfc3339(),
                exit_time = %trade.exit_time.to_rfc3339(),
                entry_z = trade.entry_z,
                exit_z = ?trade.exit_z,
                pnl = trade.pnl,
                duration_h = trade.duration_h,
                "Trade closed"
            );
        }
        debug!(
            target: "results",
            pair = %pair,
            final_equity = ?equity.last_value(),
            "Equity curve recorded"
        );
        Ok(())
    }

    async fn record_summaries(&self, summaries: &[PerformanceSummary]) -> Result<(), RecordError> {
        for s in summaries {
            info!(
                target: "results",
                pair = %s.pair,
                total_pnl = s.total_pnl,
                sharpe = s.sharpe,
                max_dd = s.max_dd,
                num_trades = s.num_trades,
                win_rate = s.win_rate,
                avg_duration_h = s.avg_duration_h,
                "Backtest summary"
            );
        }
        Ok(())
    }
}
