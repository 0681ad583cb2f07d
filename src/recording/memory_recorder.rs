//! In-memory recorder.
//!
//! Holds every artifact in process so the backtest stage can read what
//! discovery wrote without touching the filesystem.

use super::recorder::{RankingRecord, RecordError, ResultSink, SpreadSource};
use crate::backtest::{EquityCurve, PerformanceSummary, Trade};
use crate::types::SpreadSeries;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    spreads: HashMap<String, SpreadSeries>,
    ranking: Option<Vec<RankingRecord>>,
    ledgers: HashMap<String, (Vec<Trade>, EquityCurve)>,
    summaries: Vec<PerformanceSummary>,
}

/// Recorder and spread source backed by a mutex-guarded map
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // Handle mutex poisoning gracefully
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn spread(&self, pair: &str) -> Option<SpreadSeries> {
        self.lock().spreads.get(pair).cloned()
    }

    pub fn spread_pairs(&self) -> Vec<String> {
        let mut pairs: Vec<String> = self.lock().spreads.keys().cloned().collect();
        pairs.sort();
        pairs
    }

    pub fn ranking(&self) -> Option<Vec<RankingRecord>> {
        self.lock().ranking.clone()
    }

    pub fn ledger(&self, pair: &str) -> Option<(Vec<Trade>, EquityCurve)> {
        self.lock().ledgers.get(pair).cloned()
    }

    pub fn summaries(&self) -> Vec<PerformanceSummary> {
        self.lock().summaries.clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record_spread(&self, pair: &str, spread: &SpreadSeries) -> Result<(), RecordError> {
        self.lock().spreads.insert(pair.to_string(), spread.clone());
        Ok(())
    }

    async fn record_ranking(&self, ranking: &[RankingRecord]) -> Result<(), RecordError> {
        self.lock().ranking = Some(ranking.to_vec());
        Ok(())
    }

    async fn record_backtest(
        &self,
        pair: &str,
        trades: &[Trade],
        equity: &EquityCurve,
    ) -> Result<(), RecordError> {
        self.lock()
            .ledgers
            .insert(pair.to_string(), (trades.to_vec(), equity.clone()));
        Ok(())
    }

    async fn record_summaries(&self, summaries: &[PerformanceSummary]) -> Result<(), RecordError> {
        self.lock().summaries = summaries.to_vec();
        Ok(())
    }
}

#[async_trait]
impl SpreadSource for MemorySink {
    async fn load_ranking(&self) -> Result<Vec<RankingRecord>, RecordError> {
        self.ranking()
            .ok_or_else(|| RecordError::Missing("ranking table".to_string()))
    }

    async fn load_spread(&self, pair: &str) -> Result<SpreadSeries, RecordError> {
        self.spread(pair)
            .ok_or_else(|| RecordError::Missing(format!("spread table for {}", pair)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_round_trip() {
        let sink = MemorySink::new();
        assert!(sink.load_ranking().await.is_err());

        sink.record_spread("A-B", &SpreadSeries::default())
            .await
            .unwrap();
        sink.record_ranking(&[RankingRecord {
            pair: "A-B".to_string(),
            adf_pvalue: 0.02,
        }])
        .await
        .unwrap();

        assert_eq!(sink.load_ranking().await.unwrap()[0].pair, "A-B");
        assert!(sink.load_spread("A-B").await.is_ok());
        assert!(matches!(
            sink.load_spread("B-C").await,
            Err(RecordError::Missing(_))
        ));
        assert_eq!(sink.spread_pairs(), vec!["A-B"]);
    }
}
