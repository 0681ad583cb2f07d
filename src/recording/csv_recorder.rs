//! CSV Result Recorder
//!
//! Writes the results tree:
//!
//! ```text
//! {root}/spreads/{A_B}_spread_z.csv
//! {root}/top_pairs.csv
//! {root}/backtest_logs/{A-B}_backtest_log.csv
//! {root}/backtest_logs/{A-B}_equity_curve.csv
//! {root}/backtest_logs/all_pairs_backtest_summary.csv
//! ```

use super::recorder::{RankingRecord, RecordError, ResultSink, SpreadSource, TradeRow};
use crate::backtest::{EquityCurve, PerformanceSummary, Trade};
use crate::types::{SpreadPoint, SpreadSeries};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SPREAD_HEADER: &[&str] = &["time", "spread", "zscore"];
const RANKING_HEADER: &[&str] = &["pair", "adf_pvalue"];
const LEDGER_HEADER: &[&str] = &[
    "entry_time",
    "exit_time",
    "position",
    "entry_z",
    "exit_z",
    "pnl",
    "duration_h",
];
const EQUITY_HEADER: &[&str] = &["time", "equity"];
const SUMMARY_HEADER: &[&str] = &[
    "pair",
    "total_pnl",
    "sharpe",
    "max_dd",
    "num_trades",
    "win_rate",
    "avg_duration_h",
];

/// CSV results recorder
///
/// Uses `spawn_blocking` to avoid blocking the async runtime during file I/O.
#[derive(Debug, Clone)]
pub struct CsvResultSink {
    root: Arc<PathBuf>,
}

impl CsvResultSink {
    /// Create the recorder and its directory tree.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let sink = Self {
            root: Arc::new(root.into()),
        };
        std::fs::create_dir_all(sink.spreads_dir())?;
        std::fs::create_dir_all(sink.backtest_dir())?;
        Ok(sink)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn spreads_dir(&self) -> PathBuf {
        self.root.join("spreads")
    }

    pub fn backtest_dir(&self) -> PathBuf {
        self.root.join("backtest_logs")
    }

    pub fn ranking_path(&self) -> PathBuf {
        self.root.join("top_pairs.csv")
    }

    /// Spread file for `pair`; every '-' becomes '_' in the file stem.
    pub fn spread_path(&self, pair: &str) -> PathBuf {
        self.spreads_dir()
            .join(format!("{}_spread_z.csv", pair.replace('-', "_")))
    }

    pub fn ledger_path(&self, pair: &str) -> PathBuf {
        self.backtest_dir().join(format!("{}_backtest_log.csv", pair))
    }

    pub fn equity_path(&self, pair: &str) -> PathBuf {
        self.backtest_dir().join(format!("{}_equity_curve.csv", pair))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.backtest_dir().join("all_pairs_backtest_summary.csv")
    }
}

/// Write `rows` under an explicit header so empty tables still get one.
async fn write_table<T>(
    path: PathBuf,
    header: &'static [&'static str],
    rows: Vec<T>,
) -> Result<(), RecordError>
where
    T: Serialize + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(header)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok::<(), RecordError>(())
    })
    .await
    .map_err(|e| RecordError::Io(std::io::Error::other(e)))??;

    Ok(())
}

async fn read_table<T>(path: PathBuf) -> Result<Vec<T>, RecordError>
where
    T: DeserializeOwned + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<Vec<T>, RecordError> {
        if !path.exists() {
            return Err(RecordError::Missing(path.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    })
    .await
    .map_err(|e| RecordError::Io(std::io::Error::other(e)))?
}

#[async_trait]
impl ResultSink for CsvResultSink {
    async fn record_spread(&self, pair: &str, spread: &SpreadSeries) -> Result<(), RecordError> {
        write_table(self.spread_path(pair), SPREAD_HEADER, spread.points.clone()).await
    }

    async fn record_ranking(&self, ranking: &[RankingRecord]) -> Result<(), RecordError> {
        write_table(self.ranking_path(), RANKING_HEADER, ranking.to_vec()).await
    }

    async fn record_backtest(
        &self,
        pair: &str,
        trades: &[Trade],
        equity: &EquityCurve,
    ) -> Result<(), RecordError> {
        let rows: Vec<TradeRow> = trades.iter().map(TradeRow::from).collect();
        write_table(self.ledger_path(pair), LEDGER_HEADER, rows).await?;
        write_table(self.equity_path(pair), EQUITY_HEADER, equity.points.clone()).await
    }

    async fn record_summaries(&self, summaries: &[PerformanceSummary]) -> Result<(), RecordError> {
        write_table(self.summary_path(), SUMMARY_HEADER, summaries.to_vec()).await
    }
}

#[async_trait]
impl SpreadSource for CsvResultSink {
    async fn load_ranking(&self) -> Result<Vec<RankingRecord>, RecordError> {
        read_table(self.ranking_path()).await
    }

    async fn load_spread(&self, pair: &str) -> Result<SpreadSeries, RecordError> {
        let points: Vec<SpreadPoint> = read_table(self.spread_path(pair)).await?;
        Ok(SpreadSeries::new(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_spread_table_reads_back() {
        let dir = tempdir().unwrap();
        let sink = CsvResultSink::create(dir.path()).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let spread = SpreadSeries::new(vec![
            SpreadPoint {
                time: start,
                spread: 1.5,
                zscore: None,
            },
            SpreadPoint {
                time: start + Duration::hours(1),
                spread: -0.25,
                zscore: Some(-1.75),
            },
        ]);

        sink.record_spread("BTC-USD-ETH", &spread).await.unwrap();
        assert!(dir.path().join("spreads/BTC_USD_ETH_spread_z.csv").exists());

        let loaded = sink.load_spread("BTC-USD-ETH").await.unwrap();
        assert_eq!(loaded, spread);
    }

    #[tokio::test]
    async fn test_ranking_header_and_missing_spread() {
        let dir = tempdir().unwrap();
        let sink = CsvResultSink::create(dir.path()).unwrap();
        sink.record_ranking(&[RankingRecord {
            pair: "A-B".to_string(),
            adf_pvalue: 0.01,
        }])
        .await
        .unwrap();

        let contents = std::fs::read_to_string(sink.ranking_path()).unwrap();
        assert!(contents.starts_with("pair,adf_pvalue"));
        assert_eq!(sink.load_ranking().await.unwrap().len(), 1);

        assert!(matches!(
            sink.load_spread("C-D").await,
            Err(RecordError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_tables_still_have_headers() {
        let dir = tempdir().unwrap();
        let sink = CsvResultSink::create(dir.path()).unwrap();
        sink.record_backtest("A-B", &[], &EquityCurve::default())
            .await
            .unwrap();
        sink.record_summaries(&[PerformanceSummary::empty("A-B")])
            .await
            .unwrap();

        let ledger = std::fs::read_to_string(sink.ledger_path("A-B")).unwrap();
        assert_eq!(ledger.trim(), LEDGER_HEADER.join(","));
        let summary = std::fs::read_to_string(sink.summary_path()).unwrap();
        assert!(summary.starts_with(&SUMMARY_HEADER.join(",")));
        assert!(summary.contains("A-B,NaN"));
    }
}
