use chrono::{Duration, NaiveDate, TimeZone, Utc};
use mockall::mock;
use statarb::backtest::{backtest_ranked_pairs, BacktestConfig};
use statarb::data::MemorySource;
use statarb::discovery::{discover_pairs, DiscoveryConfig, Stage};
use statarb::math::{AugmentedDickeyFuller, MathError, StationarityTest};
use statarb::recording::{CsvResultSink, MemorySink, SpreadSource};
use statarb::types::{InstrumentSeries, PricePoint};
use std::sync::Arc;

// --- Mocks ---

mock! {
    pub Stationarity {}

    impl StationarityTest for Stationarity {
        fn p_value(&self, series: &[f64]) -> Result<f64, MathError>;
    }
}

// --- Fixtures ---

const BARS: usize = 1500;

/// Deterministic uniform noise in [-1, 1)
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f64) / (1u64 << 31) as f64 - 1.0
    }
}

fn hourly(id: &str, closes: &[f64]) -> InstrumentSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    InstrumentSeries::new(
        id,
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                time: start + Duration::hours(i as i64),
                close,
            })
            .collect(),
    )
}

/// A and B cointegrated (B = 2A + noise), C unrelated, DEAD flat, BROKEN unreadable.
fn universe() -> MemorySource {
    let mut noise = Lcg(42);
    let a: Vec<f64> = (0..BARS)
        .map(|t| 100.0 + 20.0 * (t as f64 / 100.0).sin() + noise.next())
        .collect();
    let b: Vec<f64> = a.iter().map(|x| 2.0 * x + noise.next()).collect();
    let c: Vec<f64> = (0..BARS)
        .map(|t| 50.0 + 10.0 * (t as f64 / 37.0).cos() + 0.1 * noise.next())
        .collect();

    let mut source = MemorySource::new();
    source.insert(hourly("A", &a));
    source.insert(hourly("B", &b));
    source.insert(hourly("C", &c));
    source.insert(hourly("DEAD", &vec![0.01; BARS]));
    source.insert_broken("BROKEN", "unexpected end of file");
    source
}

fn backtest_config() -> BacktestConfig {
    BacktestConfig {
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        ..Default::default()
    }
}

// --- Tests ---

#[tokio::test]
async fn test_discover_then_backtest_in_memory() {
    let mut stationarity = MockStationarity::new();
    stationarity.expect_p_value().returning(|_| Ok(0.01));

    let config = DiscoveryConfig {
        workers: 4,
        ..Default::default()
    };
    let sink = Arc::new(MemorySink::new());

    let report = discover_pairs(
        Arc::new(universe()),
        sink.clone(),
        Arc::new(stationarity),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(report.instruments, 5);
    assert!(!report.survivors.contains(&"DEAD".to_string()));
    assert!(!report.survivors.contains(&"BROKEN".to_string()));
    assert_eq!(report.diagnostics.for_subject("BROKEN").count(), 1);
    assert_eq!(report.diagnostics.entries()[0].stage, Stage::Load);

    // Survivors are screened in descending volatility order, so B leads
    assert_eq!(report.survivors[0], "B");
    let pairs: Vec<&str> = report.ranking.iter().map(|r| r.pair.as_str()).collect();
    assert!(pairs.contains(&"B-A"));
    assert_eq!(sink.ranking().unwrap(), report.ranking);
    for pair in &pairs {
        assert!(sink.spread(pair).is_some(), "spread for {} not persisted", pair);
    }

    let backtest = backtest_ranked_pairs(
        sink.clone(),
        sink.clone(),
        &backtest_config(),
        config.bars_per_day(),
        config.workers,
    )
    .await
    .unwrap();

    let summarised: Vec<&str> = backtest.summaries.iter().map(|s| s.pair.as_str()).collect();
    assert_eq!(summarised, pairs);
    assert!(backtest.diagnostics.is_empty());

    let ab = &backtest.summaries[pairs.iter().position(|p| *p == "B-A").unwrap()];
    assert!(ab.num_trades > 0);
    assert!(ab.max_dd >= 0.0);
    assert!((0.0..=1.0).contains(&ab.win_rate));

    let (trades, equity) = sink.ledger("B-A").unwrap();
    assert_eq!(trades.len(), ab.num_trades);
    assert_eq!(equity.points.len(), trades.len() + 1);
    assert_eq!(sink.summaries().len(), pairs.len());
}

#[tokio::test]
async fn test_adf_accepts_cointegrated_pair_and_round_trips_csv() {
    let results = tempfile::tempdir().unwrap();
    let sink = Arc::new(CsvResultSink::create(results.path()).unwrap());
    let config = DiscoveryConfig::default();

    let report = discover_pairs(
        Arc::new(universe()),
        sink.clone(),
        Arc::new(AugmentedDickeyFuller::new()),
        &config,
    )
    .await
    .unwrap();

    let ab = report
        .ranking
        .iter()
        .find(|r| r.pair == "B-A")
        .expect("B-A should be cointegrated");
    assert!(ab.adf_pvalue < 0.01);
    assert!(sink.spread_path("B-A").exists());

    let ranking = sink.load_ranking().await.unwrap();
    assert_eq!(ranking.len(), report.ranking.len());
    let spread = sink.load_spread("B-A").await.unwrap();
    assert_eq!(spread.len(), BARS);
    assert!(spread.points[0].zscore.is_none());
    assert!(spread.points[BARS - 1].zscore.is_some());

    let backtest = backtest_ranked_pairs(
        sink.clone(),
        sink.clone(),
        &backtest_config(),
        config.bars_per_day(),
        config.workers,
    )
    .await
    .unwrap();
    assert_eq!(backtest.summaries.len(), report.ranking.len());
    assert!(sink.ledger_path("B-A").exists());
    assert!(sink.equity_path("B-A").exists());
    assert!(sink.summary_path().exists());
}
