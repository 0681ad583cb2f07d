//! Pair discovery pipeline
//!
//! # Pipeline
//! 1. List and load instruments, filtering each one
//! 2. Keep the most volatile survivors (optional)
//! 3. Correlation screen on the common timestamps
//! 4. Cointegration test per candidate, persisting accepted spreads
//! 5. Rank by p-value, truncate, persist the ranking
//!
//! Steps 1 and 4 run concurrently over a bounded, order-preserving stream;
//! a failure in one instrument or pair becomes a diagnostic and never stops
//! its siblings.

use super::cointegration::{CointegrationTester, PairOutcome};
use super::config::DiscoveryConfig;
use super::correlation::{CandidatePair, CorrelationMatrix, CorrelationScreen};
use super::diagnostics::{Diagnostics, Stage};
use super::error::DiscoveryError;
use super::filter::{TickerFilter, TickerVerdict};
use super::ranking::PairRanker;
use crate::data::TimeSeriesSource;
use crate::math::StationarityTest;
use crate::recording::{RankingRecord, ResultSink};
use crate::types::{InstrumentSeries, PairId};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What a discovery run produced and skipped
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    /// Instruments listed by the source
    pub instruments: usize,
    /// Instruments that passed filtering, in screening order
    pub survivors: Vec<String>,
    /// Absolute correlations among the survivors
    pub correlations: CorrelationMatrix,
    /// Pairs that passed the correlation screen, in evaluation order
    pub candidates: Vec<CandidatePair>,
    /// Pairs accepted by the cointegration test (before truncation)
    pub accepted: usize,
    /// Final ranking, ascending p-value
    pub ranking: Vec<RankingRecord>,
    pub diagnostics: Diagnostics,
}

/// Run discovery end to end.
///
/// Only shared setup can fail the run: invalid configuration, an unreadable
/// instrument catalog, or a background task failing outside any single pair.
pub async fn discover_pairs(
    source: Arc<dyn TimeSeriesSource>,
    sink: Arc<dyn ResultSink>,
    test: Arc<dyn StationarityTest>,
    config: &DiscoveryConfig,
) -> Result<DiscoveryReport, DiscoveryError> {
    config.validate().map_err(DiscoveryError::InvalidConfig)?;

    let instruments = source.list_instruments().await?;
    info!(
        instruments = instruments.len(),
        workers = config.workers,
        "Starting pair discovery"
    );

    let mut diagnostics = Diagnostics::new();

    // Step 1: load + filter
    let filter = TickerFilter::from_config(config);
    let loaded: Vec<(String, Result<(Arc<InstrumentSeries>, TickerVerdict), (Stage, DiscoveryError)>)> =
        stream::iter(instruments.iter().cloned())
            .map(|id| {
                let source = Arc::clone(&source);
                let filter = filter.clone();
                async move {
                    let result = match source.load(&id).await {
                        Ok(series) => filter
                            .evaluate(&series)
                            .map(|verdict| (Arc::new(series), verdict))
                            .map_err(|e| (Stage::Filter, e)),
                        Err(e) => Err((Stage::Load, e.into())),
                    };
                    (id, result)
                }
            })
            .buffered(config.workers)
            .collect()
            .await;

    let mut series_by_id: HashMap<String, Arc<InstrumentSeries>> = HashMap::new();
    let mut survivors = Vec::new();
    for (id, result) in loaded {
        match result {
            Ok((series, TickerVerdict::Accepted { long_volatility })) => {
                survivors.push((id.clone(), long_volatility));
                series_by_id.insert(id, series);
            }
            Ok((_, TickerVerdict::Rejected(reason))) => {
                debug!(instrument = %id, reason = %reason, "Instrument filtered out");
            }
            Err((stage, e)) => diagnostics.push(id, stage, e),
        }
    }

    info!(
        survivors = survivors.len(),
        instruments = instruments.len(),
        "Selected good instruments"
    );

    // Step 2: volatility cap
    let selected = filter.select(survivors);

    // Step 3: correlation screen
    let screened: Vec<Arc<InstrumentSeries>> = selected
        .iter()
        .filter_map(|id| series_by_id.get(id).cloned())
        .collect();
    let screen = CorrelationScreen::new(config.correlation_threshold);
    let (correlations, candidates) = tokio::task::spawn_blocking(move || {
        let refs: Vec<&InstrumentSeries> = screened.iter().map(|s| s.as_ref()).collect();
        screen.screen(&refs)
    })
    .await
    .map_err(|e| DiscoveryError::Task(e.to_string()))?;

    // Step 4: cointegration
    let tester = CointegrationTester::from_config(test, config);
    let accepted = test_candidates(
        &candidates,
        &series_by_id,
        &tester,
        sink.as_ref(),
        config,
        &mut diagnostics,
    )
    .await;

    // Step 5: rank + persist
    let accepted_count = accepted.len();
    let ranking = PairRanker::new(config.top_n_pairs).rank(accepted);
    if let Err(e) = sink.record_ranking(&ranking).await {
        diagnostics.push("ranking", Stage::Ranking, e);
    }
    if let Err(e) = sink.flush().await {
        diagnostics.push("ranking", Stage::Persist, e);
    }

    info!(
        candidates = candidates.len(),
        accepted = accepted_count,
        ranked = ranking.len(),
        skipped = diagnostics.len(),
        "Discovery complete"
    );

    Ok(DiscoveryReport {
        instruments: instruments.len(),
        survivors: selected,
        correlations,
        candidates,
        accepted: accepted_count,
        ranking,
        diagnostics,
    })
}

/// Test candidates concurrently and persist accepted spreads in candidate order.
async fn test_candidates(
    candidates: &[CandidatePair],
    series_by_id: &HashMap<String, Arc<InstrumentSeries>>,
    tester: &CointegrationTester,
    sink: &dyn ResultSink,
    config: &DiscoveryConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<RankingRecord> {
    let outcomes = stream::iter(candidates.iter().cloned())
        .map(|candidate| {
            let legs = (
                series_by_id.get(&candidate.pair.a).cloned(),
                series_by_id.get(&candidate.pair.b).cloned(),
            );
            let tester = tester.clone();
            let timeout_secs = config.pair_timeout_secs;
            async move {
                let pair = candidate.pair;
                let result = match legs {
                    (Some(a), Some(b)) => test_pair(tester, pair.clone(), a, b, timeout_secs).await,
                    _ => Err(DiscoveryError::MalformedSeries(format!(
                        "{}: leg not loaded",
                        pair
                    ))),
                };
                (pair, result)
            }
        })
        .buffered(config.workers);
    let mut outcomes = std::pin::pin!(outcomes);

    let mut accepted = Vec::new();
    while let Some((pair, result)) = outcomes.next().await {
        match result {
            Ok(PairOutcome::Accepted(cointegrated)) => {
                let pair_name = pair.to_string();
                if let Err(e) = sink.record_spread(&pair_name, &cointegrated.spread).await {
                    diagnostics.push(pair_name, Stage::Persist, e);
                    continue;
                }
                info!(
                    pair = %pair,
                    beta = format!("{:.4}", cointegrated.beta),
                    p_value = format!("{:.4}", cointegrated.p_value),
                    "Found cointegrated pair"
                );
                accepted.push(cointegrated.ranking_record());
            }
            Ok(PairOutcome::Rejected { .. }) => {}
            Err(e) => diagnostics.push(pair.to_string(), Stage::Cointegration, e),
        }
    }
    accepted
}

/// Run one cointegration test on the blocking pool, with an optional deadline.
async fn test_pair(
    tester: CointegrationTester,
    pair: PairId,
    a: Arc<InstrumentSeries>,
    b: Arc<InstrumentSeries>,
    timeout_secs: Option<u64>,
) -> Result<PairOutcome, DiscoveryError> {
    let task = tokio::task::spawn_blocking(move || tester.test(&pair, &a, &b));
    let joined = match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), task)
            .await
            .map_err(|_| DiscoveryError::Timeout { secs })?,
        None => task.await,
    };
    joined.map_err(|e| DiscoveryError::Task(e.to_string()))?
}
