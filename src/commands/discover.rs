//! Pair discovery command handler.
//!
//! Implements the `discover` subcommand: scans the data directory, writes
//! spreads for accepted pairs and the ranking table under the results dir.

use super::result_sink;
use crate::config::AppConfig;
use crate::data::CsvDirectorySource;
use crate::discovery::{discover_pairs, DiscoveryReport};
use crate::math::AugmentedDickeyFuller;
use crate::recording::CsvResultSink;

use std::sync::Arc;
use tracing::{info, warn};

/// Run the pair discovery pipeline against the configured directories.
///
/// # Errors
/// Returns error if the results directory cannot be created or the
/// discovery run fails as a whole.
pub async fn run_discover(config: &AppConfig) -> Result<DiscoveryReport, Box<dyn std::error::Error>> {
    info!("--- statarb: Pair Discovery ---");
    info!(
        data_dir = %config.data_dir.display(),
        results_dir = %config.results_dir.display(),
        correlation = config.discovery.correlation_threshold,
        adf_pvalue = config.discovery.adf_pvalue_threshold,
        top_n = config.discovery.top_n_pairs,
        bar_minutes = config.discovery.bar_interval_minutes,
        "Configuration loaded"
    );

    let source = Arc::new(CsvDirectorySource::new(
        &config.data_dir,
        config.discovery.bar_interval_minutes,
    ));
    let csv = CsvResultSink::create(&config.results_dir)?;
    let ranking_path = csv.ranking_path();

    let report = discover_pairs(
        source,
        result_sink(csv),
        Arc::new(AugmentedDickeyFuller::new()),
        &config.discovery,
    )
    .await?;

    if report.ranking.is_empty() {
        warn!("No cointegrated pairs found");
        return Ok(report);
    }

    println!("\n{:<5} | {:<24} | {:>10}", "Rank", "Pair", "ADF p");
    println!("{}", "-".repeat(45));
    for (rank, record) in report.ranking.iter().enumerate() {
        println!(
            "{:<5} | {:<24} | {:>10.6}",
            rank + 1,
            record.pair,
            record.adf_pvalue
        );
    }
    println!(
        "\n✓ Saved {} pairs to {} ({} skipped)",
        report.ranking.len(),
        ranking_path.display(),
        report.diagnostics.len()
    );

    Ok(report)
}
