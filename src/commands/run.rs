//! Full pipeline handler: discover, then backtest the fresh ranking.

use super::{run_backtest, run_discover};
use crate::config::AppConfig;
use tracing::warn;

/// Run discovery followed by the backtest in one process.
///
/// The backtest stage is skipped when discovery ranks no pairs.
pub async fn run_pipeline(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let discovery = run_discover(config).await?;
    if discovery.ranking.is_empty() {
        warn!("Skipping backtest: ranking is empty");
        return Ok(());
    }
    run_backtest(config).await?;
    Ok(())
}
