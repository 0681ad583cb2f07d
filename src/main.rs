use clap::Parser;
use dotenv::dotenv;
use statarb::cli::{Cli, Commands};
use statarb::commands::{run_backtest, run_discover, run_pipeline};
use statarb::config::AppConfig;
use statarb::observability::init_tracing;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv().ok();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    cli.command.paths().apply(&mut config);
    match &cli.command {
        Commands::Discover { discovery, .. } => discovery.apply(&mut config),
        Commands::Backtest {
            backtest,
            bar_interval_minutes,
            ..
        } => {
            backtest.apply(&mut config);
            if let Some(minutes) = bar_interval_minutes {
                config.discovery.bar_interval_minutes = *minutes;
            }
        }
        Commands::Run {
            discovery,
            backtest,
            ..
        } => {
            discovery.apply(&mut config);
            backtest.apply(&mut config);
        }
    }
    config.validate()?;

    let log_file = if cli.no_log_file {
        None
    } else {
        Some(cli.log_file.clone().unwrap_or_else(|| config.default_log_file()))
    };
    init_tracing(&cli.verbose, log_file.as_deref())?;

    let result = match &cli.command {
        Commands::Discover { .. } => run_discover(&config).await.map(|_| ()),
        Commands::Backtest { .. } => run_backtest(&config).await.map(|_| ()),
        Commands::Run { .. } => run_pipeline(&config).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "Run failed");
    }
    result
}
