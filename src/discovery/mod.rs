//! Pair Discovery Module
//!
//! Finds cointegrated instrument pairs: filters instruments, screens pairs
//! by correlation, tests spreads for stationarity and ranks the survivors.
//!
//! # Example
//!
//! ```ignore
//! use statarb::data::CsvDirectorySource;
//! use statarb::discovery::{discover_pairs, DiscoveryConfig};
//! use statarb::math::AugmentedDickeyFuller;
//! use statarb::recording::CsvResultSink;
//! use std::sync::Arc;
//!
//! let config = DiscoveryConfig::default();
//! let source = Arc::new(CsvDirectorySource::new("data", config.bar_interval_minutes));
//! let sink = Arc::new(CsvResultSink::create("results")?);
//! let report = discover_pairs(source, sink, Arc::new(AugmentedDickeyFuller::new()), &config).await?;
//! ```

pub mod cointegration;
pub mod config;
pub mod correlation;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod ranking;

pub use cointegration::{CointegratedPair, CointegrationTester, PairOutcome};
pub use config::DiscoveryConfig;
pub use correlation::{CandidatePair, CorrelationMatrix, CorrelationScreen};
pub use diagnostics::{Diagnostic, Diagnostics, Stage};
pub use error::DiscoveryError;
pub use filter::{TickerFilter, TickerVerdict};
pub use pipeline::{discover_pairs, DiscoveryReport};
pub use ranking::PairRanker;
