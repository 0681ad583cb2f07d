//! CLI command handlers.
//!
//! Each handler wires the CSV data source and result tree to the library
//! pipelines and prints a short table of what was produced.

mod backtest;
mod discover;
mod run;

pub use backtest::run_backtest;
pub use discover::run_discover;
pub use run::run_pipeline;

use crate::recording::{CsvResultSink, MultiSink, TracingSink};
use std::sync::Arc;

/// CSV tree as the primary backend, mirrored to structured logs
fn result_sink(csv: CsvResultSink) -> Arc<MultiSink> {
    Arc::new(MultiSink::new(vec![
        Box::new(csv),
        Box::new(TracingSink::new()),
    ]))
}
