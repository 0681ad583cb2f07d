//! Result Recording Module
//!
//! Provides multiple backends for persisting pipeline output:
//! - `ResultSink` / `SpreadSource` traits - pluggable write and read interfaces
//! - `CsvResultSink` - results directory tree of CSV tables
//! - `TracingSink` - structured log records
//! - `MemorySink` - in-process storage for tests and single-run pipelines
//! - `MultiSink` - best-effort fan-out

pub mod csv_recorder;
pub mod memory_recorder;
pub mod recorder;
pub mod tracing_recorder;

pub use csv_recorder::CsvResultSink;
pub use memory_recorder::MemorySink;
pub use recorder::{MultiSink, RankingRecord, RecordError, ResultSink, SpreadSource, TradeRow};
pub use tracing_recorder::TracingSink;
