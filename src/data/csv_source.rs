//! CSV directory source.
//!
//! One file per instrument (`{id}.csv`). The first column is the bar open
//! time and the second the close price; any other columns are ignored.

use super::resample::resample_ffill;
use super::{DataError, TimeSeriesSource};
use crate::types::{InstrumentSeries, PricePoint};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Epoch values at or above this magnitude are read as milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Reads `{dir}/{instrument}.csv` files and resamples them to a fixed interval.
///
/// File I/O runs on the blocking pool so the async runtime is never stalled.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: Arc<PathBuf>,
    interval_secs: i64,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>, interval_minutes: u32) -> Self {
        Self {
            dir: Arc::new(dir.into()),
            interval_secs: i64::from(interval_minutes) * 60,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TimeSeriesSource for CsvDirectorySource {
    async fn list_instruments(&self) -> Result<Vec<String>, DataError> {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, DataError> {
            let mut ids = Vec::new();
            for entry in std::fs::read_dir(&*dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
            ids.sort();
            Ok(ids)
        })
        .await
        .map_err(|e| DataError::Task(e.to_string()))?
    }

    async fn load(&self, instrument: &str) -> Result<InstrumentSeries, DataError> {
        let path = self.dir.join(format!("{}.csv", instrument));
        let id = instrument.to_string();
        let interval_secs = self.interval_secs;

        tokio::task::spawn_blocking(move || -> Result<InstrumentSeries, DataError> {
            if !path.exists() {
                return Err(DataError::UnknownInstrument(id));
            }
            let raw = read_price_file(&path, &id)?;
            let points = resample_ffill(&raw, interval_secs);
            debug!(
                instrument = %id,
                raw_rows = raw.len(),
                bars = points.len(),
                "Loaded price file"
            );
            Ok(InstrumentSeries::new(id, points))
        })
        .await
        .map_err(|e| DataError::Task(e.to_string()))?
    }
}

/// Parse a price file into time-sorted observations, last duplicate wins.
fn read_price_file(path: &Path, instrument: &str) -> Result<Vec<PricePoint>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let (Some(time_raw), Some(close_raw)) = (record.get(0), record.get(1)) else {
            return Err(DataError::MalformedSeries {
                instrument: instrument.to_string(),
                reason: format!("row {} has fewer than two columns", row + 1),
            });
        };
        let time = parse_timestamp(time_raw)?;
        let close: f64 = close_raw.parse().map_err(|_| DataError::MalformedSeries {
            instrument: instrument.to_string(),
            reason: format!("row {}: invalid close '{}'", row + 1, close_raw),
        })?;
        if !close.is_finite() {
            return Err(DataError::MalformedSeries {
                instrument: instrument.to_string(),
                reason: format!("row {}: non-finite close", row + 1),
            });
        }
        points.push(PricePoint { time, close });
    }

    if points.is_empty() {
        return Err(DataError::MalformedSeries {
            instrument: instrument.to_string(),
            reason: "no data rows".to_string(),
        });
    }

    points.sort_by_key(|p| p.time);
    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match deduped.last_mut() {
            Some(last) if last.time == point.time => *last = point,
            _ => deduped.push(point),
        }
    }

    Ok(deduped)
}

/// Accepts RFC 3339, common naive datetime layouts, plain dates and epoch
/// seconds or milliseconds. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DataError> {
    let s = raw.trim().trim_start_matches('\u{feff}');

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(epoch) = s.parse::<i64>() {
        let parsed = if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
            Utc.timestamp_millis_opt(epoch).single()
        } else {
            Utc.timestamp_opt(epoch, 0).single()
        };
        if let Some(dt) = parsed {
            return Ok(dt);
        }
    }

    Err(DataError::TimestampParse(s.to_string()))
}
