//! Fixed-interval regularisation of raw price observations.

use crate::types::PricePoint;
use chrono::{DateTime, TimeZone, Utc};

/// As-of forward-fill resampling.
///
/// Bar labels run from the first timestamp floored to `interval_secs`
/// through the last timestamp floored to `interval_secs`. Each label takes
/// the last observation at or before it; labels with no prior observation
/// are dropped. Input must be sorted by time.
pub fn resample_ffill(raw: &[PricePoint], interval_secs: i64) -> Vec<PricePoint> {
    if raw.is_empty() || interval_secs <= 0 {
        return Vec::new();
    }

    let floor = |t: DateTime<Utc>| t.timestamp().div_euclid(interval_secs) * interval_secs;
    let first_label = floor(raw[0].time);
    let last_label = floor(raw[raw.len() - 1].time);

    let mut out = Vec::with_capacity(((last_label - first_label) / interval_secs + 1) as usize);
    let mut cursor = 0usize;
    let mut current: Option<f64> = None;
    let mut label = first_label;

    while label <= last_label {
        while cursor < raw.len() && raw[cursor].time.timestamp() <= label {
            current = Some(raw[cursor].close);
            cursor += 1;
        }
        if let (Some(close), Some(time)) = (current, Utc.timestamp_opt(label, 0).single()) {
            out.push(PricePoint { time, close });
        }
        label += interval_secs;
    }

    out
}
