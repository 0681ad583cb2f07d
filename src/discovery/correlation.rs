//! Pairwise correlation screening
//!
//! All instruments are aligned on the timestamps they share; every unordered
//! pair is correlated once on that common table.

use crate::types::{InstrumentSeries, PairId};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// A pair whose absolute correlation reached the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePair {
    pub pair: PairId,
    /// Absolute Pearson correlation on the common table
    pub correlation: f64,
}

/// Calculate Pearson correlation coefficient between two price series
///
/// Returns a value in [-1.0, 1.0], or None if either side has zero variance
/// or the inputs are too short.
///
/// # Mathematical Definition
/// r = Σ[(xi - x̄)(yi - ȳ)] / √[Σ(xi - x̄)² × Σ(yi - ȳ)²]
pub fn calculate_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }

    let mean_a: f64 = a.iter().sum::<f64>() / a.len() as f64;
    let mean_b: f64 = b.iter().sum::<f64>() / b.len() as f64;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }

    let correlation = covariance / (var_a.sqrt() * var_b.sqrt());
    correlation.is_finite().then_some(correlation.clamp(-1.0, 1.0))
}

/// Closes of every instrument on the timestamps all of them share.
///
/// Columns follow the order of `series`; rows are in time order.
pub fn align_common(series: &[&InstrumentSeries]) -> (Vec<DateTime<Utc>>, Vec<Vec<f64>>) {
    let Some(first) = series.first() else {
        return (Vec::new(), Vec::new());
    };

    let lookups: Vec<HashMap<DateTime<Utc>, f64>> = series
        .iter()
        .map(|s| s.points.iter().map(|p| (p.time, p.close)).collect())
        .collect();

    let mut seen = HashSet::new();
    let times: Vec<DateTime<Utc>> = first
        .points
        .iter()
        .map(|p| p.time)
        .filter(|t| seen.insert(*t) && lookups.iter().all(|l| l.contains_key(t)))
        .collect();

    let columns = lookups
        .iter()
        .map(|lookup| times.iter().filter_map(|t| lookup.get(t).copied()).collect())
        .collect();

    (times, columns)
}

/// Symmetric absolute-correlation matrix; the diagonal is never populated.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<Option<f64>>,
    /// Rows in the common table
    pub observations: usize,
}

impl CorrelationMatrix {
    fn new(ids: Vec<String>, observations: usize) -> Self {
        let index = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        let n = ids.len();
        Self {
            ids,
            index,
            values: vec![None; n * n],
            observations,
        }
    }

    fn set(&mut self, i: usize, j: usize, value: Option<f64>) {
        let n = self.ids.len();
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// `|corr(a, b)|`, `None` for self-pairs, unknown ids or undefined values
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let (&i, &j) = (self.index.get(a)?, self.index.get(b)?);
        if i == j {
            return None;
        }
        self.values[i * self.ids.len() + j]
    }
}

/// Emits candidate pairs whose absolute correlation reaches a threshold.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationScreen {
    threshold: f64,
}

impl CorrelationScreen {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Build the matrix over `series` and list candidates.
    ///
    /// Candidates come out in combination order: (0,1), (0,2), ..., (1,2), ...
    /// with leg A the earlier instrument.
    pub fn screen(&self, series: &[&InstrumentSeries]) -> (CorrelationMatrix, Vec<CandidatePair>) {
        let (times, columns) = align_common(series);
        let ids: Vec<String> = series.iter().map(|s| s.id.clone()).collect();
        let mut matrix = CorrelationMatrix::new(ids, times.len());
        let mut candidates = Vec::new();

        info!(
            instruments = series.len(),
            common_rows = times.len(),
            threshold = self.threshold,
            "Computing correlation matrix"
        );

        for i in 0..series.len() {
            for j in (i + 1)..series.len() {
                let correlation = calculate_correlation(&columns[i], &columns[j]).map(f64::abs);
                matrix.set(i, j, correlation);

                let pair = PairId::new(series[i].id.clone(), series[j].id.clone());
                match correlation {
                    Some(c) if c >= self.threshold => {
                        candidates.push(CandidatePair {
                            pair,
                            correlation: c,
                        });
                    }
                    Some(c) => {
                        debug!(pair = %pair, corr = format!("{:.3}", c), "Correlation too low");
                    }
                    None => {
                        debug!(pair = %pair, "Correlation undefined");
                    }
                }
            }
        }

        info!(
            candidates = candidates.len(),
            threshold = self.threshold,
            "Correlation screen complete"
        );

        (matrix, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricePoint;
    use chrono::{Duration, TimeZone};

    fn series(id: &str, offset: i64, closes: &[f64]) -> InstrumentSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InstrumentSeries::new(
            id,
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    time: start + Duration::hours(i as i64 + offset),
                    close,
                })
                .collect(),
        )
    }

    #[test]
    fn test_correlation_perfect() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let corr = calculate_correlation(&a, &a).unwrap();
        assert!((corr - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_correlation_negative() {
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![5.0, 4.0, 3.0, 2.0, 1.0];
        let corr = calculate_correlation(&a, &b).unwrap();
        assert!((corr + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_correlation_zero_variance_is_undefined() {
        assert_eq!(calculate_correlation(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_align_common_uses_intersection() {
        let a = series("A", 0, &[1.0, 2.0, 3.0, 4.0]);
        let b = series("B", 2, &[30.0, 40.0, 50.0]);
        let (times, columns) = align_common(&[&a, &b]);
        assert_eq!(times.len(), 2);
        assert_eq!(columns[0], vec![3.0, 4.0]);
        assert_eq!(columns[1], vec![30.0, 40.0]);
    }

    #[test]
    fn test_screen_emits_each_pair_once_with_absolute_threshold() {
        let a = series("A", 0, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = series("B", 0, &[10.0, 8.0, 6.0, 4.0, 2.0]);
        let c = series("C", 0, &[1.0, 3.0, 1.0, 3.0, 1.0]);
        let (matrix, candidates) = CorrelationScreen::new(0.9).screen(&[&a, &b, &c]);

        let pairs: Vec<String> = candidates.iter().map(|c| c.pair.to_string()).collect();
        assert_eq!(pairs, vec!["A-B"]);
        assert!((matrix.get("B", "A").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("A", "A"), None);
        assert!(matrix.get("A", "C").unwrap() < 0.9);
    }
}
