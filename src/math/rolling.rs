//! Trailing-window z-scores.

use super::{mean, sample_std};

/// Rolling z-score over a trailing window of `window` points.
///
/// `z[t] = (x[t] - mean(x[t-W+1..=t])) / std(x[t-W+1..=t])` with the sample
/// (n-1) standard deviation. The first `window - 1` entries are `None`, as is
/// any entry whose window is flat (all values equal, or a deviation within
/// rounding noise of the mean) or whose deviation is not finite.
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window < 2 || values.len() < window {
        return out;
    }

    for end in window..=values.len() {
        let slice = &values[end - window..end];
        let (Some(m), Some(std)) = (mean(slice), sample_std(slice)) else {
            continue;
        };
        if !std.is_finite() || is_flat(slice, m, std) {
            continue;
        }
        let z = (values[end - 1] - m) / std;
        if z.is_finite() {
            out[end - 1] = Some(z);
        }
    }

    out
}

/// A window whose spread is only floating-point noise around its mean.
fn is_flat(slice: &[f64], mean: f64, std: f64) -> bool {
    let first = slice[0];
    slice.iter().all(|&v| v == first)
        || std <= f64::EPSILON * mean.abs().max(1.0) * slice.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_is_undefined() {
        let values: Vec<f64> = (0..10).map(|i| (i * i) as f64).collect();
        let z = rolling_zscore(&values, 4);
        assert_eq!(z.len(), values.len());
        assert!(z[..3].iter().all(Option::is_none));
        assert!(z[3..].iter().all(Option::is_some));
    }

    #[test]
    fn test_known_value() {
        // window [1, 2, 3]: mean 2, sample std 1 → z(3) = 1
        let z = rolling_zscore(&[1.0, 2.0, 3.0], 3);
        assert!((z[2].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_deviation_is_undefined() {
        let z = rolling_zscore(&[5.0, 5.0, 5.0, 5.0, 6.0], 3);
        assert_eq!(z[2], None);
        assert_eq!(z[3], None);
        assert!(z[4].is_some());
    }

    #[test]
    fn test_flat_run_with_rounded_mean_is_undefined() {
        // mean of three 0.1s is 0.10000000000000002, leaving a tiny nonzero std
        let mut values = vec![1.0, 1.2, 0.9, 1.5, 3.0];
        values.extend(std::iter::repeat(0.1).take(8));
        let z = rolling_zscore(&values, 3);
        assert!(z[2..5].iter().all(Option::is_some));
        assert!(z[7..].iter().all(Option::is_none));
    }

    #[test]
    fn test_window_longer_than_series() {
        assert!(rolling_zscore(&[1.0, 2.0], 5).iter().all(Option::is_none));
    }
}
