//! Augmented Dickey-Fuller unit-root test.
//!
//! Tests whether a spread series is stationary (mean-reverting).
//!
//! # Algorithm
//! 1. Compute first differences: Δy[t] = y[t] - y[t-1]
//! 2. For each lag order p in 0..=maxlag, regress
//!    Δy[t] = α + γ·y[t-1] + Σ δ_i·Δy[t-i] + ε on a common sample
//! 3. Keep the lag order with the lowest AIC
//! 4. Re-fit with that lag order on the longest available sample
//! 5. The t-statistic of γ is the ADF statistic
//! 6. Convert it to a p-value with MacKinnon's (1994) response surface
//!
//! # Mathematical Foundation
//! Under H0 (unit root): γ = 0, the series drifts without bound.
//! Under H1 (stationary): γ < 0, the series reverts to a fixed mean.
//! A small p-value rejects H0.

use super::ols;
use super::MathError;
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};

/// Minimum series length accepted by the test
const MIN_OBSERVATIONS: usize = 8;

// MacKinnon (1994) surface for the constant-only regression, one series.
const TAU_MAX_C: f64 = 2.74;
const TAU_MIN_C: f64 = -18.83;
const TAU_STAR_C: f64 = -1.61;
const TAU_C_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_C_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// A stationarity test returning a p-value.
///
/// Smaller p-values indicate stronger evidence of mean reversion.
#[cfg_attr(test, mockall::automock)]
pub trait StationarityTest: Send + Sync {
    fn p_value(&self, series: &[f64]) -> Result<f64, MathError>;
}

/// Full output of an ADF run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    /// t-statistic of the lagged level (more negative = more stationary)
    pub statistic: f64,
    pub p_value: f64,
    /// Number of lagged differences selected by AIC
    pub used_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
}

/// ADF test with a constant term and AIC lag selection.
#[derive(Debug, Clone, Default)]
pub struct AugmentedDickeyFuller {
    /// Upper bound for lag search; `None` uses `ceil(12·(n/100)^¼)`
    max_lag: Option<usize>,
}

impl AugmentedDickeyFuller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_lag(max_lag: usize) -> Self {
        Self {
            max_lag: Some(max_lag),
        }
    }

    /// Run the test and return the statistic, p-value and selected lag.
    pub fn run(&self, series: &[f64]) -> Result<AdfResult, MathError> {
        let n = series.len();
        if n < MIN_OBSERVATIONS {
            return Err(MathError::InsufficientObservations {
                needed: MIN_OBSERVATIONS,
                actual: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(MathError::NonFinite("input series"));
        }

        // Leave room for the constant and the lagged level
        let cap = (n / 2).saturating_sub(2);
        let default_lag = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
        let max_lag = self.max_lag.unwrap_or(default_lag).min(cap);

        // Lag search on the common sample implied by max_lag
        let (x_full, y_full) = design(series, max_lag);
        let mut best: Option<(f64, usize)> = None;
        for lags in 0..=max_lag {
            let x = x_full.columns(0, lags + 2).into_owned();
            let Ok(fit) = ols::fit(&x, &y_full) else {
                continue;
            };
            let aic = fit.aic();
            if aic.is_finite() && best.map_or(true, |(best_aic, _)| aic < best_aic) {
                best = Some((aic, lags));
            }
        }
        let (_, used_lag) = best.ok_or(MathError::Singular)?;

        let (x, y) = design(series, used_lag);
        let fit = ols::fit(&x, &y)?;
        let statistic = fit.t_value(1);
        if !statistic.is_finite() {
            return Err(MathError::NonFinite("ADF statistic"));
        }

        Ok(AdfResult {
            statistic,
            p_value: mackinnon_p_value(statistic)?,
            used_lag,
            nobs: fit.nobs,
        })
    }
}

impl StationarityTest for AugmentedDickeyFuller {
    fn p_value(&self, series: &[f64]) -> Result<f64, MathError> {
        self.run(series).map(|r| r.p_value)
    }
}

/// Regression design for `lags` lagged differences.
///
/// Columns: [1, y[t-1], Δy[t-1], ..., Δy[t-lags]]; target Δy[t].
fn design(series: &[f64], lags: usize) -> (DMatrix<f64>, DVector<f64>) {
    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let nobs = diffs.len() - lags;
    let mut x = DMatrix::zeros(nobs, lags + 2);
    let mut y = DVector::zeros(nobs);

    for r in 0..nobs {
        let t = lags + r;
        y[r] = diffs[t];
        x[(r, 0)] = 1.0;
        x[(r, 1)] = series[t];
        for j in 1..=lags {
            x[(r, 1 + j)] = diffs[t - j];
        }
    }

    (x, y)
}

/// Approximate p-value of an ADF statistic (constant, no trend).
pub fn mackinnon_p_value(statistic: f64) -> Result<f64, MathError> {
    if statistic > TAU_MAX_C {
        return Ok(1.0);
    }
    if statistic < TAU_MIN_C {
        return Ok(0.0);
    }

    let coefficients: &[f64] = if statistic <= TAU_STAR_C {
        &TAU_C_SMALLP
    } else {
        &TAU_C_LARGEP
    };
    let z = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * statistic + c);

    let normal = Normal::new(0.0, 1.0).map_err(|_| MathError::NonFinite("normal distribution"))?;
    Ok(normal.cdf(z))
}
