//! Ordinary least squares.
//!
//! Two entry points: [`slope`] for the simple `y = a + b·x` fit used to
//! estimate hedge ratios, and [`fit`] for the multi-regressor fits needed by
//! the unit-root test (coefficients, standard errors, AIC).

use super::MathError;
use nalgebra::{DMatrix, DVector};

/// Slope of the least-squares line `y = a + b·x`.
///
/// Only `b` is returned; the intercept is discarded by callers that form
/// raw spreads `y - b·x`.
pub fn slope(x: &[f64], y: &[f64]) -> Result<f64, MathError> {
    if x.len() != y.len() {
        return Err(MathError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(MathError::InsufficientObservations {
            needed: 2,
            actual: x.len(),
        });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        covariance += dx * (yi - mean_y);
        var_x += dx * dx;
    }

    if var_x.abs() < f64::EPSILON {
        return Err(MathError::Singular);
    }

    let beta = covariance / var_x;
    if beta.is_finite() {
        Ok(beta)
    } else {
        Err(MathError::NonFinite("regression slope"))
    }
}

/// Result of a multi-regressor OLS fit
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: DVector<f64>,
    pub std_errors: DVector<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    /// t-statistic of coefficient `j`
    pub fn t_value(&self, j: usize) -> f64 {
        self.coefficients[j] / self.std_errors[j]
    }

    /// Akaike information criterion under Gaussian errors.
    ///
    /// `aic = -2·llf + 2k`, `llf = -n/2 · (ln(2π) + ln(ssr/n) + 1)`
    pub fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let k = self.coefficients.len() as f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * k
    }
}

/// Fit `y = X·β + ε` by solving the normal equations.
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit, MathError> {
    let (nobs, k) = x.shape();
    if nobs != y.len() {
        return Err(MathError::LengthMismatch {
            left: nobs,
            right: y.len(),
        });
    }
    if nobs <= k {
        return Err(MathError::InsufficientObservations {
            needed: k + 1,
            actual: nobs,
        });
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x).try_inverse().ok_or(MathError::Singular)?;
    let coefficients = &xtx_inv * (&xt * y);

    let residuals = y - x * &coefficients;
    let ssr = residuals.norm_squared();
    let sigma2 = ssr / (nobs - k) as f64;

    let std_errors = DVector::from_iterator(k, (0..k).map(|j| (sigma2 * xtx_inv[(j, j)]).sqrt()));

    if coefficients.iter().chain(std_errors.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::NonFinite("OLS coefficients"));
    }

    Ok(OlsFit {
        coefficients,
        std_errors,
        ssr,
        nobs,
    })
}
