//! Ordinary Least Squares regression.
//!
//! Used directly by the time-series linear model, as the first stage of
//! regression with ARIMA errors, as the equation-wise starting point of
//! the SUR estimator and for price elasticities in the exploratory report.

use crate::core::Regressors;
use crate::error::{ForecastError, Result};
use crate::utils::linalg::{dot, gram, invert_spd, solve_spd};
use crate::utils::stats::t_test_p_value;

/// Fitted linear model `y = intercept + X @ coefficients + e`.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Regression coefficients (one per regressor, same order as `regressor_names`).
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
    /// Names of regressors in order.
    pub regressor_names: Vec<String>,
    /// Standard errors, intercept first.
    pub std_errors: Vec<f64>,
    /// Residual variance `SSE / (n - k)`.
    pub residual_variance: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// In-sample fitted values.
    pub fitted: Vec<f64>,
    /// In-sample residuals.
    pub residuals: Vec<f64>,
}

impl OLSResult {
    /// Predict from regressor columns, which must contain every fitted regressor.
    pub fn predict(&self, regressors: &Regressors) -> Result<Vec<f64>> {
        let columns = self.columns_from(regressors)?;
        let n = columns.first().map(|c| c.len()).unwrap_or(0);

        let mut predictions = vec![self.intercept; n];
        for (coef, column) in self.coefficients.iter().zip(&columns) {
            for (pred, x) in predictions.iter_mut().zip(column.iter()) {
                *pred += coef * x;
            }
        }
        Ok(predictions)
    }

    /// Like `predict`, but for a model without regressors returns `n` copies of the intercept.
    pub fn predict_n(&self, regressors: &Regressors, n: usize) -> Result<Vec<f64>> {
        if self.regressor_names.is_empty() {
            return Ok(vec![self.intercept; n]);
        }
        let predictions = self.predict(regressors)?;
        if predictions.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: predictions.len(),
            });
        }
        Ok(predictions)
    }

    fn columns_from<'a>(&self, regressors: &'a Regressors) -> Result<Vec<&'a [f64]>> {
        let mut columns = Vec::with_capacity(self.regressor_names.len());
        for name in &self.regressor_names {
            let values = regressors
                .get(name)
                .ok_or_else(|| ForecastError::MissingRegressor(name.clone()))?;
            if let Some(first) = columns.first().map(|c: &&[f64]| c.len()) {
                if values.len() != first {
                    return Err(ForecastError::DimensionMismatch {
                        expected: first,
                        got: values.len(),
                    });
                }
            }
            columns.push(values.as_slice());
        }
        Ok(columns)
    }

    /// Coefficient of a named regressor.
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.regressor_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.coefficients[i])
    }

    /// Number of regressors (intercept excluded).
    pub fn num_regressors(&self) -> usize {
        self.coefficients.len()
    }

    /// Number of estimated mean parameters (intercept included).
    pub fn num_params(&self) -> usize {
        self.coefficients.len() + 1
    }

    pub fn num_observations(&self) -> usize {
        self.residuals.len()
    }

    /// Residual degrees of freedom.
    pub fn df_resid(&self) -> usize {
        self.num_observations().saturating_sub(self.num_params())
    }

    pub fn sse(&self) -> f64 {
        dot(&self.residuals, &self.residuals)
    }

    /// t statistics, intercept first.
    pub fn t_values(&self) -> Vec<f64> {
        std::iter::once(self.intercept)
            .chain(self.coefficients.iter().copied())
            .zip(&self.std_errors)
            .map(|(b, se)| b / se)
            .collect()
    }

    /// Two-sided p-values, intercept first.
    pub fn p_values(&self) -> Vec<f64> {
        let df = self.df_resid() as f64;
        self.t_values()
            .into_iter()
            .map(|t| t_test_p_value(t, df))
            .collect()
    }

    /// Gaussian log-likelihood at the ML variance estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.num_observations() as f64;
        let sigma2 = self.sse() / n;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0)
    }

    /// Parameters counted by the information criteria: coefficients plus the variance.
    fn ic_params(&self) -> f64 {
        (self.num_params() + 1) as f64
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.ic_params()
    }

    pub fn aicc(&self) -> f64 {
        let n = self.num_observations() as f64;
        let k = self.ic_params();
        if n - k - 1.0 <= 0.0 {
            return f64::INFINITY;
        }
        self.aic() + 2.0 * k * (k + 1.0) / (n - k - 1.0)
    }

    pub fn bic(&self) -> f64 {
        let n = self.num_observations() as f64;
        -2.0 * self.log_likelihood() + self.ic_params() * n.ln()
    }
}

/// Fit OLS regression with an intercept by solving the normal equations.
///
/// With no regressors the intercept is the mean of `y`.
pub fn ols_fit(y: &[f64], regressors: &Regressors) -> Result<OLSResult> {
    let n = y.len();
    if n == 0 {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    let regressor_names: Vec<String> = regressors.keys().cloned().collect();
    for values in regressors.values() {
        if values.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: values.len(),
            });
        }
    }

    let num_params = regressor_names.len() + 1;
    if n < num_params {
        return Err(ForecastError::InsufficientData {
            needed: num_params,
            got: n,
        });
    }

    let ones = vec![1.0; n];
    let mut columns: Vec<&[f64]> = vec![ones.as_slice()];
    columns.extend(regressors.values().map(|v| v.as_slice()));

    let mut xtx = gram(&columns);
    let xty: Vec<f64> = columns.iter().map(|c| dot(c, y)).collect();

    // small ridge on the diagonal for near-collinear designs
    for (i, row) in xtx.iter_mut().enumerate() {
        row[i] += 1e-8;
    }

    let beta = solve_spd(&xtx, &xty).map_err(|_| {
        ForecastError::ComputationError(
            "OLS regression failed: design matrix is rank deficient".into(),
        )
    })?;

    let fitted: Vec<f64> = (0..n)
        .map(|t| columns.iter().zip(&beta).map(|(c, b)| c[t] * b).sum())
        .collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, f)| a - f).collect();

    let sse = dot(&residuals, &residuals);
    let df = n - num_params;
    let residual_variance = if df > 0 { sse / df as f64 } else { f64::NAN };

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst == 0.0 { 1.0 } else { 1.0 - sse / sst };

    let std_errors = match invert_spd(&xtx) {
        Ok(inv) => (0..num_params)
            .map(|i| (residual_variance * inv[i][i]).sqrt())
            .collect(),
        Err(_) => vec![f64::NAN; num_params],
    };

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        regressor_names,
        std_errors,
        residual_variance,
        r_squared,
        fitted,
        residuals,
    })
}

/// Residuals `y - y_hat` of a fitted model on (possibly new) data.
pub fn ols_residuals(
    y: &[f64],
    ols_result: &OLSResult,
    regressors: &Regressors,
) -> Result<Vec<f64>> {
    let predictions = ols_result.predict_n(regressors, y.len())?;
    Ok(y.iter()
        .zip(predictions.iter())
        .map(|(yi, pi)| yi - pi)
        .collect())
}
