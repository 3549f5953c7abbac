//! Seemingly unrelated regression (Zellner's SUR) estimated by feasible GLS.
//!
//! Each equation is a linear regression with its own regressors; the
//! equations are linked only through the contemporaneous correlation of
//! their errors. Estimation follows the classic steps:
//!
//! 1. equation-by-equation OLS,
//! 2. residual covariance `s_ij = e_i'e_j / sqrt((T - k_i)(T - k_j))`,
//! 3. GLS on the stacked system with that covariance,
//!
//! with steps 2 and 3 optionally repeated until the coefficients settle.

use crate::core::{Forecast, Regressors};
use crate::error::{ForecastError, Result};
use crate::utils::linalg::{cholesky, dot, invert_spd, solve_spd, Matrix};
use crate::utils::ols::ols_fit;
use crate::utils::stats::quantile_normal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name reported for the intercept coefficient.
pub const INTERCEPT: &str = "(Intercept)";

/// One equation of the system: `y = intercept + regressors @ beta + e`.
#[derive(Debug, Clone)]
pub struct SurEquation {
    pub name: String,
    pub y: Vec<f64>,
    pub regressors: Regressors,
}

impl SurEquation {
    pub fn new(name: impl Into<String>, y: Vec<f64>, regressors: Regressors) -> Self {
        Self {
            name: name.into(),
            y,
            regressors,
        }
    }

    /// Design columns, intercept first.
    fn columns(&self) -> Vec<Vec<f64>> {
        std::iter::once(vec![1.0; self.y.len()])
            .chain(self.regressors.values().cloned())
            .collect()
    }

    fn num_params(&self) -> usize {
        self.regressors.len() + 1
    }
}

/// Estimation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurConfig {
    /// GLS passes; 1 is two-step FGLS, more iterates towards the ML estimate.
    pub max_iterations: usize,
    /// Largest absolute coefficient change that counts as converged.
    pub tolerance: f64,
}

impl Default for SurConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1,
            tolerance: 1e-6,
        }
    }
}

/// Estimates of one equation of a fitted system.
#[derive(Debug, Clone)]
pub struct SurEquationFit {
    pub name: String,
    /// Coefficient names, intercept first.
    pub coefficient_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub r_squared: f64,
}

impl SurEquationFit {
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.coefficient_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.coefficients[i])
    }

    /// Predict from future regressor columns of length `horizon`.
    pub fn predict(&self, future: &Regressors, horizon: usize) -> Result<Vec<f64>> {
        let mut predictions = vec![self.coefficients[0]; horizon];
        for (name, coef) in self.coefficient_names.iter().zip(&self.coefficients).skip(1) {
            let column = future
                .get(name)
                .ok_or_else(|| ForecastError::MissingRegressor(name.clone()))?;
            if column.len() != horizon {
                return Err(ForecastError::DimensionMismatch {
                    expected: horizon,
                    got: column.len(),
                });
            }
            for (p, x) in predictions.iter_mut().zip(column) {
                *p += coef * x;
            }
        }
        Ok(predictions)
    }
}

/// A fitted seemingly unrelated regression system.
///
/// # Example
///
/// ```
/// use avocado_forecast::core::Regressors;
/// use avocado_forecast::models::{SeeminglyUnrelatedRegression, SurConfig, SurEquation};
///
/// let x1: Vec<f64> = (0..40).map(|t| (t as f64 * 0.3).sin()).collect();
/// let x2: Vec<f64> = (0..40).map(|t| (t as f64 * 0.7).cos()).collect();
/// let noise = |t: usize, s: usize| (((t * 31 + s) % 17) as f64 - 8.0) * 0.01;
/// let y1: Vec<f64> = (0..40).map(|t| 1.0 + 2.0 * x1[t] + noise(t, 3)).collect();
/// let y2: Vec<f64> = (0..40).map(|t| -1.0 + 0.5 * x2[t] + noise(t, 5)).collect();
///
/// let eq = |name: &str, y: Vec<f64>, col: &str, x: &Vec<f64>| {
///     let mut regs = Regressors::new();
///     regs.insert(col.to_string(), x.clone());
///     SurEquation::new(name, y, regs)
/// };
/// let system = SeeminglyUnrelatedRegression::fit(
///     vec![eq("a", y1, "x1", &x1), eq("b", y2, "x2", &x2)],
///     SurConfig::default(),
/// )
/// .unwrap();
///
/// assert!((system.equation("a").unwrap().coefficient("x1").unwrap() - 2.0).abs() < 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct SeeminglyUnrelatedRegression {
    equations: Vec<SurEquationFit>,
    residual_covariance: Matrix,
    iterations: usize,
    converged: bool,
    observations: usize,
}

impl SeeminglyUnrelatedRegression {
    /// Estimate the system by (iterated) feasible GLS.
    pub fn fit(equations: Vec<SurEquation>, config: SurConfig) -> Result<Self> {
        let (t_obs, m) = validate(&equations)?;
        let max_iterations = config.max_iterations.max(1);

        let designs: Vec<Vec<Vec<f64>>> = equations.iter().map(SurEquation::columns).collect();
        let sizes: Vec<usize> = equations.iter().map(SurEquation::num_params).collect();
        let offsets: Vec<usize> = sizes
            .iter()
            .scan(0, |acc, k| {
                let start = *acc;
                *acc += k;
                Some(start)
            })
            .collect();

        // step 1: equation-wise OLS
        let mut beta: Vec<f64> = Vec::with_capacity(sizes.iter().sum());
        for eq in &equations {
            let ols = ols_fit(&eq.y, &eq.regressors)?;
            beta.push(ols.intercept);
            beta.extend(&ols.coefficients);
        }

        let mut iterations = 0;
        let mut converged = false;
        let mut system_inverse: Matrix = Vec::new();

        while iterations < max_iterations {
            // step 2: residual covariance from the current coefficients
            let residuals = residuals_of(&equations, &designs, &beta, &offsets);
            let sigma = covariance(&residuals, &sizes, t_obs);
            let sigma_inv = invert_covariance(&sigma)?;

            // step 3: GLS on the stacked system, built block by block
            let total = beta.len();
            let mut a = vec![vec![0.0; total]; total];
            let mut b = vec![0.0; total];
            for i in 0..m {
                for j in 0..m {
                    let w = sigma_inv[i][j];
                    for (r, xr) in designs[i].iter().enumerate() {
                        b[offsets[i] + r] += w * dot(xr, &equations[j].y);
                        for (c, xc) in designs[j].iter().enumerate() {
                            a[offsets[i] + r][offsets[j] + c] += w * dot(xr, xc);
                        }
                    }
                }
            }

            let next = solve_spd(&a, &b).map_err(|_| {
                ForecastError::ComputationError("SUR system matrix is singular".into())
            })?;
            system_inverse = invert_spd(&a)?;

            let change = next
                .iter()
                .zip(&beta)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max);
            beta = next;
            iterations += 1;
            debug!(iteration = iterations, change, "SUR GLS pass");

            if change < config.tolerance {
                converged = true;
                break;
            }
        }

        let residuals = residuals_of(&equations, &designs, &beta, &offsets);
        let residual_covariance = covariance(&residuals, &sizes, t_obs);

        let fits = equations
            .into_iter()
            .zip(residuals)
            .enumerate()
            .map(|(i, (eq, resid))| {
                let range = offsets[i]..offsets[i] + sizes[i];
                let coefficients = beta[range.clone()].to_vec();
                let std_errors = range
                    .map(|r| system_inverse[r][r].max(0.0).sqrt())
                    .collect();
                let fitted: Vec<f64> = eq.y.iter().zip(&resid).map(|(y, e)| y - e).collect();

                let mean = eq.y.iter().sum::<f64>() / t_obs as f64;
                let sst: f64 = eq.y.iter().map(|y| (y - mean).powi(2)).sum();
                let sse = dot(&resid, &resid);
                let r_squared = if sst == 0.0 { 1.0 } else { 1.0 - sse / sst };

                SurEquationFit {
                    coefficient_names: std::iter::once(INTERCEPT.to_string())
                        .chain(eq.regressors.keys().cloned())
                        .collect(),
                    name: eq.name,
                    coefficients,
                    std_errors,
                    fitted,
                    residuals: resid,
                    r_squared,
                }
            })
            .collect();

        Ok(Self {
            equations: fits,
            residual_covariance,
            iterations,
            converged,
            observations: t_obs,
        })
    }

    pub fn equations(&self) -> &[SurEquationFit] {
        &self.equations
    }

    pub fn equation(&self, name: &str) -> Option<&SurEquationFit> {
        self.equations.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// GLS passes performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the coefficient change fell under the tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Residual covariance of the final coefficients (geomean df correction).
    pub fn residual_covariance(&self) -> &Matrix {
        &self.residual_covariance
    }

    /// Residual correlation matrix.
    pub fn residual_correlation(&self) -> Matrix {
        let s = &self.residual_covariance;
        (0..s.len())
            .map(|i| {
                (0..s.len())
                    .map(|j| s[i][j] / (s[i][i] * s[j][j]).sqrt())
                    .collect()
            })
            .collect()
    }

    /// Forecast one equation from its regressors over the forecast window.
    ///
    /// Intervals use the equation's residual variance.
    pub fn forecast(
        &self,
        name: &str,
        future: &Regressors,
        horizon: usize,
        level: f64,
    ) -> Result<Forecast> {
        let index = self
            .equations
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!("unknown SUR equation '{name}'"))
            })?;
        let point = self.equations[index].predict(future, horizon)?;

        let sigma = self.residual_covariance[index][index].sqrt();
        let margin = quantile_normal((1.0 + level) / 2.0) * sigma;
        let lower = point.iter().map(|p| p - margin).collect();
        let upper = point.iter().map(|p| p + margin).collect();
        Ok(Forecast::from_values_with_intervals(point, lower, upper))
    }
}

fn validate(equations: &[SurEquation]) -> Result<(usize, usize)> {
    if equations.len() < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "SUR needs at least 2 equations, got {}",
            equations.len()
        )));
    }
    let t_obs = equations[0].y.len();
    for eq in equations {
        if eq.y.len() != t_obs {
            return Err(ForecastError::DimensionMismatch {
                expected: t_obs,
                got: eq.y.len(),
            });
        }
        if eq.y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if t_obs <= eq.num_params() {
            return Err(ForecastError::InsufficientData {
                needed: eq.num_params() + 1,
                got: t_obs,
            });
        }
    }
    Ok((t_obs, equations.len()))
}

/// Inverse of the residual covariance; rejects (near-)singular matrices.
fn invert_covariance(sigma: &[Vec<f64>]) -> Result<Matrix> {
    let not_pd = || {
        ForecastError::ComputationError("SUR residual covariance is not positive definite".into())
    };
    let l = cholesky(sigma).ok_or_else(not_pd)?;
    if (0..sigma.len()).any(|i| l[i][i] * l[i][i] <= 1e-10 * sigma[i][i]) {
        return Err(not_pd());
    }
    invert_spd(sigma).map_err(|_| not_pd())
}

fn residuals_of(
    equations: &[SurEquation],
    designs: &[Vec<Vec<f64>>],
    beta: &[f64],
    offsets: &[usize],
) -> Vec<Vec<f64>> {
    equations
        .iter()
        .zip(designs)
        .zip(offsets)
        .map(|((eq, columns), &offset)| {
            eq.y
                .iter()
                .enumerate()
                .map(|(t, y)| {
                    let fit: f64 = columns
                        .iter()
                        .enumerate()
                        .map(|(c, col)| col[t] * beta[offset + c])
                        .sum();
                    y - fit
                })
                .collect()
        })
        .collect()
}

fn covariance(residuals: &[Vec<f64>], sizes: &[usize], t_obs: usize) -> Matrix {
    let m = residuals.len();
    let mut sigma = vec![vec![0.0; m]; m];
    for i in 0..m {
        for j in i..m {
            let df = (((t_obs - sizes[i]) * (t_obs - sizes[j])) as f64).sqrt();
            let s = dot(&residuals[i], &residuals[j]) / df;
            sigma[i][j] = s;
            sigma[j][i] = s;
        }
    }
    sigma
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    /// Two equations with errors correlated at roughly 0.8.
    fn correlated_system(t: usize) -> Vec<SurEquation> {
        let mut rng = StdRng::seed_from_u64(7);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let x1: Vec<f64> = (0..t)
            .map(|i| (i as f64 * 0.21).sin() + normal.sample(&mut rng) * 0.3)
            .collect();
        let x2: Vec<f64> = (0..t)
            .map(|i| (i as f64 * 0.13).cos() + normal.sample(&mut rng) * 0.3)
            .collect();

        let mut y1 = Vec::with_capacity(t);
        let mut y2 = Vec::with_capacity(t);
        for i in 0..t {
            let common: f64 = normal.sample(&mut rng);
            let u1: f64 = normal.sample(&mut rng);
            let u2: f64 = normal.sample(&mut rng);
            y1.push(2.0 + 1.5 * x1[i] + 0.2 * (common + 0.5 * u1));
            y2.push(-1.0 - 0.8 * x2[i] + 0.2 * (common + 0.5 * u2));
        }

        let regs = |name: &str, x: Vec<f64>| -> Regressors {
            let mut r = Regressors::new();
            r.insert(name.to_string(), x);
            r
        };
        vec![
            SurEquation::new("first", y1, regs("x1", x1)),
            SurEquation::new("second", y2, regs("x2", x2)),
        ]
    }

    #[test]
    fn recovers_coefficients() {
        let system =
            SeeminglyUnrelatedRegression::fit(correlated_system(200), SurConfig::default())
                .unwrap();

        let first = system.equation("first").unwrap();
        assert_relative_eq!(first.coefficient(INTERCEPT).unwrap(), 2.0, epsilon = 0.1);
        assert_relative_eq!(first.coefficient("x1").unwrap(), 1.5, epsilon = 0.1);
        let second = system.equation("second").unwrap();
        assert_relative_eq!(second.coefficient("x2").unwrap(), -0.8, epsilon = 0.1);

        assert_eq!(system.iterations(), 1);
        assert_eq!(system.len(), 2);
        assert!(first.std_errors.iter().all(|s| s.is_finite() && *s > 0.0));
    }

    #[test]
    fn residual_correlation_is_detected() {
        let system =
            SeeminglyUnrelatedRegression::fit(correlated_system(300), SurConfig::default())
                .unwrap();
        let corr = system.residual_correlation();
        assert_relative_eq!(corr[0][0], 1.0, epsilon = 1e-12);
        assert!(corr[0][1] > 0.6, "correlation {}", corr[0][1]);
        assert_relative_eq!(corr[0][1], corr[1][0], epsilon = 1e-12);
    }

    #[test]
    fn identical_regressors_match_ols() {
        // with the same design in every equation GLS reduces to OLS
        let t = 80;
        let x: Vec<f64> = (0..t).map(|i| (i as f64 * 0.4).sin()).collect();
        let mut regs = Regressors::new();
        regs.insert("x".into(), x.clone());
        let y1: Vec<f64> = (0..t).map(|i| 1.0 + x[i] + ((i * 7 % 5) as f64 - 2.0) * 0.1).collect();
        let y2: Vec<f64> = (0..t).map(|i| 3.0 - x[i] + ((i * 3 % 7) as f64 - 3.0) * 0.1).collect();

        let ols = ols_fit(&y1, &regs).unwrap();
        let system = SeeminglyUnrelatedRegression::fit(
            vec![
                SurEquation::new("a", y1, regs.clone()),
                SurEquation::new("b", y2, regs.clone()),
            ],
            SurConfig::default(),
        )
        .unwrap();

        let a = system.equation("a").unwrap();
        assert_relative_eq!(a.coefficients[0], ols.intercept, epsilon = 1e-6);
        assert_relative_eq!(a.coefficients[1], ols.coefficients[0], epsilon = 1e-6);
    }

    #[test]
    fn iterated_fgls_converges() {
        let config = SurConfig {
            max_iterations: 50,
            tolerance: 1e-8,
        };
        let system = SeeminglyUnrelatedRegression::fit(correlated_system(150), config).unwrap();
        assert!(system.converged());
        assert!(system.iterations() > 1);
    }

    #[test]
    fn forecasts_from_future_regressors() {
        let system =
            SeeminglyUnrelatedRegression::fit(correlated_system(120), SurConfig::default())
                .unwrap();
        let mut future = Regressors::new();
        future.insert("x1".into(), vec![0.0, 1.0]);

        let forecast = system.forecast("first", &future, 2, 0.95).unwrap();
        let eq = system.equation("first").unwrap();
        assert_relative_eq!(forecast.values()[0], eq.coefficients[0], epsilon = 1e-12);
        assert_relative_eq!(
            forecast.values()[1],
            eq.coefficients[0] + eq.coefficients[1],
            epsilon = 1e-12
        );
        assert!(forecast.lower().unwrap()[0] < forecast.values()[0]);

        assert!(matches!(
            system.forecast("second", &future, 2, 0.95),
            Err(ForecastError::MissingRegressor(_))
        ));
        assert!(system.forecast("third", &future, 2, 0.95).is_err());
    }

    #[test]
    fn rejects_bad_systems() {
        let mut equations = correlated_system(50);
        equations.truncate(1);
        assert!(SeeminglyUnrelatedRegression::fit(equations, SurConfig::default()).is_err());

        let mut equations = correlated_system(50);
        equations[1].y.pop();
        assert!(matches!(
            SeeminglyUnrelatedRegression::fit(equations, SurConfig::default()),
            Err(ForecastError::DimensionMismatch { .. })
        ));

        // identical residuals make the covariance singular
        let equations = correlated_system(50);
        let twin = SurEquation::new(
            "twin",
            equations[0].y.clone(),
            equations[0].regressors.clone(),
        );
        let singular = vec![equations[0].clone(), twin];
        assert!(SeeminglyUnrelatedRegression::fit(singular, SurConfig::default()).is_err());
    }
}
