//! Box-Cox power transformation.
//!
//! The study models log volume, the `lambda = 0` member of this family;
//! the profile-likelihood `lambda` is reported by the exploratory analysis
//! as a check that the log is a reasonable choice.

use crate::error::{ForecastError, Result};

const LOG_LAMBDA_EPS: f64 = 1e-10;

/// Apply Box-Cox transformation with a given lambda.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda
/// For lambda == 0: y = ln(x)
///
/// Non-positive inputs are rejected.
pub fn boxcox(series: &[f64], lambda: f64) -> Result<Vec<f64>> {
    series
        .iter()
        .map(|&x| {
            if x <= 0.0 || !x.is_finite() {
                Err(ForecastError::InvalidParameter(format!(
                    "Box-Cox requires positive finite values, got {x}"
                )))
            } else if lambda.abs() < LOG_LAMBDA_EPS {
                Ok(x.ln())
            } else {
                Ok((x.powf(lambda) - 1.0) / lambda)
            }
        })
        .collect()
}

/// Inverse Box-Cox transformation.
///
/// For lambda != 0: x = (lambda * y + 1)^(1/lambda)
/// For lambda == 0: x = exp(y)
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| {
            if lambda.abs() < LOG_LAMBDA_EPS {
                y.exp()
            } else {
                let base = lambda * y + 1.0;
                if base <= 0.0 {
                    f64::NAN
                } else {
                    base.powf(1.0 / lambda)
                }
            }
        })
        .collect()
}

/// Profile log-likelihood of `lambda` (constants dropped).
fn boxcox_llf(series: &[f64], log_sum: f64, lambda: f64) -> f64 {
    let Ok(transformed) = boxcox(series, lambda) else {
        return f64::NEG_INFINITY;
    };
    let n = transformed.len() as f64;
    let mean = transformed.iter().sum::<f64>() / n;
    let variance = transformed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if variance <= 0.0 || !variance.is_finite() {
        return f64::NEG_INFINITY;
    }
    -0.5 * n * variance.ln() + (lambda - 1.0) * log_sum
}

/// `(lambda, llf)` maximising the likelihood over `grid`, starting from `start`.
fn best_on_grid(
    series: &[f64],
    log_sum: f64,
    grid: impl Iterator<Item = f64>,
    start: (f64, f64),
) -> (f64, f64) {
    grid.fold(start, |best, lambda| {
        let llf = boxcox_llf(series, log_sum, lambda);
        if llf > best.1 {
            (lambda, llf)
        } else {
            best
        }
    })
}

/// Maximum-likelihood lambda on `[-2, 2]`: coarse grid, then a refined grid.
pub fn boxcox_lambda(series: &[f64]) -> Result<f64> {
    if series.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            got: series.len(),
        });
    }
    if series.iter().any(|&x| x <= 0.0 || !x.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "Box-Cox requires positive finite values".into(),
        ));
    }

    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    let coarse = best_on_grid(
        series,
        log_sum,
        (-40..=40).map(|i| i as f64 / 20.0),
        (1.0, f64::NEG_INFINITY),
    );
    let (lo, hi) = ((coarse.0 - 0.05).max(-2.0), (coarse.0 + 0.05).min(2.0));
    let refined = best_on_grid(
        series,
        log_sum,
        (0..=100).map(|i| lo + (hi - lo) * i as f64 / 100.0),
        coarse,
    );

    Ok(refined.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lambda_zero_is_log() {
        let series = vec![1.0, 2.0, 3.0];
        let result = boxcox(&series, 0.0).unwrap();
        for (r, x) in result.iter().zip(&series) {
            assert_relative_eq!(*r, x.ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn lambda_two() {
        let result = boxcox(&[1.0, 2.0, 3.0], 2.0).unwrap();
        assert_relative_eq!(result[1], 1.5, epsilon = 1e-12);
        assert_relative_eq!(result[2], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_non_positive() {
        assert!(boxcox(&[1.0, 0.0], 0.5).is_err());
        assert!(boxcox_lambda(&[1.0, -1.0, 2.0]).is_err());
    }

    #[test]
    fn round_trips() {
        let series = vec![1.5, 20.0, 300.0, 4000.0];
        for lambda in [0.0, 0.5, 1.0, -0.5] {
            let back = inv_boxcox(&boxcox(&series, lambda).unwrap(), lambda);
            for (a, b) in series.iter().zip(&back) {
                assert_relative_eq!(*a, *b, max_relative = 1e-10);
            }
        }
    }

    #[test]
    fn lognormal_data_prefers_log() {
        // exp of an evenly spread sample is log-normal-like
        let series: Vec<f64> = (0..200)
            .map(|i| ((i as f64 / 199.0 - 0.5) * 3.0).exp() * 1000.0)
            .collect();
        let lambda = boxcox_lambda(&series).unwrap();
        assert!(lambda.abs() < 0.3, "lambda = {lambda}");
    }
}
