//! Combination of forecasts produced by different models for the same weeks.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::utils::stats::median;
use serde::{Deserialize, Serialize};

/// Method for combining member forecasts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinationMethod {
    /// Simple average of the members.
    #[default]
    Mean,
    /// Median of the members at each step.
    Median,
    /// Weighted average with user weights, normalised to sum to one.
    Custom,
}

/// Combines aligned forecasts step by step.
///
/// Members are combined on whatever scale they are given; the study
/// combines back-transformed volumes. Bounds are combined the same way as
/// the points when every member carries them.
///
/// # Example
///
/// ```
/// use avocado_forecast::core::Forecast;
/// use avocado_forecast::models::Ensemble;
///
/// let arima = Forecast::from_values(vec![100.0, 110.0]);
/// let sur = Forecast::from_values(vec![120.0, 90.0]);
///
/// let combined = Ensemble::new().combine(&[arima, sur]).unwrap();
/// assert_eq!(combined.values(), &[110.0, 100.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ensemble {
    method: CombinationMethod,
    weights: Option<Vec<f64>>,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: CombinationMethod) -> Self {
        self.method = method;
        self
    }

    /// Use custom weights, one per member in the order passed to `combine`.
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self.method = CombinationMethod::Custom;
        self
    }

    pub fn method(&self) -> CombinationMethod {
        self.method
    }

    /// Normalised weights for `members` forecasts.
    pub fn weights(&self, members: usize) -> Result<Vec<f64>> {
        match (&self.method, &self.weights) {
            (CombinationMethod::Custom, Some(weights)) => {
                if weights.len() != members {
                    return Err(ForecastError::DimensionMismatch {
                        expected: members,
                        got: weights.len(),
                    });
                }
                let sum: f64 = weights.iter().sum();
                if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) || sum <= 0.0 {
                    return Err(ForecastError::InvalidParameter(
                        "ensemble weights must be non-negative with a positive sum".into(),
                    ));
                }
                Ok(weights.iter().map(|w| w / sum).collect())
            }
            (CombinationMethod::Custom, None) => Err(ForecastError::InvalidParameter(
                "custom combination requires weights".into(),
            )),
            _ => Ok(vec![1.0 / members as f64; members]),
        }
    }

    fn combine_values(&self, rows: &[&[f64]], weights: &[f64]) -> Vec<f64> {
        let horizon = rows.first().map_or(0, |r| r.len());
        (0..horizon)
            .map(|h| match self.method {
                CombinationMethod::Median => {
                    let column: Vec<f64> = rows.iter().map(|r| r[h]).collect();
                    median(&column)
                }
                CombinationMethod::Mean | CombinationMethod::Custom => {
                    rows.iter().zip(weights).map(|(r, w)| r[h] * w).sum()
                }
            })
            .collect()
    }

    /// Combine member forecasts of equal horizon.
    pub fn combine(&self, members: &[Forecast]) -> Result<Forecast> {
        let Some(first) = members.first() else {
            return Err(ForecastError::EmptyData);
        };
        let horizon = first.horizon();
        if let Some(bad) = members.iter().find(|m| m.horizon() != horizon) {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: bad.horizon(),
            });
        }

        let weights = self.weights(members.len())?;
        let points: Vec<&[f64]> = members.iter().map(Forecast::values).collect();
        let point = self.combine_values(&points, &weights);

        let lowers: Option<Vec<&[f64]>> = members.iter().map(Forecast::lower).collect();
        let uppers: Option<Vec<&[f64]>> = members.iter().map(Forecast::upper).collect();
        Ok(match (lowers, uppers) {
            (Some(lowers), Some(uppers)) => Forecast::from_values_with_intervals(
                point,
                self.combine_values(&lowers, &weights),
                self.combine_values(&uppers, &weights),
            ),
            _ => Forecast::from_values(point),
        })
    }
}
