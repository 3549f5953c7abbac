//! Log transform of sales volume and its back-transform.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Natural-log variance-stabilising transform.
///
/// With `bias_adjust` the back-transform returns the mean rather than the
/// median of the implied log-normal forecast distribution,
/// `exp(y) * (1 + sigma^2 / 2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LogTransform {
    pub bias_adjust: bool,
}

impl LogTransform {
    pub fn new(bias_adjust: bool) -> Self {
        Self { bias_adjust }
    }

    /// `ln(x)` for every value; all values must be positive.
    pub fn forward(&self, values: &[f64]) -> Result<Vec<f64>> {
        values
            .iter()
            .map(|&v| {
                if v > 0.0 && v.is_finite() {
                    Ok(v.ln())
                } else {
                    Err(ForecastError::InvalidParameter(format!(
                        "log transform requires positive values, got {v}"
                    )))
                }
            })
            .collect()
    }

    /// Log the values of a series, keeping its dates and regressors.
    pub fn forward_series(&self, series: &TimeSeries) -> Result<TimeSeries> {
        self.forward(series.values())?;
        Ok(series.map_values(f64::ln))
    }

    pub fn inverse(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| v.exp()).collect()
    }

    /// Back-transform a log-scale forecast.
    ///
    /// `variance` is the log-scale forecast variance used for bias
    /// adjustment; ignored unless `bias_adjust` is set.
    pub fn inverse_forecast(&self, forecast: &Forecast, variance: Option<f64>) -> Forecast {
        let back = forecast.map(f64::exp);
        match (self.bias_adjust, variance) {
            (true, Some(var)) if var.is_finite() && var > 0.0 => {
                let factor = 1.0 + var / 2.0;
                let adjusted: Vec<f64> = back.values().iter().map(|v| v * factor).collect();
                match (back.lower(), back.upper()) {
                    (Some(lower), Some(upper)) => Forecast::from_values_with_intervals(
                        adjusted,
                        lower.to_vec(),
                        upper.to_vec(),
                    ),
                    _ => Forecast::from_values(adjusted),
                }
            }
            _ => back,
        }
    }
}
