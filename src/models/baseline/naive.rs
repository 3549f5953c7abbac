//! Naive forecasting model.
//!
//! The forecast for every future week is the last observed training value.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::quantile_normal;

/// Naive forecaster that repeats the last value.
#[derive(Debug, Clone, Default)]
pub struct Naive {
    last_value: Option<f64>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl Naive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for Naive {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let Some(&last) = values.last() else {
            return Err(ForecastError::EmptyData);
        };
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }

        // y_hat[t] = y[t-1]; the first week has no prediction
        let fitted: Vec<f64> = std::iter::once(f64::NAN)
            .chain(values[..values.len() - 1].iter().copied())
            .collect();
        let residuals = values
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();

        self.last_value = Some(last);
        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let last = self.last_value.ok_or(ForecastError::FitRequired)?;
        Ok(Forecast::from_values(vec![last; horizon]))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.predict(horizon)?;
        let Some(variance) = self.residual_variance() else {
            return Ok(point);
        };

        let z = quantile_normal((1.0 + level) / 2.0);
        let sigma = variance.sqrt();
        let (lower, upper) = point
            .values()
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                // random-walk error accumulates with sqrt(h)
                let se = sigma * ((i + 1) as f64).sqrt();
                (p - z * se, p + z * se)
            })
            .unzip();

        Ok(Forecast::from_values_with_intervals(
            point.values().to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "Naive"
    }
}
