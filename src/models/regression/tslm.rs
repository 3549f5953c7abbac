//! Time-series linear model: OLS on a linear trend plus the series regressors.

use crate::core::{Forecast, Regressors, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::features::{trend, TREND};
use crate::models::Forecaster;
use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::stats::quantile_normal;

/// Linear regression of the series on `trend` and every attached regressor.
///
/// The trend is the 1-based week index of the training window and is
/// extended past its end when forecasting, so callers only supply the
/// remaining regressors (Fourier terms, prices) for the forecast window.
#[derive(Debug, Clone, Default)]
pub struct TSLM {
    ols: Option<OLSResult>,
    exog_names: Vec<String>,
    n: usize,
}

impl TSLM {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fitted regression, trend coefficient included.
    pub fn regression(&self) -> Option<&OLSResult> {
        self.ols.as_ref()
    }

    fn design_for(&self, horizon: usize, future: &Regressors) -> Result<Regressors> {
        let mut design = Regressors::new();
        for name in &self.exog_names {
            let values = future
                .get(name)
                .ok_or_else(|| ForecastError::MissingRegressor(name.clone()))?;
            if values.len() != horizon {
                return Err(ForecastError::DimensionMismatch {
                    expected: horizon,
                    got: values.len(),
                });
            }
            design.insert(name.clone(), values.clone());
        }
        design.insert(TREND.to_string(), trend(horizon, self.n));
        Ok(design)
    }
}

impl Forecaster for TSLM {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if series.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        if series.regressor(TREND).is_some() {
            return Err(ForecastError::InvalidParameter(format!(
                "regressor name '{TREND}' is reserved for the model trend"
            )));
        }

        let mut design = series.regressors().clone();
        design.insert(TREND.to_string(), trend(series.len(), 0));

        self.ols = Some(ols_fit(series.values(), &design)?);
        self.exog_names = series.regressors().keys().cloned().collect();
        self.n = series.len();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.predict_with_exog(horizon, &Regressors::new())
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.predict_with_exog_intervals(horizon, &Regressors::new(), level)
    }

    fn predict_with_exog(&self, horizon: usize, future: &Regressors) -> Result<Forecast> {
        let ols = self.ols.as_ref().ok_or(ForecastError::FitRequired)?;
        let design = self.design_for(horizon, future)?;
        Ok(Forecast::from_values(ols.predict_n(&design, horizon)?))
    }

    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        future: &Regressors,
        level: f64,
    ) -> Result<Forecast> {
        let point = self.predict_with_exog(horizon, future)?;
        let ols = self.ols.as_ref().ok_or(ForecastError::FitRequired)?;
        let sigma = ols.residual_variance.sqrt();
        if !sigma.is_finite() {
            return Ok(point);
        }

        let margin = quantile_normal((1.0 + level) / 2.0) * sigma;
        let lower = point.values().iter().map(|p| p - margin).collect();
        let upper = point.values().iter().map(|p| p + margin).collect();
        Ok(Forecast::from_values_with_intervals(
            point.values().to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.ols.as_ref().map(|o| o.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.ols.as_ref().map(|o| o.residuals.as_slice())
    }

    fn name(&self) -> &str {
        "TSLM"
    }

    fn has_exog(&self) -> bool {
        !self.exog_names.is_empty()
    }

    fn exog_names(&self) -> Option<&[String]> {
        if self.exog_names.is_empty() {
            None
        } else {
            Some(&self.exog_names)
        }
    }

    fn residual_variance(&self) -> Option<f64> {
        self.ols.as_ref().map(|o| o.residual_variance)
    }
}
