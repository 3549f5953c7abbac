//! Automatic ARIMA order selection.

use crate::core::{Forecast, Regressors, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::suggest_differencing;
use crate::models::arima::model::{ARIMASpec, ARIMA};
use crate::models::Forecaster;
use crate::utils::ols::ols_fit;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Criterion minimised over the candidate orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    Aic,
    #[default]
    Aicc,
    Bic,
}

impl std::fmt::Display for InformationCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Aic => "aic",
            Self::Aicc => "aicc",
            Self::Bic => "bic",
        };
        f.write_str(name)
    }
}

/// Configuration for AutoARIMA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoARIMAConfig {
    /// Maximum AR order to consider.
    pub max_p: usize,
    /// Maximum differencing order.
    pub max_d: usize,
    /// Maximum MA order to consider.
    pub max_q: usize,
    pub criterion: InformationCriterion,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
            criterion: InformationCriterion::Aicc,
        }
    }
}

impl AutoARIMAConfig {
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    pub fn with_criterion(mut self, criterion: InformationCriterion) -> Self {
        self.criterion = criterion;
        self
    }
}

/// Automatic ARIMA(p, d, q) selection.
///
/// `d` comes from a variance-ratio differencing test on the series (on the
/// regression residuals when the series carries regressors); `p` and `q`
/// are then searched exhaustively up to the configured maxima and the
/// candidate with the lowest information criterion is kept.
///
/// # Example
///
/// ```
/// use avocado_forecast::core::TimeSeries;
/// use avocado_forecast::models::{AutoARIMA, AutoARIMAConfig, Forecaster};
/// use chrono::{Duration, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2015, 1, 4).unwrap();
/// let dates = (0..60).map(|i| start + Duration::weeks(i)).collect();
/// let values = (0..60).map(|i| 10.0 + 0.05 * i as f64 + ((i * 7) % 5) as f64 * 0.1).collect();
/// let series = TimeSeries::new(dates, values).unwrap();
///
/// let mut model = AutoARIMA::with_config(AutoARIMAConfig::default().with_max_orders(1, 1, 1));
/// model.fit(&series).unwrap();
/// assert!(model.selected_spec().is_some());
/// assert_eq!(model.predict(4).unwrap().horizon(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutoARIMA {
    config: AutoARIMAConfig,
    selected: Option<ARIMA>,
    model_scores: Vec<(ARIMASpec, f64)>,
}

impl AutoARIMA {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Order of the selected model.
    pub fn selected_spec(&self) -> Option<ARIMASpec> {
        self.selected.as_ref().map(ARIMA::spec)
    }

    pub fn selected_model(&self) -> Option<&ARIMA> {
        self.selected.as_ref()
    }

    /// Criterion value of every candidate that could be fitted, best first.
    pub fn model_scores(&self) -> &[(ARIMASpec, f64)] {
        &self.model_scores
    }

    fn candidates(&self, d: usize) -> Vec<ARIMASpec> {
        (0..=self.config.max_p)
            .flat_map(|p| (0..=self.config.max_q).map(move |q| ARIMASpec::new(p, d, q)))
            .collect()
    }

    fn evaluate(&self, series: &TimeSeries, spec: ARIMASpec) -> Option<(ARIMA, f64)> {
        let mut model = ARIMA::from_spec(spec);
        if let Err(err) = model.fit(series) {
            debug!(%spec, error = %err, "candidate failed");
            return None;
        }
        let score = model.criterion(self.config.criterion)?;
        score.is_finite().then_some((model, score))
    }

    fn fitted_model(&self) -> Result<&ARIMA> {
        self.selected.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        const MIN_LENGTH: usize = 10;

        let values = series.values();
        if values.len() < MIN_LENGTH {
            return Err(ForecastError::InsufficientData {
                needed: MIN_LENGTH,
                got: values.len(),
            });
        }

        let d = if series.has_regressors() {
            let ols = ols_fit(values, series.regressors())?;
            suggest_differencing(&ols.residuals)
        } else {
            suggest_differencing(values)
        }
        .min(self.config.max_d);

        self.model_scores.clear();
        self.selected = None;
        let mut best_score = f64::INFINITY;

        for spec in self.candidates(d) {
            if values.len() < spec.min_length() + 3 {
                continue;
            }
            if let Some((model, score)) = self.evaluate(series, spec) {
                self.model_scores.push((spec, score));
                if score < best_score {
                    best_score = score;
                    self.selected = Some(model);
                }
            }
        }

        self.model_scores.sort_by(|a, b| a.1.total_cmp(&b.1));

        match self.selected_spec() {
            Some(spec) => {
                debug!(
                    %spec,
                    criterion = %self.config.criterion,
                    score = best_score,
                    candidates = self.model_scores.len(),
                    "selected order"
                );
                Ok(())
            }
            None => Err(ForecastError::ComputationError(
                "no ARIMA candidate could be fitted".to_string(),
            )),
        }
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.fitted_model()?.predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.fitted_model()?.predict_with_intervals(horizon, level)
    }

    fn predict_with_exog(&self, horizon: usize, future: &Regressors) -> Result<Forecast> {
        self.fitted_model()?.predict_with_exog(horizon, future)
    }

    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        future: &Regressors,
        level: f64,
    ) -> Result<Forecast> {
        self.fitted_model()?
            .predict_with_exog_intervals(horizon, future, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        "AutoARIMA"
    }

    fn has_exog(&self) -> bool {
        self.selected.as_ref().is_some_and(ARIMA::has_exog)
    }

    fn exog_names(&self) -> Option<&[String]> {
        self.selected.as_ref()?.exog_names()
    }

    fn selected_order(&self) -> Option<ARIMASpec> {
        self.selected_spec()
    }

    fn residual_variance(&self) -> Option<f64> {
        self.selected.as_ref()?.residual_variance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn weekly(values: Vec<f64>) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2015, 1, 4).unwrap();
        let dates = (0..values.len())
            .map(|i| start + Duration::weeks(i as i64))
            .collect();
        TimeSeries::new(dates, values).unwrap()
    }

    fn noisy_trend(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 10.0 + 0.05 * i as f64 + (((i * 37) % 11) as f64 - 5.0) * 0.02)
            .collect()
    }

    #[test]
    fn searches_full_grid_and_sorts_scores() {
        let config = AutoARIMAConfig::default().with_max_orders(1, 2, 1);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&weekly(noisy_trend(80))).unwrap();

        let scores = model.model_scores();
        assert!(!scores.is_empty() && scores.len() <= 4);
        assert!(scores.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(model.selected_spec(), Some(scores[0].0));

        let spec = model.selected_spec().unwrap();
        assert!(spec.p <= 1 && spec.q <= 1 && spec.d <= 2);
    }

    #[test]
    fn respects_max_d() {
        let config = AutoARIMAConfig::default().with_max_orders(0, 0, 0);
        let mut model = AutoARIMA::with_config(config);
        model.fit(&weekly(noisy_trend(60))).unwrap();
        assert_eq!(model.selected_spec(), Some(ARIMASpec::new(0, 0, 0)));
    }

    #[test]
    fn forwards_exogenous_regressors() {
        let n = 70;
        let x: Vec<f64> = (0..n).map(|i| ((i as f64) * 0.4).cos()).collect();
        let values: Vec<f64> = noisy_trend(n)
            .iter()
            .zip(&x)
            .map(|(v, xi)| v + 0.8 * xi)
            .collect();
        let series = weekly(values).with_regressor("S1", x).unwrap();

        let mut model = AutoARIMA::with_config(AutoARIMAConfig::default().with_max_orders(1, 1, 1));
        model.fit(&series).unwrap();
        assert!(model.has_exog());

        let mut future = Regressors::new();
        future.insert("S1".into(), vec![1.0, 0.5, 0.0]);
        assert_eq!(model.predict_with_exog(3, &future).unwrap().horizon(), 3);
        assert!(model.predict(3).is_err());
    }

    #[test]
    fn criterion_parses_lowercase() {
        let parsed: InformationCriterion = serde_json::from_str("\"bic\"").unwrap();
        assert_eq!(parsed, InformationCriterion::Bic);
        assert_eq!(InformationCriterion::default().to_string(), "aicc");
    }

    #[test]
    fn short_series_rejected() {
        let mut model = AutoARIMA::new();
        assert!(matches!(
            model.fit(&weekly(vec![1.0; 5])),
            Err(ForecastError::InsufficientData { .. })
        ));
        assert!(matches!(model.predict(1), Err(ForecastError::FitRequired)));
    }
}
