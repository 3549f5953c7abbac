//! Forecaster trait shared by the per-series models.

use crate::core::{Forecast, Regressors, TimeSeries};
use crate::error::Result;
use crate::features::RegressorSet;
use crate::models::ARIMASpec;

/// Common interface of the per-series forecasting models.
///
/// Models that use exogenous regressors read them from the regressors
/// attached to the training [`TimeSeries`] and need the same columns for
/// the forecast window in [`predict_with_exog`](Forecaster::predict_with_exog).
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with intervals at `level` (e.g. 0.95).
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// Predict with the regressor values of the forecast window.
    ///
    /// Models without exogenous inputs ignore `future`.
    fn predict_with_exog(&self, horizon: usize, future: &Regressors) -> Result<Forecast> {
        let _ = future;
        self.predict(horizon)
    }

    /// [`predict_with_exog`](Forecaster::predict_with_exog) with intervals.
    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        future: &Regressors,
        level: f64,
    ) -> Result<Forecast> {
        let _ = future;
        self.predict_with_intervals(horizon, level)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }

    /// Whether the fitted model depends on exogenous regressors.
    fn has_exog(&self) -> bool {
        false
    }

    /// Names of the exogenous regressors the fitted model expects.
    fn exog_names(&self) -> Option<&[String]> {
        None
    }

    /// ARIMA order of the fitted model, for models that select one.
    fn selected_order(&self) -> Option<ARIMASpec> {
        None
    }

    /// One-step residual variance, ignoring undefined residuals.
    fn residual_variance(&self) -> Option<f64> {
        let valid: Vec<f64> = self
            .residuals()?
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect();
        if valid.is_empty() {
            return None;
        }
        Some(valid.iter().map(|r| r * r).sum::<f64>() / valid.len() as f64)
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use avocado_forecast::models::{BoxedForecaster, Naive};
///
/// let model: BoxedForecaster = Box::new(Naive::new());
/// assert_eq!(model.name(), "Naive");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// A named model factory together with the regressors it is fitted on.
///
/// # Example
///
/// ```
/// use avocado_forecast::features::RegressorSet;
/// use avocado_forecast::models::{ModelSpec, Naive, AutoARIMA};
///
/// let specs = vec![
///     ModelSpec::new("naive", || Box::new(Naive::new()), RegressorSet::None),
///     ModelSpec::new("arima_price", || Box::new(AutoARIMA::new()), RegressorSet::Price),
/// ];
///
/// for spec in &specs {
///     let model = spec.create();
///     assert!(!model.is_fitted());
/// }
/// ```
pub struct ModelSpec {
    /// Name used in records and reports
    pub name: &'static str,
    factory: Box<dyn Fn() -> BoxedForecaster + Send + Sync>,
    /// Exogenous inputs attached to the series before fitting
    pub regressors: RegressorSet,
}

impl ModelSpec {
    pub fn new<F>(name: &'static str, factory: F, regressors: RegressorSet) -> Self
    where
        F: Fn() -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Box::new(factory),
            regressors,
        }
    }

    /// Create a new, unfitted model instance.
    pub fn create(&self) -> BoxedForecaster {
        (self.factory)()
    }
}

/// Ordered collection of model specifications.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ModelSpec) {
        self.models.push(spec);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|spec| spec.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }
}
