//! Forecasting models.
//!
//! Per-series models implement [`Forecaster`]; the SUR system is fitted
//! across many series at once and the [`Ensemble`] combines finished
//! forecasts.

mod traits;

pub mod arima;
pub mod baseline;
pub mod ensemble;
pub mod regression;

pub use arima::{AutoARIMA, AutoARIMAConfig, InformationCriterion, ARIMASpec, ARIMA};
pub use baseline::Naive;
pub use ensemble::{CombinationMethod, Ensemble};
pub use regression::{SeeminglyUnrelatedRegression, SurConfig, SurEquation, SurEquationFit, TSLM};
pub use traits::{BoxedForecaster, Forecaster, ModelRegistry, ModelSpec};
