//! ARIMA models and automatic order selection.
//!
//! - [`ARIMA`] for a fixed (p, d, q), optionally as a regression with ARIMA errors
//! - [`AutoARIMA`] searching (p, q) for a differencing order chosen from the data

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{AutoARIMA, AutoARIMAConfig, InformationCriterion};
pub use diff::{difference, integrate, suggest_differencing};
pub use model::{ARIMASpec, ARIMA};
