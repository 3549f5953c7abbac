//! Features derived from the weekly panel.
//!
//! - [`trend`]: linear week index
//! - [`month_of`] / [`month_dummies`]: calendar month
//! - [`fourier_terms`]: yearly seasonality for a non-integer period
//! - [`build_regressors`]: the exogenous columns a model is fitted on
//!
//! The log of volume, the third derived feature, lives in
//! [`transform::LogTransform`](crate::transform::LogTransform).

pub mod calendar;
pub mod fourier;
pub mod regressors;

pub use calendar::{month_dummies, month_of, trend, TREND};
pub use fourier::{fourier_terms, FourierConfig, WEEKS_PER_YEAR};
pub use regressors::{build_regressors, RegressorSet, LOG_PRICE};
