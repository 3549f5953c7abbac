//! Regression models: the per-series time-series linear model and the
//! cross-series seemingly unrelated regression system.

mod sur;
mod tslm;

pub use sur::{SeeminglyUnrelatedRegression, SurConfig, SurEquation, SurEquationFit, INTERCEPT};
pub use tslm::TSLM;
