//! Numerical utilities shared by the models and the analysis.

pub mod linalg;
pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, mape, rmse, AccuracyMetrics};
pub use ols::{ols_fit, ols_residuals, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::quantile_normal;
