//! # avocado-forecast
//!
//! Weekly avocado sales forecasting across US regions.
//!
//! Loads the regional price/volume panel, explores it, and compares
//! per-series models (naive, AutoARIMA with and without price or Fourier
//! regressors, a trend + Fourier linear model) against a seemingly
//! unrelated regression system and an ensemble on a fixed train/test
//! split of every series.
//!
//! ```no_run
//! use avocado_forecast::prelude::*;
//!
//! let panel = Panel::from_observations(load_csv("avocado.csv")?)?;
//! let result = run_study(&panel, &AnalysisConfig::default())?;
//! let report = StudyReport::new(result).with_exploration(explore(&panel)?);
//! println!("{}", report.render_markdown());
//! # Ok::<(), avocado_forecast::ForecastError>(())
//! ```

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod analysis;
pub mod config;
pub mod core;
pub mod data;
pub mod detection;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod split;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::analysis::{explore, ExploratoryReport};
    pub use crate::config::AnalysisConfig;
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::data::{load_csv, Panel, ProductType, SeriesKey};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{run_study, ModelKind, StudyResult};
    pub use crate::report::StudyReport;
    pub use crate::split::TrainTestSplit;
    pub use crate::utils::{calculate_metrics, quantile_normal, AccuracyMetrics};
}
