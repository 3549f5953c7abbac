//! The forecasting study over the regional panel.
//!
//! Per-series models come from a [`ModelRegistry`](crate::models::ModelRegistry)
//! keyed by [`ModelKind`]; SUR and the ensemble span several series and are
//! run by [`run_study`] itself.

mod kind;
mod study;

pub use kind::{univariate_registry, ModelKind};
pub use study::{run_study, StudyResult};
