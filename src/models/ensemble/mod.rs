//! Forecast combination.

mod model;

pub use model::{CombinationMethod, Ensemble};
