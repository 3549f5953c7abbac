//! Benchmark forecasting methods.

mod naive;

pub use naive::Naive;
