//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Out-of-sample accuracy of one forecast against held-out actuals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error in percent (None if any actual is zero)
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error in percent
    pub smape: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.iter().chain(predicted).any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }

    let mse = mse(actual, predicted);
    Ok(AccuracyMetrics {
        mae: mae(actual, predicted),
        mse,
        rmse: mse.sqrt(),
        mape: mape(actual, predicted),
        smape: smape(actual, predicted),
    })
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// MAPE in percent; undefined when an actual value is zero.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() || actual.is_empty() || actual.contains(&0.0) {
        return None;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| ((a - p) / a).abs())
        .sum();
    Some(100.0 * sum / actual.len() as f64)
}

/// Calculate SMAPE between two slices.
pub fn smape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let n = actual.len() as f64;
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        * 100.0
        / n
}
