//! Fixed train/test split at the end of a series.

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Train on `train` weeks, hold out the `test` weeks that follow.
///
/// The split uses the most recent `train + test` observations; anything
/// older is dropped so every series is evaluated on the same horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainTestSplit {
    pub train: usize,
    pub test: usize,
}

impl Default for TrainTestSplit {
    fn default() -> Self {
        Self {
            train: 135,
            test: 34,
        }
    }
}

impl TrainTestSplit {
    pub fn new(train: usize, test: usize) -> Self {
        Self { train, test }
    }

    /// Observations needed.
    pub fn span(&self) -> usize {
        self.train + self.test
    }

    /// Index of the first observation used from a series of length `len`.
    pub fn window_start(&self, len: usize) -> Result<usize> {
        if self.train == 0 || self.test == 0 {
            return Err(ForecastError::InvalidParameter(
                "train and test windows must be non-empty".into(),
            ));
        }
        len.checked_sub(self.span())
            .ok_or(ForecastError::InsufficientData {
                needed: self.span(),
                got: len,
            })
    }

    /// `(train, test)` series from the last `train + test` observations.
    pub fn split(&self, series: &TimeSeries) -> Result<(TimeSeries, TimeSeries)> {
        let start = self.window_start(series.len())?;
        series
            .slice(start, series.len())?
            .split_at(self.train)
    }
}
