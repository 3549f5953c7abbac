//! Dated time series with named exogenous regressors.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Named regressor columns, kept in sorted order so that design matrices
/// are built deterministically.
pub type Regressors = BTreeMap<String, Vec<f64>>;

/// A univariate time series indexed by date, optionally carrying
/// exogenous regressors aligned with the observations.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    regressors: Regressors,
    label: Option<String>,
}

impl TimeSeries {
    /// Create a series from dates and values.
    ///
    /// Dates must be strictly increasing and match the number of values.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }

        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::DateError(format!(
                    "dates must be strictly increasing ({} follows {})",
                    pair[1], pair[0]
                )));
            }
        }

        Ok(Self {
            dates,
            values,
            regressors: Regressors::new(),
            label: None,
        })
    }

    /// Attach a regressor, consuming and returning the series.
    pub fn with_regressor(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.set_regressor(name, values)?;
        Ok(self)
    }

    /// Attach every regressor in `regressors`.
    pub fn with_regressors(mut self, regressors: Regressors) -> Result<Self> {
        for (name, values) in regressors {
            self.set_regressor(name, values)?;
        }
        Ok(self)
    }

    /// Attach or replace a regressor.
    pub fn set_regressor(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        if values.len() != self.values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.values.len(),
                got: values.len(),
            });
        }
        self.regressors.insert(name.into(), values);
        Ok(())
    }

    /// Set a descriptive label (e.g. `"Albany/organic"`).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn regressors(&self) -> &Regressors {
        &self.regressors
    }

    pub fn regressor(&self, name: &str) -> Option<&[f64]> {
        self.regressors.get(name).map(|v| v.as_slice())
    }

    pub fn has_regressors(&self) -> bool {
        !self.regressors.is_empty()
    }

    /// Copy of the series with all regressors removed.
    pub fn without_regressors(&self) -> TimeSeries {
        TimeSeries {
            dates: self.dates.clone(),
            values: self.values.clone(),
            regressors: Regressors::new(),
            label: self.label.clone(),
        }
    }

    /// Sub-series over `start..end`, regressors included.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end || end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }

        let regressors = self
            .regressors
            .iter()
            .map(|(name, values)| (name.clone(), values[start..end].to_vec()))
            .collect();

        Ok(TimeSeries {
            dates: self.dates[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            regressors,
            label: self.label.clone(),
        })
    }

    /// Split into `[0, at)` and `[at, len)`.
    pub fn split_at(&self, at: usize) -> Result<(TimeSeries, TimeSeries)> {
        Ok((self.slice(0, at)?, self.slice(at, self.len())?))
    }

    /// Apply `f` to every value, keeping dates and regressors.
    pub fn map_values<F>(&self, f: F) -> TimeSeries
    where
        F: Fn(f64) -> f64,
    {
        TimeSeries {
            dates: self.dates.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
            regressors: self.regressors.clone(),
            label: self.label.clone(),
        }
    }

    /// Check for NaN or infinite values in the observations or regressors.
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
            || self
                .regressors
                .values()
                .any(|col| col.iter().any(|v| !v.is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weeks(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2015, 1, 4).unwrap();
        (0..n)
            .map(|i| base + chrono::Duration::weeks(i as i64))
            .collect()
    }

    #[test]
    fn rejects_unordered_dates() {
        let mut dates = weeks(3);
        dates.swap(0, 1);
        let result = TimeSeries::new(dates, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::DateError(_))));
    }

    #[test]
    fn rejects_length_mismatch() {
        let result = TimeSeries::new(weeks(3), vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn regressors_must_align() {
        let ts = TimeSeries::new(weeks(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(ts.clone().with_regressor("price", vec![1.0]).is_err());

        let ts = ts.with_regressor("price", vec![1.1, 1.2, 1.3]).unwrap();
        assert!(ts.has_regressors());
        assert_eq!(ts.regressor("price").unwrap(), &[1.1, 1.2, 1.3]);
        assert!(ts.regressor("volume").is_none());
    }

    #[test]
    fn split_carries_regressors() {
        let ts = TimeSeries::new(weeks(5), vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
            .with_regressor("x", vec![10.0, 20.0, 30.0, 40.0, 50.0])
            .unwrap()
            .with_label("Albany/organic");

        let (train, test) = ts.split_at(3).unwrap();
        assert_eq!(train.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(test.values(), &[4.0, 5.0]);
        assert_eq!(test.regressor("x").unwrap(), &[40.0, 50.0]);
        assert_eq!(test.dates()[0], ts.dates()[3]);
        assert_eq!(test.label(), Some("Albany/organic"));
    }

    #[test]
    fn slice_out_of_bounds() {
        let ts = TimeSeries::new(weeks(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            ts.slice(1, 4),
            Err(ForecastError::IndexOutOfBounds { index: 4, size: 3 })
        ));
    }

    #[test]
    fn map_values_and_missing() {
        let ts = TimeSeries::new(weeks(3), vec![1.0, 4.0, 9.0]).unwrap();
        let rooted = ts.map_values(f64::sqrt);
        assert_eq!(rooted.values(), &[1.0, 2.0, 3.0]);
        assert!(!rooted.has_missing_values());

        let logged = TimeSeries::new(weeks(2), vec![0.0, 1.0])
            .unwrap()
            .map_values(f64::ln);
        assert!(logged.has_missing_values());
    }
}
