//! Fourier terms for long, non-integer seasonal periods.
//!
//! Weekly data has a yearly period of 365.25 / 7 weeks, which a seasonal
//! ARIMA cannot represent; a few sine/cosine pairs can.

use crate::core::Regressors;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Weeks per year.
pub const WEEKS_PER_YEAR: f64 = 365.25 / 7.0;

/// Seasonal period and number of harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FourierConfig {
    pub period: f64,
    pub harmonics: usize,
}

impl Default for FourierConfig {
    fn default() -> Self {
        Self {
            period: WEEKS_PER_YEAR,
            harmonics: 2,
        }
    }
}

impl FourierConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.period > 1.0 && self.period.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Fourier period must exceed 1, got {}",
                self.period
            )));
        }
        if self.harmonics == 0 || 2.0 * self.harmonics as f64 > self.period {
            return Err(ForecastError::InvalidParameter(format!(
                "harmonics must be in 1..={} for period {}",
                (self.period / 2.0).floor(),
                self.period
            )));
        }
        Ok(())
    }
}

/// `S{j} = sin(2 pi j t / period)` and `C{j} = cos(2 pi j t / period)`
/// for `t = offset + 1 ..= offset + n`, `j = 1..=k`.
///
/// # Example
///
/// ```
/// use avocado_forecast::features::fourier_terms;
///
/// let terms = fourier_terms(4, 0, 4.0, 1).unwrap();
/// assert!((terms["S1"][0] - 1.0).abs() < 1e-12); // sin(pi / 2)
/// assert!((terms["C1"][1] + 1.0).abs() < 1e-12); // cos(pi)
/// ```
pub fn fourier_terms(n: usize, offset: usize, period: f64, k: usize) -> Result<Regressors> {
    FourierConfig {
        period,
        harmonics: k,
    }
    .validate()?;

    let mut terms = Regressors::new();
    for j in 1..=k {
        let (sin, cos): (Vec<f64>, Vec<f64>) = (offset + 1..=offset + n)
            .map(|t| (2.0 * PI * j as f64 * t as f64 / period).sin_cos())
            .unzip();
        terms.insert(format!("S{j}"), sin);
        terms.insert(format!("C{j}"), cos);
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn names_and_shape() {
        let terms = fourier_terms(10, 0, WEEKS_PER_YEAR, 2).unwrap();
        let names: Vec<&str> = terms.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["C1", "C2", "S1", "S2"]);
        assert!(terms.values().all(|v| v.len() == 10));
    }

    #[test]
    fn continues_across_offset() {
        let whole = fourier_terms(20, 0, 13.0, 3).unwrap();
        let tail = fourier_terms(5, 15, 13.0, 3).unwrap();
        for (name, values) in &tail {
            for (i, v) in values.iter().enumerate() {
                assert_relative_eq!(*v, whole[name][15 + i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn yearly_period_repeats() {
        let terms = fourier_terms(200, 0, 52.0, 1).unwrap();
        assert_relative_eq!(terms["S1"][3], terms["S1"][55], epsilon = 1e-9);
    }

    #[test]
    fn too_many_harmonics() {
        assert!(fourier_terms(10, 0, 4.0, 3).is_err());
        assert!(fourier_terms(10, 0, 52.0, 0).is_err());
        assert!(fourier_terms(10, 0, 0.5, 1).is_err());
    }
}
