//! Forecast result structure for holding predictions.

/// A univariate forecast: point predictions and optional interval bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(values: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn values(&self) -> &[f64] {
        &self.point
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Apply a monotone transform to predictions and bounds alike.
    ///
    /// Used to move a log-scale forecast back to the volume scale.
    pub fn map<F>(&self, f: F) -> Forecast
    where
        F: Fn(f64) -> f64,
    {
        Forecast {
            point: self.point.iter().map(|&v| f(v)).collect(),
            lower: self
                .lower
                .as_ref()
                .map(|l| l.iter().map(|&v| f(v)).collect()),
            upper: self
                .upper
                .as_ref()
                .map(|u| u.iter().map(|&v| f(v)).collect()),
        }
    }

    /// Add `offset[h]` to every step, bounds included.
    pub(crate) fn shifted_by(&self, offset: &[f64]) -> Forecast {
        let shift = |values: &[f64]| -> Vec<f64> {
            values.iter().zip(offset).map(|(v, o)| v + o).collect()
        };
        Forecast {
            point: shift(&self.point),
            lower: self.lower.as_deref().map(shift),
            upper: self.upper.as_deref().map(shift),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_from_values() {
        let forecast = Forecast::from_values(vec![1.0, 2.0, 3.0, 4.0]);
        assert!(!forecast.is_empty());
        assert_eq!(forecast.horizon(), 4);
        assert!(!forecast.has_intervals());
        assert_eq!(forecast.values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_forecast() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
        assert!(forecast.lower().is_none());
    }

    #[test]
    fn map_transforms_bounds() {
        let forecast =
            Forecast::from_values_with_intervals(vec![0.0, 1.0], vec![-1.0, 0.0], vec![1.0, 2.0]);
        let exp = forecast.map(f64::exp);

        assert_eq!(exp.values()[0], 1.0);
        assert_eq!(exp.lower().unwrap()[1], 1.0);
        assert!(exp.upper().unwrap()[1] > exp.values()[1]);
    }

    #[test]
    fn shift_adds_offsets() {
        let forecast =
            Forecast::from_values_with_intervals(vec![1.0, 2.0], vec![0.0, 1.0], vec![2.0, 3.0]);
        let shifted = forecast.shifted_by(&[10.0, 20.0]);
        assert_eq!(shifted.values(), &[11.0, 22.0]);
        assert_eq!(shifted.lower().unwrap(), &[10.0, 21.0]);
        assert_eq!(shifted.upper().unwrap(), &[12.0, 23.0]);
    }
}
