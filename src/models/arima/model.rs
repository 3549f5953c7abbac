//! ARIMA (Autoregressive Integrated Moving Average) model.
//!
//! When the training series carries regressors the model is a regression
//! with ARIMA errors: an OLS fit of the series on the regressors, and an
//! ARIMA(p, d, q) fitted to the regression residuals.

use crate::core::{Forecast, Regressors, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, difference_polynomial, integrate, multiply};
use crate::models::arima::InformationCriterion;
use crate::models::Forecaster;
use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::quantile_normal;
use serde::Serialize;
use std::f64::consts::PI;

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// A constant (mean, or drift when `d == 1`) is estimated unless `d >= 2`.
    pub fn has_constant(&self) -> bool {
        self.d < 2
    }

    /// Number of estimated ARMA parameters, constant included.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_constant())
    }

    /// Shortest series the order can be estimated on.
    pub fn min_length(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl std::fmt::Display for ARIMASpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA(p, d, q) estimated by conditional sum of squares.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    intercept: f64,
    /// Series the ARMA part continues from (the regression errors with exog).
    errors: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    /// Innovations on the differenced scale, zero before the first estimable week.
    innovations: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    aic: Option<f64>,
    aicc: Option<f64>,
    bic: Option<f64>,
    regression: Option<OLSResult>,
    exog_names: Vec<String>,
}

impl ARIMA {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            errors: None,
            differenced: None,
            innovations: None,
            fitted: None,
            residuals: None,
            sigma2: None,
            aic: None,
            aicc: None,
            bic: None,
            regression: None,
            exog_names: vec![],
        }
    }

    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Constant of the ARMA part (zero when `d >= 2`).
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Regression stage of a model fitted with regressors.
    pub fn regression(&self) -> Option<&OLSResult> {
        self.regression.as_ref()
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn aicc(&self) -> Option<f64> {
        self.aicc
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    pub fn criterion(&self, criterion: InformationCriterion) -> Option<f64> {
        match criterion {
            InformationCriterion::Aic => self.aic,
            InformationCriterion::Aicc => self.aicc,
            InformationCriterion::Bic => self.bic,
        }
    }

    /// Total number of estimated parameters, regression included.
    ///
    /// The level is counted once: as the OLS intercept when `d == 0` and
    /// as the ARMA drift when `d == 1`. Differencing removes the OLS
    /// intercept, so only the regression slopes are added.
    pub fn num_params(&self) -> usize {
        self.spec.num_params() + self.regression.as_ref().map_or(0, |r| r.num_regressors())
    }

    /// Whether the ARMA part estimates a constant. Regression errors with
    /// `d == 0` are centred by the OLS intercept already.
    fn arma_constant(&self, with_regression: bool) -> bool {
        self.spec.has_constant() && !(with_regression && self.spec.d == 0)
    }

    /// One-step innovations of the ARMA recursion over `w`.
    ///
    /// Innovations before `max(p, q)` are zero (conditioned on).
    fn innovations_for(w: &[f64], ar: &[f64], ma: &[f64], mean: f64) -> Vec<f64> {
        let start = ar.len().max(ma.len());
        let mut e = vec![0.0; w.len()];
        for t in start..w.len() {
            let ar_part: f64 = ar
                .iter()
                .enumerate()
                .map(|(i, phi)| phi * (w[t - 1 - i] - mean))
                .sum();
            let ma_part: f64 = ma
                .iter()
                .enumerate()
                .map(|(i, theta)| theta * e[t - 1 - i])
                .sum();
            e[t] = w[t] - mean - ar_part - ma_part;
        }
        e
    }

    fn css(w: &[f64], ar: &[f64], ma: &[f64], mean: f64) -> f64 {
        let start = ar.len().max(ma.len());
        if w.len() <= start {
            return f64::MAX;
        }
        let css: f64 = Self::innovations_for(w, ar, ma, mean)[start..]
            .iter()
            .map(|e| e * e)
            .sum();
        if css.is_finite() {
            css
        } else {
            f64::MAX
        }
    }

    /// Conditional least squares for (constant, AR, MA).
    fn estimate(&mut self, w: &[f64], with_constant: bool) {
        let (p, q) = (self.spec.p, self.spec.q);
        let mean = if with_constant {
            w.iter().sum::<f64>() / w.len() as f64
        } else {
            0.0
        };

        if p == 0 && q == 0 {
            self.intercept = mean;
            self.ar_coefficients.clear();
            self.ma_coefficients.clear();
            return;
        }

        let offset = usize::from(with_constant);
        let mut initial = Vec::with_capacity(offset + p + q);
        let mut bounds = Vec::with_capacity(offset + p + q);
        if with_constant {
            initial.push(mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for i in 0..p + q {
            let lag = if i < p { i } else { i - p };
            initial.push(0.1 / (lag + 1) as f64);
            // stationarity / invertibility box
            bounds.push((-0.99, 0.99));
        }

        let split = |params: &[f64]| -> (f64, Vec<f64>, Vec<f64>) {
            let constant = if with_constant { params[0] } else { 0.0 };
            (
                constant,
                params[offset..offset + p].to_vec(),
                params[offset + p..].to_vec(),
            )
        };

        let result = nelder_mead(
            |params| {
                let (constant, ar, ma) = split(params);
                Self::css(w, &ar, &ma, constant)
            },
            &initial,
            Some(&bounds),
            NelderMeadConfig::default(),
        );

        let (constant, ar, ma) = split(&result.optimal_point);
        self.intercept = constant;
        self.ar_coefficients = ar;
        self.ma_coefficients = ma;
    }

    /// Psi weights of the integrated process, `psi[0] = 1`.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let ar_poly: Vec<f64> = std::iter::once(1.0)
            .chain(self.ar_coefficients.iter().map(|phi| -phi))
            .collect();
        let full = multiply(&ar_poly, &difference_polynomial(self.spec.d));

        let mut psi = vec![0.0; horizon.max(1)];
        psi[0] = 1.0;
        for j in 1..horizon {
            let theta = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            let ar_part: f64 = (1..full.len().min(j + 1))
                .map(|i| -full[i] * psi[j - i])
                .sum();
            psi[j] = theta + ar_part;
        }
        psi
    }

    /// Forecast of the ARMA part, integrated back to the error scale.
    fn forecast_errors(&self, horizon: usize) -> Result<Vec<f64>> {
        let errors = self.errors.as_ref().ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let e = self.innovations.as_ref().ok_or(ForecastError::FitRequired)?;

        let mut w_ext = w.clone();
        let mut e_ext = e.clone();
        for _ in 0..horizon {
            let t = w_ext.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += phi * (w_ext[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma_coefficients.iter().enumerate() {
                if t > i {
                    pred += theta * e_ext[t - 1 - i];
                }
            }
            w_ext.push(pred);
            e_ext.push(0.0);
        }

        Ok(integrate(&w_ext[w.len()..], errors, self.spec.d))
    }

    fn error_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let point = self.forecast_errors(horizon)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;
        let z = quantile_normal((1.0 + level) / 2.0);

        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (h, p) in point.iter().enumerate() {
            cumulative += psi[h] * psi[h];
            let se = (sigma2 * cumulative).sqrt();
            lower.push(p - z * se);
            upper.push(p + z * se);
        }
        Ok(Forecast::from_values_with_intervals(point, lower, upper))
    }

    fn regression_forecast(&self, horizon: usize, future: &Regressors) -> Result<Option<Vec<f64>>> {
        let Some(regression) = &self.regression else {
            return Ok(None);
        };
        regression.predict_n(future, horizon).map(Some)
    }

    fn require_no_exog(&self) -> Result<()> {
        match self.exog_names.first() {
            Some(name) => Err(ForecastError::MissingRegressor(name.clone())),
            None => Ok(()),
        }
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::from_spec(ARIMASpec::default())
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        let min_len = self.spec.min_length();
        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }

        let (errors, regression) = if series.has_regressors() {
            let ols = ols_fit(values, series.regressors())?;
            (ols.residuals.clone(), Some(ols))
        } else {
            (values.to_vec(), None)
        };

        let w = difference(&errors, self.spec.d);
        self.estimate(&w, self.arma_constant(regression.is_some()));
        let innovations =
            Self::innovations_for(&w, &self.ar_coefficients, &self.ma_coefficients, self.intercept);

        let start = self.spec.p.max(self.spec.q);
        let valid = &innovations[start..];
        let n_eff = valid.len() as f64;
        let sigma2 = valid.iter().map(|e| e * e).sum::<f64>() / n_eff;

        self.exog_names = series.regressors().keys().cloned().collect();
        self.regression = regression;

        let k = self.num_params() as f64;
        let ll = -0.5 * n_eff * (1.0 + sigma2.max(f64::MIN_POSITIVE).ln() + (2.0 * PI).ln());
        let aic = -2.0 * ll + 2.0 * k;
        self.aic = Some(aic);
        self.aicc = Some(if n_eff - k - 1.0 > 0.0 {
            aic + 2.0 * k * (k + 1.0) / (n_eff - k - 1.0)
        } else {
            f64::INFINITY
        });
        self.bic = Some(-2.0 * ll + k * n_eff.ln());
        self.sigma2 = Some(sigma2);

        // innovation at differenced index j belongs to week j + d
        let first = self.spec.d + start;
        let (fitted, residuals) = values
            .iter()
            .enumerate()
            .map(|(t, y)| {
                if t < first {
                    (f64::NAN, f64::NAN)
                } else {
                    let e = innovations[t - self.spec.d];
                    (y - e, e)
                }
            })
            .unzip();

        self.fitted = Some(fitted);
        self.residuals = Some(residuals);
        self.errors = Some(errors);
        self.differenced = Some(w);
        self.innovations = Some(innovations);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.require_no_exog()?;
        Ok(Forecast::from_values(self.forecast_errors(horizon)?))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.require_no_exog()?;
        self.error_intervals(horizon, level)
    }

    fn predict_with_exog(&self, horizon: usize, future: &Regressors) -> Result<Forecast> {
        let errors = Forecast::from_values(self.forecast_errors(horizon)?);
        Ok(match self.regression_forecast(horizon, future)? {
            Some(mean) => errors.shifted_by(&mean),
            None => errors,
        })
    }

    fn predict_with_exog_intervals(
        &self,
        horizon: usize,
        future: &Regressors,
        level: f64,
    ) -> Result<Forecast> {
        let errors = self.error_intervals(horizon, level)?;
        Ok(match self.regression_forecast(horizon, future)? {
            Some(mean) => errors.shifted_by(&mean),
            None => errors,
        })
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }

    fn has_exog(&self) -> bool {
        self.regression.is_some()
    }

    fn exog_names(&self) -> Option<&[String]> {
        if self.exog_names.is_empty() {
            None
        } else {
            Some(&self.exog_names)
        }
    }

    fn selected_order(&self) -> Option<ARIMASpec> {
        Some(self.spec())
    }

    fn residual_variance(&self) -> Option<f64> {
        self.sigma2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn weekly(values: Vec<f64>) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2015, 1, 4).unwrap();
        let dates = (0..values.len())
            .map(|i| start + Duration::weeks(i as i64))
            .collect();
        TimeSeries::new(dates, values).unwrap()
    }

    /// AR(1) with phi = 0.7 driven by a deterministic pseudo-noise sequence.
    fn ar1(n: usize) -> Vec<f64> {
        let mut state = 12345u64;
        let mut noise = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
        };
        let mut y = vec![0.0; n];
        for t in 1..n {
            y[t] = 0.7 * y[t - 1] + noise();
        }
        y.iter().map(|v| v + 10.0).collect()
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&weekly(ar1(400))).unwrap();

        assert_relative_eq!(model.ar_coefficients()[0], 0.7, epsilon = 0.1);
        assert_relative_eq!(model.intercept(), 10.0, epsilon = 0.3);
    }

    #[test]
    fn white_noise_mean_model() {
        let values: Vec<f64> = (0..50).map(|i| 5.0 + if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let mut model = ARIMA::new(0, 0, 0);
        model.fit(&weekly(values)).unwrap();

        let forecast = model.predict(3).unwrap();
        for v in forecast.values() {
            assert_relative_eq!(*v, 5.0, epsilon = 1e-10);
        }
        assert_relative_eq!(model.residual_variance().unwrap(), 0.25, epsilon = 1e-10);
    }

    #[test]
    fn random_walk_with_drift_extends_trend() {
        let values: Vec<f64> = (0..40).map(|i| 2.0 * i as f64).collect();
        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&weekly(values)).unwrap();

        let forecast = model.predict(3).unwrap();
        assert_relative_eq!(forecast.values()[0], 80.0, epsilon = 1e-9);
        assert_relative_eq!(forecast.values()[2], 84.0, epsilon = 1e-9);
    }

    #[test]
    fn fitted_plus_residuals_is_series() {
        let values = ar1(120);
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&weekly(values.clone())).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), values.len());
        assert!(fitted[0].is_nan());
        for t in 2..values.len() {
            assert_relative_eq!(fitted[t] + residuals[t], values[t], epsilon = 1e-10);
        }
    }

    #[test]
    fn information_criteria_are_ordered() {
        let mut model = ARIMA::new(1, 0, 1);
        model.fit(&weekly(ar1(150))).unwrap();

        let aic = model.aic().unwrap();
        let aicc = model.aicc().unwrap();
        let bic = model.bic().unwrap();
        assert!(aicc > aic);
        assert!(bic > aic);
        assert_eq!(model.criterion(InformationCriterion::Bic), Some(bic));
    }

    #[test]
    fn intervals_follow_random_walk_variance() {
        let values: Vec<f64> = ar1(200).iter().scan(0.0, |acc, v| {
            *acc += v - 10.0;
            Some(*acc)
        }).collect();
        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&weekly(values)).unwrap();

        let forecast = model.predict_with_intervals(4, 0.95).unwrap();
        let width = |h: usize| forecast.upper().unwrap()[h] - forecast.lower().unwrap()[h];
        // psi weights of a random walk are all one: se grows with sqrt(h)
        assert_relative_eq!(width(3) / width(0), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn regression_with_arima_errors() {
        let n = 120;
        let price: Vec<f64> = (0..n).map(|i| 0.2 * ((i as f64) * 0.3).sin()).collect();
        let noise = ar1(n);
        let values: Vec<f64> = (0..n)
            .map(|i| 8.0 - 1.5 * price[i] + 0.1 * (noise[i] - 10.0))
            .collect();
        let series = weekly(values).with_regressor("log_price", price).unwrap();

        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&series).unwrap();
        assert!(model.has_exog());
        assert_eq!(model.exog_names().unwrap(), &["log_price".to_string()]);
        let slope = model.regression().unwrap().coefficient("log_price").unwrap();
        assert_relative_eq!(slope, -1.5, epsilon = 0.2);

        assert!(matches!(
            model.predict(2),
            Err(ForecastError::MissingRegressor(_))
        ));

        let mut future = Regressors::new();
        future.insert("log_price".into(), vec![0.0, 0.1]);
        let forecast = model.predict_with_exog_intervals(2, &future, 0.9).unwrap();
        assert_eq!(forecast.horizon(), 2);
        assert!(forecast.values()[1] < forecast.values()[0] + 0.5);
        assert!(forecast.lower().unwrap()[0] < forecast.values()[0]);

        let mut short = Regressors::new();
        short.insert("log_price".into(), vec![0.0]);
        assert!(model.predict_with_exog(2, &short).is_err());
    }

    #[test]
    fn regression_level_is_counted_once() {
        let n = 120;
        let price: Vec<f64> = (0..n).map(|i| 0.2 * ((i as f64) * 0.3).sin()).collect();
        let noise = ar1(n);
        let values: Vec<f64> = (0..n)
            .map(|i| 8.0 - 1.5 * price[i] + 0.1 * (noise[i] - 10.0))
            .collect();
        let series = weekly(values.clone()).with_regressor("log_price", price).unwrap();

        let mut with_exog = ARIMA::new(1, 0, 0);
        with_exog.fit(&series).unwrap();
        // AR coefficient, OLS intercept and the price slope
        assert_eq!(with_exog.num_params(), 3);
        assert_eq!(with_exog.intercept(), 0.0);
        let k = 3.0;
        let n_eff = (n - 1) as f64;
        assert_relative_eq!(
            with_exog.bic().unwrap() - with_exog.aic().unwrap(),
            k * (n_eff.ln() - 2.0),
            epsilon = 1e-9
        );

        let mut drift = ARIMA::new(1, 1, 0);
        drift.fit(&series).unwrap();
        // AR coefficient, drift and the price slope
        assert_eq!(drift.num_params(), 3);

        let mut plain = ARIMA::new(1, 0, 0);
        plain.fit(&weekly(values)).unwrap();
        assert_eq!(plain.num_params(), 2);
        assert!(plain.intercept() > 7.0);
    }

    #[test]
    fn too_short_series() {
        let mut model = ARIMA::new(2, 1, 2);
        assert!(matches!(
            model.fit(&weekly(vec![1.0, 2.0, 3.0])),
            Err(ForecastError::InsufficientData { needed: 5, got: 3 })
        ));
    }
}
