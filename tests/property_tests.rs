//! Property-based tests for the forecasting building blocks.

use avocado_forecast::core::{Forecast, TimeSeries};
use avocado_forecast::models::{CombinationMethod, Ensemble, Forecaster, Naive, TSLM};
use avocado_forecast::transform::LogTransform;
use avocado_forecast::utils::metrics::{calculate_metrics, rmse};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

fn make_ts(values: &[f64]) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2015, 1, 4).unwrap();
    let dates = (0..values.len())
        .map(|i| start + Duration::weeks(i as i64))
        .collect();
    TimeSeries::new(dates, values.to_vec()).unwrap()
}

/// Positive weekly volumes with some variation.
fn volumes_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(100.0..1.0e6_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += i as f64 * 0.01;
            }
            v
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn log_transform_round_trips(values in volumes_strategy(1, 60)) {
        let t = LogTransform::default();
        let back = t.inverse(&t.forward(&values).unwrap());
        for (a, b) in values.iter().zip(&back) {
            prop_assert!((a - b).abs() <= 1e-9 * a);
        }
    }

    #[test]
    fn accuracy_metrics_are_non_negative(
        actual in volumes_strategy(1, 40),
        scale in 0.5..1.5_f64,
    ) {
        let predicted: Vec<f64> = actual.iter().map(|a| a * scale).collect();
        let metrics = calculate_metrics(&actual, &predicted).unwrap();
        prop_assert!(metrics.rmse >= 0.0);
        prop_assert!(metrics.mae >= 0.0);
        prop_assert!(metrics.mae <= metrics.rmse + 1e-9);
        prop_assert!(metrics.mape.unwrap() >= 0.0);
        prop_assert!((rmse(&actual, &actual)).abs() < 1e-12);
    }

    #[test]
    fn forecast_length_matches_horizon(
        values in volumes_strategy(10, 80),
        horizon in 1usize..40,
    ) {
        let series = LogTransform::default().forward_series(&make_ts(&values)).unwrap();

        let mut naive = Naive::new();
        naive.fit(&series).unwrap();
        prop_assert_eq!(naive.predict_with_intervals(horizon, 0.95).unwrap().horizon(), horizon);

        let mut tslm = TSLM::new();
        tslm.fit(&series).unwrap();
        prop_assert_eq!(tslm.predict(horizon).unwrap().horizon(), horizon);
    }

    #[test]
    fn back_transformed_intervals_stay_ordered(
        values in volumes_strategy(10, 60),
        horizon in 1usize..20,
    ) {
        let series = LogTransform::default().forward_series(&make_ts(&values)).unwrap();
        let mut model = Naive::new();
        model.fit(&series).unwrap();

        let logged = model.predict_with_intervals(horizon, 0.9).unwrap();
        let volume = LogTransform::new(true).inverse_forecast(&logged, model.residual_variance());
        let (lower, upper) = (volume.lower().unwrap(), volume.upper().unwrap());
        for h in 0..horizon {
            prop_assert!(lower[h] > 0.0);
            prop_assert!(lower[h] <= upper[h]);
        }
    }

    #[test]
    fn mean_ensemble_lies_between_members(
        a in prop::collection::vec(1.0..1000.0_f64, 5),
        b in prop::collection::vec(1.0..1000.0_f64, 5),
    ) {
        let combined = Ensemble::new()
            .with_method(CombinationMethod::Mean)
            .combine(&[Forecast::from_values(a.clone()), Forecast::from_values(b.clone())])
            .unwrap();
        for (h, c) in combined.values().iter().enumerate() {
            prop_assert!(*c >= a[h].min(b[h]) - 1e-9 && *c <= a[h].max(b[h]) + 1e-9);
        }
    }
}
