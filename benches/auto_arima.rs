//! Benchmarks for AutoARIMA order selection and the SUR system.

use avocado_forecast::core::{Regressors, TimeSeries};
use avocado_forecast::features::{build_regressors, FourierConfig, RegressorSet};
use avocado_forecast::models::{
    AutoARIMA, AutoARIMAConfig, Forecaster, SeeminglyUnrelatedRegression, SurConfig, SurEquation,
};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn log_volume(n: usize, shift: f64, seed: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            11.0 + shift + 0.001 * t
                + 0.1 * (2.0 * std::f64::consts::PI * t / 52.18).sin()
                + 0.05 * ((i * (37 + 2 * seed) + 11 * seed) % 19) as f64 / 19.0
        })
        .collect()
}

fn log_price(n: usize, shift: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 0.1 + shift + 0.05 * (i as f64 * 0.4).cos())
        .collect()
}

fn series(n: usize, set: RegressorSet) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2015, 1, 4).unwrap();
    let dates = (0..n).map(|i| start + Duration::weeks(i as i64)).collect();
    let regs = build_regressors(set, &log_price(n, 0.0), 0, &FourierConfig::default()).unwrap();
    TimeSeries::new(dates, log_volume(n, 0.0, 0))
        .unwrap()
        .with_regressors(regs)
        .unwrap()
}

fn bench_auto_arima(c: &mut Criterion) {
    let mut group = c.benchmark_group("auto_arima");
    group.sample_size(10);

    for set in [RegressorSet::None, RegressorSet::Price, RegressorSet::Fourier] {
        let ts = series(135, set);
        group.bench_with_input(BenchmarkId::new("fit_135", format!("{set:?}")), &ts, |b, ts| {
            b.iter(|| {
                let mut model = AutoARIMA::with_config(AutoARIMAConfig::default());
                model.fit(black_box(ts)).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_sur(c: &mut Criterion) {
    let mut group = c.benchmark_group("sur");
    group.sample_size(10);

    for m in [4usize, 16, 32] {
        let equations: Vec<SurEquation> = (0..m)
            .map(|j| {
                let shift = j as f64 * 0.01;
                let regs: Regressors = build_regressors(
                    RegressorSet::PriceFourier,
                    &log_price(135, shift),
                    0,
                    &FourierConfig::default(),
                )
                .unwrap();
                SurEquation::new(format!("eq{j}"), log_volume(135, shift, j), regs)
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("fgls", m), &equations, |b, eqs| {
            b.iter(|| {
                SeeminglyUnrelatedRegression::fit(black_box(eqs.clone()), SurConfig::default())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_auto_arima, bench_sur);
criterion_main!(benches);
