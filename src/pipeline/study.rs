//! The forecasting study: fit every model on every series and score the
//! test-window forecasts.

use crate::config::{AnalysisConfig, SurGrouping};
use crate::core::{Forecast, Regressors, TimeSeries};
use crate::data::{Panel, SeriesKey, WeeklySeries};
use crate::error::{ForecastError, Result};
use crate::features::{build_regressors, trend, RegressorSet, TREND};
use crate::models::{Forecaster, SeeminglyUnrelatedRegression, SurEquation};
use crate::pipeline::kind::{univariate_registry, ModelKind};
use crate::report::{AccuracyRecord, ForecastRecord, SelectedOrder, SkippedFit};
use crate::transform::LogTransform;
use crate::utils::metrics::calculate_metrics;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Records produced by [`run_study`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyResult {
    /// Series that entered the study.
    pub series: usize,
    pub forecasts: Vec<ForecastRecord>,
    pub accuracy: Vec<AccuracyRecord>,
    pub orders: Vec<SelectedOrder>,
    pub skipped: Vec<SkippedFit>,
}

/// One series cut to the study window, volumes on the log scale.
struct PreparedSeries {
    key: SeriesKey,
    train: TimeSeries,
    test_weeks: Vec<NaiveDate>,
    /// Test-window volumes on the original scale.
    actual: Vec<f64>,
    train_log_prices: Vec<f64>,
    test_log_prices: Vec<f64>,
}

impl PreparedSeries {
    fn prepare(
        series: &WeeklySeries,
        config: &AnalysisConfig,
        transform: &LogTransform,
    ) -> Result<Self> {
        let split = config.split;
        let start = split.window_start(series.len())?;
        let log_volume = transform.forward_series(&series.volume_series()?)?;
        let (train, test) = split.split(&log_volume)?;

        let window = &series.prices[start..start + split.span()];
        let log_prices = transform.forward(window)?;
        let (train_log_prices, test_log_prices) = log_prices.split_at(split.train);

        Ok(Self {
            key: series.key.clone(),
            train,
            test_weeks: test.dates().to_vec(),
            actual: series.volumes[start + split.train..start + split.span()].to_vec(),
            train_log_prices: train_log_prices.to_vec(),
            test_log_prices: test_log_prices.to_vec(),
        })
    }

    fn horizon(&self) -> usize {
        self.test_weeks.len()
    }

    /// Training and test-window regressors; Fourier terms continue across
    /// the split and the test window uses the observed prices.
    fn regressors(
        &self,
        set: RegressorSet,
        config: &AnalysisConfig,
    ) -> Result<(Regressors, Regressors)> {
        let train = build_regressors(set, &self.train_log_prices, 0, &config.fourier)?;
        let test = build_regressors(set, &self.test_log_prices, self.train.len(), &config.fourier)?;
        Ok((train, test))
    }
}

/// Forecasts of every series and model, on the volume scale.
type ForecastTable = BTreeMap<(SeriesKey, ModelKind), Forecast>;

/// Run the study over the panel.
///
/// Series shorter than the split are skipped, as is any model that fails
/// on a series; both are listed in [`StudyResult::skipped`].
pub fn run_study(panel: &Panel, config: &AnalysisConfig) -> Result<StudyResult> {
    config.validate()?;
    let panel = panel.filter_regions(&config.include_regions, &config.exclude_regions);
    if panel.is_empty() {
        return Err(ForecastError::EmptyData);
    }

    let transform = LogTransform::new(config.bias_adjust);
    let mut result = StudyResult::default();

    let mut prepared = Vec::new();
    for series in panel.iter() {
        match PreparedSeries::prepare(series, config, &transform) {
            Ok(p) => prepared.push(p),
            Err(err) => {
                warn!(series = %series.key, error = %err, "skipping series");
                result.skipped.push(skipped(&series.key, None, &err));
            }
        }
    }
    if prepared.is_empty() {
        return Err(ForecastError::InsufficientData {
            needed: config.split.span(),
            got: panel.iter().map(WeeklySeries::len).max().unwrap_or(0),
        });
    }
    result.series = prepared.len();
    info!(
        series = prepared.len(),
        skipped = result.skipped.len(),
        train = config.split.train,
        test = config.split.test,
        "prepared study window"
    );

    let mut table = ForecastTable::new();
    fit_univariate(&prepared, config, &transform, &mut table, &mut result);
    if config.sur.enabled {
        fit_sur(&prepared, config, &transform, &mut table, &mut result);
    }
    if config.ensemble.enabled {
        combine_members(&prepared, config, &mut table, &mut result);
    }

    let by_key: BTreeMap<&SeriesKey, &PreparedSeries> =
        prepared.iter().map(|p| (&p.key, p)).collect();
    for ((key, model), forecast) in &table {
        if let Some(p) = by_key.get(key) {
            record(p, *model, forecast, &mut result);
        }
    }
    info!(
        forecasts = result.accuracy.len(),
        skipped = result.skipped.len(),
        "study complete"
    );
    Ok(result)
}

fn skipped(key: &SeriesKey, model: Option<ModelKind>, err: &ForecastError) -> SkippedFit {
    SkippedFit {
        region: key.region.clone(),
        product_type: key.product_type,
        model,
        reason: err.to_string(),
    }
}

fn fit_univariate(
    prepared: &[PreparedSeries],
    config: &AnalysisConfig,
    transform: &LogTransform,
    table: &mut ForecastTable,
    result: &mut StudyResult,
) {
    let registry = univariate_registry(&config.models, config.arima);
    for &kind in &config.models {
        let Some(spec) = registry.get(kind.as_str()) else {
            continue;
        };
        info!(model = %kind, "fitting per-series model");

        for p in prepared {
            let outcome = p.regressors(spec.regressors, config).and_then(|(train, test)| {
                let series = p.train.clone().with_regressors(train)?;
                let mut model = spec.create();
                model.fit(&series)?;
                let forecast =
                    model.predict_with_exog_intervals(p.horizon(), &test, config.interval_level)?;
                let forecast = transform.inverse_forecast(&forecast, model.residual_variance());
                Ok((forecast, model.selected_order()))
            });

            match outcome {
                Ok((forecast, order)) => {
                    if let Some(order) = order {
                        debug!(series = %p.key, model = %kind, %order, "selected order");
                        result.orders.push(SelectedOrder {
                            region: p.key.region.clone(),
                            product_type: p.key.product_type,
                            model: kind,
                            p: order.p,
                            d: order.d,
                            q: order.q,
                            criterion: config.arima.criterion,
                        });
                    }
                    table.insert((p.key.clone(), kind), forecast);
                }
                Err(err) => {
                    warn!(series = %p.key, model = %kind, error = %err, "model failed");
                    result.skipped.push(skipped(&p.key, Some(kind), &err));
                }
            }
        }
    }
}

/// SUR systems keyed by group name.
fn sur_groups<'a>(
    prepared: &'a [PreparedSeries],
    grouping: SurGrouping,
) -> BTreeMap<String, Vec<&'a PreparedSeries>> {
    let mut groups: BTreeMap<String, Vec<&PreparedSeries>> = BTreeMap::new();
    for p in prepared {
        let group = match grouping {
            SurGrouping::All => "all".to_string(),
            SurGrouping::ByType => p.key.product_type.to_string(),
            SurGrouping::ByRegion => p.key.region.clone(),
        };
        groups.entry(group).or_default().push(p);
    }
    groups
}

/// `log volume ~ trend + log price + Fourier` design of one series.
fn sur_design(p: &PreparedSeries, config: &AnalysisConfig) -> Result<(Regressors, Regressors)> {
    let (mut train, mut test) = p.regressors(ModelKind::Sur.regressors(), config)?;
    let n = p.train.len();
    train.insert(TREND.to_string(), trend(n, 0));
    test.insert(TREND.to_string(), trend(p.horizon(), n));
    Ok((train, test))
}

fn fit_sur(
    prepared: &[PreparedSeries],
    config: &AnalysisConfig,
    transform: &LogTransform,
    table: &mut ForecastTable,
    result: &mut StudyResult,
) {
    for (group, members) in sur_groups(prepared, config.sur.grouping) {
        let outcome = fit_sur_group(&members, config).and_then(|system| {
            members
                .iter()
                .enumerate()
                .map(|(i, p)| -> Result<(SeriesKey, Forecast)> {
                    let (_, future) = sur_design(p, config)?;
                    let name = p.key.to_string();
                    let forecast =
                        system.forecast(&name, &future, p.horizon(), config.interval_level)?;
                    let variance = system.residual_covariance()[i][i];
                    Ok((p.key.clone(), transform.inverse_forecast(&forecast, Some(variance))))
                })
                .collect::<Result<Vec<_>>>()
        });

        match outcome {
            Ok(forecasts) => {
                info!(%group, equations = forecasts.len(), "fitted SUR system");
                for (key, forecast) in forecasts {
                    table.insert((key, ModelKind::Sur), forecast);
                }
            }
            Err(err) => {
                warn!(%group, error = %err, "SUR system failed");
                for p in &members {
                    result.skipped.push(skipped(&p.key, Some(ModelKind::Sur), &err));
                }
            }
        }
    }
}

fn fit_sur_group(
    members: &[&PreparedSeries],
    config: &AnalysisConfig,
) -> Result<SeeminglyUnrelatedRegression> {
    let equations = members
        .iter()
        .map(|p| -> Result<SurEquation> {
            let (train, _) = sur_design(p, config)?;
            Ok(SurEquation::new(p.key.to_string(), p.train.values().to_vec(), train))
        })
        .collect::<Result<Vec<_>>>()?;
    let system = SeeminglyUnrelatedRegression::fit(equations, config.sur.estimation())?;
    debug!(
        equations = system.len(),
        iterations = system.iterations(),
        converged = system.converged(),
        "SUR estimation"
    );
    Ok(system)
}

fn combine_members(
    prepared: &[PreparedSeries],
    config: &AnalysisConfig,
    table: &mut ForecastTable,
    result: &mut StudyResult,
) {
    let combiner = config.ensemble.combiner();
    let members = &config.ensemble.members;
    for p in prepared {
        let forecasts: Option<Vec<Forecast>> = members
            .iter()
            .map(|m| table.get(&(p.key.clone(), *m)).cloned())
            .collect();
        let Some(forecasts) = forecasts else {
            debug!(series = %p.key, "ensemble member missing");
            continue;
        };
        match combiner.combine(&forecasts) {
            Ok(forecast) => {
                table.insert((p.key.clone(), ModelKind::Ensemble), forecast);
            }
            Err(err) => {
                warn!(series = %p.key, error = %err, "ensemble failed");
                result.skipped.push(skipped(&p.key, Some(ModelKind::Ensemble), &err));
            }
        }
    }
}

fn record(p: &PreparedSeries, model: ModelKind, forecast: &Forecast, result: &mut StudyResult) {
    let metrics = match calculate_metrics(&p.actual, forecast.values()) {
        Ok(metrics) => metrics,
        Err(err) => {
            warn!(series = %p.key, model = %model, error = %err, "forecast not scored");
            result.skipped.push(skipped(&p.key, Some(model), &err));
            return;
        }
    };
    result.accuracy.push(AccuracyRecord {
        region: p.key.region.clone(),
        product_type: p.key.product_type,
        model,
        rmse: metrics.rmse,
        mape: metrics.mape,
        mae: metrics.mae,
    });

    for (i, week) in p.test_weeks.iter().enumerate() {
        result.forecasts.push(ForecastRecord {
            region: p.key.region.clone(),
            product_type: p.key.product_type,
            week: *week,
            model,
            predicted: forecast.values()[i],
            actual: p.actual[i],
            lower: forecast.lower().map(|l| l[i]),
            upper: forecast.upper().map(|u| u[i]),
        });
    }
}
