//! Exploratory summaries of the panel.

use crate::core::Regressors;
use crate::data::{Panel, ProductType, WeeklySeries};
use crate::detection::dominant_period;
use crate::error::{ForecastError, Result};
use crate::features::{month_dummies, month_of, trend, LOG_PRICE, TREND};
use crate::transform::boxcox_lambda;
use crate::utils::ols::ols_fit;
use crate::utils::stats::{correlation, mean};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub observations: usize,
    pub regions: usize,
    pub series: usize,
    pub first_week: NaiveDate,
    pub last_week: NaiveDate,
}

/// Price and volume levels of one product type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub product_type: ProductType,
    pub mean_price: f64,
    pub mean_weekly_volume: f64,
    pub total_volume: f64,
    /// Box-Cox lambda of the type's aggregate weekly volume.
    pub boxcox_lambda: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyVolume {
    pub product_type: ProductType,
    pub year: i32,
    pub total_volume: f64,
}

/// Mean log volume of a type in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProfile {
    pub product_type: ProductType,
    pub month: u32,
    pub mean_log_volume: f64,
}

/// Price response and seasonality of one series.
///
/// The regression behind `elasticity`, `trend_slope`, `month_effects` and
/// `r_squared` is `ln(volume) ~ trend + month dummies + ln(price)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDiagnostics {
    pub region: String,
    pub product_type: ProductType,
    pub weeks: usize,
    /// Coefficient of log price.
    pub elasticity: Option<f64>,
    pub elasticity_std_error: Option<f64>,
    /// Weekly growth of log volume.
    pub trend_slope: Option<f64>,
    /// Log-volume shift of each month against January; months absent from
    /// the series are left out.
    pub month_effects: BTreeMap<u32, f64>,
    pub r_squared: Option<f64>,
    pub price_volume_correlation: Option<f64>,
    /// Strongest cycle of the detrended log volume, in weeks.
    pub dominant_period: Option<f64>,
}

/// Everything the exploratory step reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploratoryReport {
    pub summary: DatasetSummary,
    pub by_type: Vec<TypeSummary>,
    pub yearly: Vec<YearlyVolume>,
    pub monthly: Vec<MonthlyProfile>,
    pub series: Vec<SeriesDiagnostics>,
}

impl ExploratoryReport {
    /// Median elasticity over the series of a type.
    pub fn median_elasticity(&self, product_type: ProductType) -> Option<f64> {
        let values: Vec<f64> = self
            .series
            .iter()
            .filter(|s| s.product_type == product_type)
            .filter_map(|s| s.elasticity)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(crate::utils::stats::median(&values))
        }
    }
}

/// Summarise the panel.
pub fn explore(panel: &Panel) -> Result<ExploratoryReport> {
    let (first_week, last_week) = panel.date_range().ok_or(ForecastError::EmptyData)?;
    let summary = DatasetSummary {
        observations: panel.observation_count(),
        regions: panel.regions().len(),
        series: panel.len(),
        first_week,
        last_week,
    };
    info!(
        observations = summary.observations,
        regions = summary.regions,
        series = summary.series,
        "exploring panel"
    );

    let mut by_type = Vec::new();
    let mut yearly = Vec::new();
    let mut monthly = Vec::new();
    for product_type in ProductType::ALL {
        let members: Vec<&WeeklySeries> = panel.of_type(product_type).collect();
        if members.is_empty() {
            continue;
        }
        by_type.push(type_summary(product_type, &members));
        yearly.extend(yearly_volumes(product_type, &members));
        monthly.extend(monthly_profile(product_type, &members));
    }

    let series = panel.iter().map(diagnose).collect();

    Ok(ExploratoryReport {
        summary,
        by_type,
        yearly,
        monthly,
        series,
    })
}

fn type_summary(product_type: ProductType, members: &[&WeeklySeries]) -> TypeSummary {
    let prices: Vec<f64> = members.iter().flat_map(|s| s.prices.iter().copied()).collect();
    let volumes: Vec<f64> = members.iter().flat_map(|s| s.volumes.iter().copied()).collect();

    let mut weekly_total: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for s in members {
        for (week, volume) in s.weeks.iter().zip(&s.volumes) {
            *weekly_total.entry(*week).or_default() += volume;
        }
    }
    let aggregate: Vec<f64> = weekly_total.into_values().collect();
    let boxcox_lambda = match boxcox_lambda(&aggregate) {
        Ok(lambda) => Some(lambda),
        Err(err) => {
            debug!(%product_type, error = %err, "no Box-Cox lambda");
            None
        }
    };

    TypeSummary {
        product_type,
        mean_price: mean(&prices),
        mean_weekly_volume: mean(&volumes),
        total_volume: volumes.iter().sum(),
        boxcox_lambda,
    }
}

fn yearly_volumes(product_type: ProductType, members: &[&WeeklySeries]) -> Vec<YearlyVolume> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for s in members {
        for (week, volume) in s.weeks.iter().zip(&s.volumes) {
            *totals.entry(week.year()).or_default() += volume;
        }
    }
    totals
        .into_iter()
        .map(|(year, total_volume)| YearlyVolume {
            product_type,
            year,
            total_volume,
        })
        .collect()
}

fn monthly_profile(product_type: ProductType, members: &[&WeeklySeries]) -> Vec<MonthlyProfile> {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for s in members {
        for (week, volume) in s.weeks.iter().zip(&s.volumes) {
            by_month.entry(month_of(*week)).or_default().push(volume.ln());
        }
    }
    by_month
        .into_iter()
        .map(|(month, logs)| MonthlyProfile {
            product_type,
            month,
            mean_log_volume: mean(&logs),
        })
        .collect()
}

/// Trend, month dummies and log price for the weeks of a series.
///
/// Months the series never visits get no dummy; an all-zero column makes
/// the design singular.
fn calendar_price_design(series: &WeeklySeries, log_price: Vec<f64>) -> Regressors {
    let mut design: Regressors = month_dummies(&series.weeks)
        .into_iter()
        .filter(|(_, column)| column.iter().any(|v| *v != 0.0))
        .collect();
    design.insert(TREND.to_string(), trend(series.len(), 0));
    design.insert(LOG_PRICE.to_string(), log_price);
    design
}

fn diagnose(series: &WeeklySeries) -> SeriesDiagnostics {
    let log_volume = series.log_volumes();
    let log_price = series.log_prices();

    let fit = ols_fit(&log_volume, &calendar_price_design(series, log_price.clone()))
        .map_err(|err| debug!(series = %series.key, error = %err, "calendar regression failed"))
        .ok();

    let mut time = Regressors::new();
    time.insert(TREND.to_string(), trend(log_volume.len(), 0));
    let dominant = ols_fit(&log_volume, &time)
        .ok()
        .and_then(|detrended| dominant_period(&detrended.residuals, 4.0, log_volume.len() as f64));

    let finite = |v: f64| v.is_finite().then_some(v);
    let month_effects: BTreeMap<u32, f64> = fit
        .as_ref()
        .map(|f| {
            f.regressor_names
                .iter()
                .zip(&f.coefficients)
                .filter_map(|(name, coef)| {
                    let month = name.strip_prefix("month_")?.parse::<u32>().ok()?;
                    Some((month, *coef))
                })
                .collect()
        })
        .unwrap_or_default();
    // std_errors lead with the intercept
    let price_std_error = fit.as_ref().and_then(|f| {
        let i = f.regressor_names.iter().position(|n| n == LOG_PRICE)?;
        f.std_errors.get(i + 1).copied()
    });

    SeriesDiagnostics {
        region: series.key.region.clone(),
        product_type: series.key.product_type,
        weeks: series.len(),
        elasticity: fit.as_ref().and_then(|f| f.coefficient(LOG_PRICE)).and_then(finite),
        elasticity_std_error: price_std_error.and_then(finite),
        trend_slope: fit.as_ref().and_then(|f| f.coefficient(TREND)).and_then(finite),
        month_effects,
        r_squared: fit.as_ref().map(|f| f.r_squared).and_then(finite),
        price_volume_correlation: finite(correlation(&log_price, &log_volume)),
        dominant_period: dominant,
    }
}
