//! Records produced by a study and the files they are written to.

use crate::analysis::ExploratoryReport;
use crate::data::ProductType;
use crate::error::{ForecastError, Result};
use crate::models::InformationCriterion;
use crate::pipeline::{ModelKind, StudyResult};
use crate::utils::stats::median;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::info;

/// One forecast week of one series and model, on the volume scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub region: String,
    pub product_type: ProductType,
    pub week: NaiveDate,
    pub model: ModelKind,
    pub predicted: f64,
    pub actual: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Test-window accuracy of one series and model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub region: String,
    pub product_type: ProductType,
    pub model: ModelKind,
    pub rmse: f64,
    /// Percent; absent when an actual volume is zero.
    pub mape: Option<f64>,
    pub mae: f64,
}

/// Accuracy of one model across every series it forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model: ModelKind,
    pub series: usize,
    pub mean_rmse: f64,
    pub median_rmse: f64,
    pub mean_mape: Option<f64>,
    pub median_mape: Option<f64>,
    /// Series on which the model had the lowest MAPE.
    pub wins: usize,
}

/// ARIMA order chosen for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOrder {
    pub region: String,
    pub product_type: ProductType,
    pub model: ModelKind,
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub criterion: InformationCriterion,
}

/// A series, or one model on a series, left out of the study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFit {
    pub region: String,
    pub product_type: ProductType,
    /// `None` when the whole series was skipped.
    pub model: Option<ModelKind>,
    pub reason: String,
}

/// Per-model summaries, in model order.
pub fn summarize(accuracy: &[AccuracyRecord]) -> Vec<ModelSummary> {
    let mut by_model: BTreeMap<ModelKind, Vec<&AccuracyRecord>> = BTreeMap::new();
    for record in accuracy {
        by_model.entry(record.model).or_default().push(record);
    }

    let mut best: BTreeMap<(&str, ProductType), (ModelKind, f64)> = BTreeMap::new();
    for record in accuracy {
        let Some(mape) = record.mape else { continue };
        let key = (record.region.as_str(), record.product_type);
        match best.get(&key) {
            Some((_, current)) if *current <= mape => {}
            _ => {
                best.insert(key, (record.model, mape));
            }
        }
    }

    by_model
        .into_iter()
        .map(|(model, records)| {
            let rmse: Vec<f64> = records.iter().map(|r| r.rmse).collect();
            let mape: Vec<f64> = records.iter().filter_map(|r| r.mape).collect();
            let average = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
            ModelSummary {
                model,
                series: records.len(),
                mean_rmse: average(&rmse),
                median_rmse: median(&rmse),
                mean_mape: (!mape.is_empty()).then(|| average(&mape)),
                median_mape: (!mape.is_empty()).then(|| median(&mape)),
                wins: best.values().filter(|(m, _)| *m == model).count(),
            }
        })
        .collect()
}

/// Everything a study reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyReport {
    pub series: usize,
    pub summary: Vec<ModelSummary>,
    pub accuracy: Vec<AccuracyRecord>,
    pub forecasts: Vec<ForecastRecord>,
    pub orders: Vec<SelectedOrder>,
    pub skipped: Vec<SkippedFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exploration: Option<ExploratoryReport>,
}

impl StudyReport {
    pub fn new(result: StudyResult) -> Self {
        Self {
            series: result.series,
            summary: summarize(&result.accuracy),
            accuracy: result.accuracy,
            forecasts: result.forecasts,
            orders: result.orders,
            skipped: result.skipped,
            exploration: None,
        }
    }

    pub fn with_exploration(mut self, exploration: ExploratoryReport) -> Self {
        self.exploration = Some(exploration);
        self
    }

    /// Summary of one model.
    pub fn model(&self, model: ModelKind) -> Option<&ModelSummary> {
        self.summary.iter().find(|s| s.model == model)
    }

    /// Model with the lowest mean MAPE.
    pub fn best_model(&self) -> Option<ModelKind> {
        self.summary
            .iter()
            .filter_map(|s| s.mean_mape.map(|m| (s.model, m)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(model, _)| model)
    }

    /// Write `forecasts.csv`, `accuracy.csv`, `summary.csv` and `orders.csv`
    /// into `dir`, creating it if needed.
    pub fn write_csv(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        write_rows(&dir.join("forecasts.csv"), &self.forecasts)?;
        write_rows(&dir.join("accuracy.csv"), &self.accuracy)?;
        write_rows(&dir.join("summary.csv"), &self.summary)?;
        write_rows(&dir.join("orders.csv"), &self.orders)?;
        info!(dir = %dir.display(), "wrote csv reports");
        Ok(())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        info!(path = %path.display(), "wrote json report");
        Ok(())
    }

    pub fn render_markdown(&self) -> String {
        self.to_string()
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let io_error = |e: &dyn fmt::Display| ForecastError::Io(format!("{}: {e}", path.display()));
    let mut writer = csv::Writer::from_path(path).map_err(|e| io_error(&e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| io_error(&e))?;
    }
    writer.flush().map_err(|e| io_error(&e))?;
    Ok(())
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

impl fmt::Display for StudyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Avocado sales forecast study")?;
        writeln!(f)?;

        if let Some(exploration) = &self.exploration {
            let s = &exploration.summary;
            writeln!(f, "## Data")?;
            writeln!(f)?;
            writeln!(
                f,
                "{} observations, {} regions, {} series, weeks {} to {}.",
                s.observations, s.regions, s.series, s.first_week, s.last_week
            )?;
            writeln!(f)?;
            writeln!(
                f,
                "| type | mean price | mean weekly volume | median elasticity | Box-Cox lambda |"
            )?;
            writeln!(f, "|---|---:|---:|---:|---:|")?;
            for t in &exploration.by_type {
                writeln!(
                    f,
                    "| {} | {:.2} | {:.0} | {} | {} |",
                    t.product_type,
                    t.mean_price,
                    t.mean_weekly_volume,
                    optional(exploration.median_elasticity(t.product_type), 2),
                    optional(t.boxcox_lambda, 2)
                )?;
            }
            writeln!(f)?;
        }

        writeln!(f, "## Test-window accuracy")?;
        writeln!(f)?;
        writeln!(f, "{} series evaluated.", self.series)?;
        writeln!(f)?;
        writeln!(
            f,
            "| model | series | mean RMSE | median RMSE | mean MAPE % | median MAPE % | wins |"
        )?;
        writeln!(f, "|---|---:|---:|---:|---:|---:|---:|")?;
        for s in &self.summary {
            writeln!(
                f,
                "| {} | {} | {:.1} | {:.1} | {} | {} | {} |",
                s.model,
                s.series,
                s.mean_rmse,
                s.median_rmse,
                optional(s.mean_mape, 2),
                optional(s.median_mape, 2),
                s.wins
            )?;
        }
        if let Some(best) = self.best_model() {
            writeln!(f)?;
            writeln!(f, "Lowest mean MAPE: **{best}**.")?;
        }

        if !self.orders.is_empty() {
            let mut counts: BTreeMap<(ModelKind, (usize, usize, usize)), usize> = BTreeMap::new();
            for o in &self.orders {
                *counts.entry((o.model, (o.p, o.d, o.q))).or_default() += 1;
            }
            writeln!(f)?;
            writeln!(f, "## Selected ARIMA orders")?;
            writeln!(f)?;
            writeln!(f, "| model | order | series |")?;
            writeln!(f, "|---|---|---:|")?;
            for ((model, (p, d, q)), n) in counts {
                writeln!(f, "| {model} | ({p},{d},{q}) | {n} |")?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Skipped")?;
            writeln!(f)?;
            for s in &self.skipped {
                let model = s.model.map_or_else(|| "all models".to_string(), |m| m.to_string());
                writeln!(f, "- {}/{} ({model}): {}", s.region, s.product_type, s.reason)?;
            }
        }
        Ok(())
    }
}
