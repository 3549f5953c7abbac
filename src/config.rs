//! Study configuration.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration and a file only needs the settings it changes.

use crate::error::{ForecastError, Result};
use crate::features::FourierConfig;
use crate::models::{AutoARIMAConfig, CombinationMethod, Ensemble, SurConfig};
use crate::pipeline::ModelKind;
use crate::split::TrainTestSplit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// How series are grouped into SUR systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurGrouping {
    /// One system over every series.
    #[default]
    All,
    /// One system per product type.
    ByType,
    /// One system per region, linking its conventional and organic series.
    ByRegion,
}

/// SUR settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurSettings {
    pub enabled: bool,
    pub grouping: SurGrouping,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for SurSettings {
    fn default() -> Self {
        let estimation = SurConfig::default();
        Self {
            enabled: true,
            grouping: SurGrouping::All,
            max_iterations: estimation.max_iterations,
            tolerance: estimation.tolerance,
        }
    }
}

impl SurSettings {
    pub fn estimation(&self) -> SurConfig {
        SurConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }
}

/// Ensemble settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleSettings {
    pub enabled: bool,
    pub members: Vec<ModelKind>,
    pub method: CombinationMethod,
    /// Member weights for the `custom` method, in `members` order.
    pub weights: Option<Vec<f64>>,
}

impl Default for EnsembleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            members: vec![ModelKind::Arima, ModelKind::Sur],
            method: CombinationMethod::Mean,
            weights: None,
        }
    }
}

impl EnsembleSettings {
    pub fn combiner(&self) -> Ensemble {
        match &self.weights {
            Some(weights) if self.method == CombinationMethod::Custom => {
                Ensemble::new().with_weights(weights.clone())
            }
            _ => Ensemble::new().with_method(self.method),
        }
    }
}

/// Settings of a forecasting study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub split: TrainTestSplit,
    pub fourier: FourierConfig,
    pub arima: AutoARIMAConfig,
    pub sur: SurSettings,
    pub ensemble: EnsembleSettings,
    /// Back-transform to the mean instead of the median volume.
    pub bias_adjust: bool,
    pub interval_level: f64,
    /// Regions to keep; empty keeps every region.
    pub include_regions: Vec<String>,
    pub exclude_regions: Vec<String>,
    /// Per-series models to fit.
    pub models: Vec<ModelKind>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            split: TrainTestSplit::default(),
            fourier: FourierConfig::default(),
            arima: AutoARIMAConfig::default(),
            sur: SurSettings::default(),
            ensemble: EnsembleSettings::default(),
            bias_adjust: false,
            interval_level: 0.95,
            include_regions: Vec::new(),
            exclude_regions: vec!["TotalUS".to_string()],
            models: ModelKind::UNIVARIATE.to_vec(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ForecastError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(ForecastError::Config(msg)) };

        if self.split.train == 0 || self.split.test == 0 {
            return invalid("split.train and split.test must be positive".into());
        }
        if !(self.interval_level > 0.0 && self.interval_level < 1.0) {
            return invalid(format!(
                "interval_level must be in (0, 1), got {}",
                self.interval_level
            ));
        }
        self.fourier
            .validate()
            .map_err(|e| ForecastError::Config(format!("fourier: {e}")))?;

        if self.sur.max_iterations == 0 {
            return invalid("sur.max_iterations must be at least 1".into());
        }
        if !(self.sur.tolerance > 0.0) {
            return invalid("sur.tolerance must be positive".into());
        }

        if let Some(kind) = self.models.iter().find(|k| !k.is_univariate()) {
            return invalid(format!("'{kind}' is not a per-series model"));
        }
        if let Some(kind) = first_repeat(&self.models) {
            return invalid(format!("model '{kind}' is listed more than once"));
        }

        if self.ensemble.enabled {
            let members = &self.ensemble.members;
            if members.is_empty() {
                return invalid("ensemble.members must not be empty".into());
            }
            if members.contains(&ModelKind::Ensemble) {
                return invalid("ensemble cannot be its own member".into());
            }
            if let Some(member) = first_repeat(members) {
                return invalid(format!("ensemble member '{member}' is listed more than once"));
            }
            for member in members {
                let available = if *member == ModelKind::Sur {
                    self.sur.enabled
                } else {
                    self.models.contains(member)
                };
                if !available {
                    return invalid(format!("ensemble member '{member}' is not enabled"));
                }
            }
            self.ensemble
                .combiner()
                .weights(members.len())
                .map_err(|e| ForecastError::Config(format!("ensemble: {e}")))?;
        }
        Ok(())
    }
}

fn first_repeat(kinds: &[ModelKind]) -> Option<ModelKind> {
    let mut seen = BTreeSet::new();
    kinds.iter().copied().find(|kind| !seen.insert(*kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InformationCriterion;

    #[test]
    fn empty_object_gives_defaults() {
        let config = AnalysisConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.split.span(), 169);
        assert_eq!(config.exclude_regions, vec!["TotalUS"]);
        assert_eq!(config.models.len(), 5);
        assert_eq!(config.ensemble.members, vec![ModelKind::Arima, ModelKind::Sur]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let json = r#"{
            "split": { "test": 20 },
            "arima": { "max_p": 1, "criterion": "bic" },
            "sur": { "grouping": "by_type", "max_iterations": 5 },
            "models": ["naive", "arima_price"],
            "ensemble": { "members": ["arima_price", "sur"], "method": "median" }
        }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();

        assert_eq!(config.split, TrainTestSplit::new(135, 20));
        assert_eq!(config.arima.max_p, 1);
        assert_eq!(config.arima.max_q, 3);
        assert_eq!(config.arima.criterion, InformationCriterion::Bic);
        assert_eq!(config.sur.grouping, SurGrouping::ByType);
        assert_eq!(config.sur.estimation().max_iterations, 5);
        assert_eq!(config.ensemble.combiner().method(), CombinationMethod::Median);
    }

    #[test]
    fn rejects_inconsistent_settings() {
        let cases = [
            r#"{ "interval_level": 1.5 }"#,
            r#"{ "split": { "train": 0 } }"#,
            r#"{ "models": ["sur"] }"#,
            r#"{ "models": ["naive"] }"#,
            r#"{ "ensemble": { "members": ["arima"], "method": "custom" } }"#,
            r#"{ "sur": { "enabled": false } }"#,
            r#"{ "fourier": { "harmonics": 0 } }"#,
            r#"{ "models": ["naive", "arima", "arima"] }"#,
            r#"{ "ensemble": { "members": ["arima", "arima", "sur"] } }"#,
        ];
        for json in cases {
            assert!(
                matches!(AnalysisConfig::from_json_str(json), Err(ForecastError::Config(_))),
                "accepted {json}"
            );
        }
        assert!(matches!(
            AnalysisConfig::from_json_str("{ \"split\": 3 }"),
            Err(ForecastError::Serialization(_))
        ));
    }

    #[test]
    fn custom_weights_pass_validation() {
        let json = r#"{ "ensemble": { "method": "custom", "weights": [1.0, 3.0] } }"#;
        let config = AnalysisConfig::from_json_str(json).unwrap();
        assert_eq!(config.ensemble.combiner().weights(2).unwrap(), vec![0.25, 0.75]);
    }
}
