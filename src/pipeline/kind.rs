//! The models compared by the study.

use crate::features::RegressorSet;
use crate::models::{AutoARIMA, AutoARIMAConfig, ModelRegistry, ModelSpec, Naive, TSLM};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every model that can appear in a forecast or accuracy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Naive,
    Arima,
    ArimaPrice,
    ArimaFourier,
    TslmFourier,
    Sur,
    Ensemble,
}

impl ModelKind {
    /// Per-series models, in report order.
    pub const UNIVARIATE: [ModelKind; 5] = [
        ModelKind::Naive,
        ModelKind::Arima,
        ModelKind::ArimaPrice,
        ModelKind::ArimaFourier,
        ModelKind::TslmFourier,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::Arima => "arima",
            Self::ArimaPrice => "arima_price",
            Self::ArimaFourier => "arima_fourier",
            Self::TslmFourier => "tslm_fourier",
            Self::Sur => "sur",
            Self::Ensemble => "ensemble",
        }
    }

    /// Whether the model is fitted one series at a time.
    pub fn is_univariate(self) -> bool {
        Self::UNIVARIATE.contains(&self)
    }

    /// Whether the model selects an ARIMA order.
    pub fn is_arima(self) -> bool {
        matches!(self, Self::Arima | Self::ArimaPrice | Self::ArimaFourier)
    }

    pub fn regressors(self) -> RegressorSet {
        match self {
            Self::ArimaPrice => RegressorSet::Price,
            Self::ArimaFourier | Self::TslmFourier => RegressorSet::Fourier,
            Self::Sur => RegressorSet::PriceFourier,
            Self::Naive | Self::Arima | Self::Ensemble => RegressorSet::None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Sur, Self::Ensemble]
            .into_iter()
            .chain(Self::UNIVARIATE)
            .find(|k| k.as_str() == name)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of the per-series models in `kinds`; SUR and the ensemble are
/// fitted by the pipeline itself and skipped here.
pub fn univariate_registry(kinds: &[ModelKind], arima: AutoARIMAConfig) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for &kind in kinds.iter().filter(|k| k.is_univariate()) {
        let spec = match kind {
            ModelKind::Naive => {
                ModelSpec::new(kind.as_str(), || Box::new(Naive::new()), kind.regressors())
            }
            ModelKind::TslmFourier => {
                ModelSpec::new(kind.as_str(), || Box::new(TSLM::new()), kind.regressors())
            }
            _ => ModelSpec::new(
                kind.as_str(),
                move || Box::new(AutoARIMA::with_config(arima)),
                kind.regressors(),
            ),
        };
        registry.register(spec);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ModelKind::UNIVARIATE.into_iter().chain([ModelKind::Sur, ModelKind::Ensemble]) {
            assert_eq!(ModelKind::from_name(kind.as_str()), Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
        assert_eq!(ModelKind::from_name("ets"), None);
    }

    #[test]
    fn registry_holds_only_univariate_models() {
        let kinds = [ModelKind::Naive, ModelKind::ArimaFourier, ModelKind::Sur];
        let registry = univariate_registry(&kinds, AutoARIMAConfig::default());

        assert_eq!(registry.len(), 2);
        let arima = registry.get("arima_fourier").unwrap();
        assert_eq!(arima.regressors, RegressorSet::Fourier);
        assert_eq!(arima.create().name(), "AutoARIMA");
        assert!(registry.get("sur").is_none());
    }
}
