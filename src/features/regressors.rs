//! Assembly of the exogenous regressors a model is fitted on.

use crate::core::Regressors;
use crate::error::Result;
use crate::features::fourier::{fourier_terms, FourierConfig};
use serde::{Deserialize, Serialize};

/// Column name of the log average price.
pub const LOG_PRICE: &str = "log_price";

/// Which exogenous inputs accompany a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressorSet {
    #[default]
    None,
    Price,
    Fourier,
    PriceFourier,
}

impl RegressorSet {
    pub fn uses_price(self) -> bool {
        matches!(self, Self::Price | Self::PriceFourier)
    }

    pub fn uses_fourier(self) -> bool {
        matches!(self, Self::Fourier | Self::PriceFourier)
    }
}

/// Regressors for a window of `log_prices.len()` weeks starting after
/// `offset` weeks of the modelled span.
///
/// Fourier terms are indexed from the start of the span so that the test
/// window continues the training seasonality.
pub fn build_regressors(
    set: RegressorSet,
    log_prices: &[f64],
    offset: usize,
    fourier: &FourierConfig,
) -> Result<Regressors> {
    let n = log_prices.len();
    let mut regressors = Regressors::new();
    if set.uses_price() {
        regressors.insert(LOG_PRICE.to_string(), log_prices.to_vec());
    }
    if set.uses_fourier() {
        regressors.extend(fourier_terms(n, offset, fourier.period, fourier.harmonics)?);
    }
    Ok(regressors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_requested_columns() {
        let prices = vec![0.1, 0.2, 0.15];
        let fourier = FourierConfig::default();

        assert!(build_regressors(RegressorSet::None, &prices, 0, &fourier)
            .unwrap()
            .is_empty());

        let price_only = build_regressors(RegressorSet::Price, &prices, 0, &fourier).unwrap();
        assert_eq!(price_only.len(), 1);
        assert_eq!(price_only[LOG_PRICE], prices);

        let both = build_regressors(RegressorSet::PriceFourier, &prices, 135, &fourier).unwrap();
        assert_eq!(both.len(), 1 + 2 * fourier.harmonics);
        assert!(both.values().all(|v| v.len() == 3));
    }

    #[test]
    fn serde_names() {
        let set: RegressorSet = serde_json::from_str("\"price_fourier\"").unwrap();
        assert_eq!(set, RegressorSet::PriceFourier);
        assert!(set.uses_price() && set.uses_fourier());
    }
}
