//! The panel of weekly series, one per region and product type.

use crate::core::TimeSeries;
use crate::data::observation::{Observation, ProductType, SeriesKey};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Prices and volumes of one series, sorted by week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySeries {
    pub key: SeriesKey,
    pub weeks: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl WeeklySeries {
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn log_volumes(&self) -> Vec<f64> {
        self.volumes.iter().map(|v| v.ln()).collect()
    }

    pub fn log_prices(&self) -> Vec<f64> {
        self.prices.iter().map(|p| p.ln()).collect()
    }

    /// Volume as a dated series labelled with the key.
    pub fn volume_series(&self) -> Result<TimeSeries> {
        let series = TimeSeries::new(self.weeks.clone(), self.volumes.clone())?;
        Ok(series.with_label(self.key.to_string()))
    }
}

/// All weekly series of the dataset keyed by region and type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    series: BTreeMap<SeriesKey, WeeklySeries>,
}

impl Panel {
    /// Group observations into series; a week may appear once per series.
    pub fn from_observations(observations: Vec<Observation>) -> Result<Self> {
        let mut grouped: BTreeMap<SeriesKey, Vec<Observation>> = BTreeMap::new();
        for obs in observations {
            grouped.entry(obs.key()).or_default().push(obs);
        }

        let mut series = BTreeMap::new();
        for (key, mut rows) in grouped {
            rows.sort_by_key(|o| o.week);
            if let Some(pair) = rows.windows(2).find(|w| w[0].week == w[1].week) {
                return Err(ForecastError::InvalidParameter(format!(
                    "duplicate week {} in series {key}",
                    pair[0].week
                )));
            }
            let weekly = WeeklySeries {
                key: key.clone(),
                weeks: rows.iter().map(|o| o.week).collect(),
                prices: rows.iter().map(|o| o.price).collect(),
                volumes: rows.iter().map(|o| o.volume).collect(),
            };
            series.insert(key, weekly);
        }
        Ok(Self { series })
    }

    /// Keep regions listed in `include` (all when empty) minus those in `exclude`.
    pub fn filter_regions(&self, include: &[String], exclude: &[String]) -> Panel {
        let series = self
            .series
            .iter()
            .filter(|(key, _)| include.is_empty() || include.contains(&key.region))
            .filter(|(key, _)| !exclude.contains(&key.region))
            .map(|(key, s)| (key.clone(), s.clone()))
            .collect();
        Panel { series }
    }

    pub fn keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.series.keys()
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&WeeklySeries> {
        self.series.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeeklySeries> {
        self.series.values()
    }

    /// Series of one product type.
    pub fn of_type(&self, product_type: ProductType) -> impl Iterator<Item = &WeeklySeries> {
        self.series
            .values()
            .filter(move |s| s.key.product_type == product_type)
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn observation_count(&self) -> usize {
        self.series.values().map(WeeklySeries::len).sum()
    }

    pub fn regions(&self) -> BTreeSet<&str> {
        self.series.keys().map(|k| k.region.as_str()).collect()
    }

    /// First and last week across all series.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.series.values().filter_map(|s| s.weeks.first()).min()?;
        let last = self.series.values().filter_map(|s| s.weeks.last()).max()?;
        Some((*first, *last))
    }
}
