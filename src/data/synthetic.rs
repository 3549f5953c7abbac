//! Seeded synthetic avocado panel.
//!
//! Log volume per series is a level plus a linear trend, yearly
//! seasonality, a constant price elasticity and noise that is partly
//! shared across regions in the same week, which is what makes a SUR
//! system worth fitting.

use crate::data::observation::{Observation, ProductType};
use crate::error::{ForecastError, Result};
use crate::features::WEEKS_PER_YEAR;
use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::SeedableRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::io::Write;

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub regions: Vec<String>,
    /// Also emit a `TotalUS` aggregate of all regions.
    pub include_total: bool,
    pub weeks: usize,
    /// Week of the first observation.
    pub start: NaiveDate,
    pub seed: u64,
    /// Log-log price elasticity of volume.
    pub elasticity: f64,
    /// Standard deviation of the log-volume noise.
    pub noise_sd: f64,
    /// Share of the noise variance common to all regions in a week.
    pub common_share: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            regions: ["Albany", "Boston", "Chicago", "Denver", "Houston", "Seattle"]
                .into_iter()
                .map(String::from)
                .collect(),
            include_total: true,
            weeks: 169,
            start: NaiveDate::from_ymd_opt(2015, 1, 4).unwrap_or(NaiveDate::MIN),
            seed: 42,
            elasticity: -1.2,
            noise_sd: 0.08,
            common_share: 0.5,
        }
    }
}

/// Generate observations for every region and product type.
pub fn generate(config: &SyntheticConfig) -> Result<Vec<Observation>> {
    if config.regions.is_empty() || config.weeks == 0 {
        return Err(ForecastError::InvalidParameter(
            "synthetic panel needs at least one region and one week".into(),
        ));
    }
    if !(0.0..=1.0).contains(&config.common_share) || config.noise_sd < 0.0 {
        return Err(ForecastError::InvalidParameter(
            "common_share must be in [0, 1] and noise_sd non-negative".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let unit = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
    let weeks: Vec<NaiveDate> = (0..config.weeks)
        .map(|t| config.start + Duration::weeks(t as i64))
        .collect();

    let common_sd = config.noise_sd * config.common_share.sqrt();
    let own_sd = config.noise_sd * (1.0 - config.common_share).sqrt();

    let mut observations = Vec::with_capacity(config.regions.len() * 2 * config.weeks);
    for product_type in ProductType::ALL {
        let (base_price, base_volume) = match product_type {
            ProductType::Conventional => (1.1_f64, 120_000.0_f64),
            ProductType::Organic => (1.6, 6_000.0),
        };
        let common: Vec<f64> = (0..config.weeks).map(|_| unit.sample(&mut rng)).collect();

        let mut totals = vec![(0.0, 0.0); config.weeks];
        for region in &config.regions {
            let level = base_volume.ln() + rng.gen_range(-0.8..0.8);
            let growth = rng.gen_range(0.0..0.002);
            let phase = rng.gen_range(-0.4..0.4);
            let amplitude = rng.gen_range(0.05..0.2);
            let price_level = base_price.ln() + rng.gen_range(-0.1..0.1);

            let mut price_noise = 0.0;
            for (t, week) in weeks.iter().enumerate() {
                let season = 2.0 * PI * t as f64 / WEEKS_PER_YEAR;
                price_noise = 0.7 * price_noise + 0.03 * unit.sample(&mut rng);
                let log_price_dev = 0.08 * (season + phase).cos() + price_noise;
                let log_volume = level
                    + growth * t as f64
                    + amplitude * (season + phase).sin()
                    + config.elasticity * log_price_dev
                    + common_sd * common[t]
                    + own_sd * unit.sample(&mut rng);

                let price = (price_level + log_price_dev).exp();
                let volume = log_volume.exp();
                totals[t].0 += volume;
                totals[t].1 += price * volume;

                observations.push(Observation {
                    region: region.clone(),
                    product_type,
                    week: *week,
                    price: round_to(price, 2),
                    volume: round_to(volume, 2),
                });
            }
        }

        if config.include_total {
            for (week, (volume, revenue)) in weeks.iter().zip(totals) {
                observations.push(Observation {
                    region: "TotalUS".to_string(),
                    product_type,
                    week: *week,
                    price: round_to(revenue / volume, 2),
                    volume: round_to(volume, 2),
                });
            }
        }
    }
    Ok(observations)
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "AveragePrice")]
    price: f64,
    #[serde(rename = "Total Volume")]
    volume: f64,
    #[serde(rename = "type")]
    product_type: &'a str,
    year: i32,
    region: &'a str,
}

/// Write observations in the layout `load_csv` reads.
pub fn write_csv<W: Write>(observations: &[Observation], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for obs in observations {
        writer.serialize(CsvRow {
            date: obs.week.format("%Y-%m-%d").to_string(),
            price: obs.price,
            volume: obs.volume,
            product_type: obs.product_type.as_str(),
            year: obs.week.year(),
            region: &obs.region,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::Panel;

    #[test]
    fn deterministic_for_a_seed() {
        let config = SyntheticConfig::default();
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());

        let other = SyntheticConfig {
            seed: 7,
            ..SyntheticConfig::default()
        };
        assert_ne!(generate(&config).unwrap(), generate(&other).unwrap());
    }

    #[test]
    fn panel_shape() {
        let config = SyntheticConfig {
            regions: vec!["A".into(), "B".into()],
            weeks: 20,
            ..SyntheticConfig::default()
        };
        let panel = Panel::from_observations(generate(&config).unwrap()).unwrap();
        // two regions plus TotalUS, two types each
        assert_eq!(panel.len(), 6);
        assert_eq!(panel.observation_count(), 120);
        assert!(panel.iter().all(|s| s.prices.iter().all(|p| *p > 0.0)));
    }

    #[test]
    fn csv_round_trip() {
        let config = SyntheticConfig {
            weeks: 8,
            ..SyntheticConfig::default()
        };
        let observations = generate(&config).unwrap();
        let mut buffer = Vec::new();
        write_csv(&observations, &mut buffer).unwrap();

        let read_back = read_csv(buffer.as_slice()).unwrap();
        assert_eq!(read_back, observations);
    }

    #[test]
    fn rejects_bad_config() {
        let config = SyntheticConfig {
            regions: vec![],
            ..SyntheticConfig::default()
        };
        assert!(generate(&config).is_err());
    }
}
