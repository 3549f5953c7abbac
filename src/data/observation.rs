//! Weekly sales observations of one region and product type.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Avocado product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Conventional,
    Organic,
}

impl ProductType {
    pub const ALL: [ProductType; 2] = [ProductType::Conventional, ProductType::Organic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conventional => "conventional",
            Self::Organic => "organic",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conventional" => Ok(Self::Conventional),
            "organic" => Ok(Self::Organic),
            other => Err(ForecastError::InvalidParameter(format!(
                "unknown product type '{other}'"
            ))),
        }
    }
}

/// One week of sales: average unit price and total units sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region: String,
    pub product_type: ProductType,
    pub week: NaiveDate,
    pub price: f64,
    pub volume: f64,
}

impl Observation {
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.region.clone(), self.product_type)
    }
}

/// Identifies one weekly series of the panel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub region: String,
    pub product_type: ProductType,
}

impl SeriesKey {
    pub fn new(region: impl Into<String>, product_type: ProductType) -> Self {
        Self {
            region: region.into(),
            product_type,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.product_type)
    }
}
