//! Reader for the public weekly avocado sales CSV.
//!
//! Required columns are `Date`, `AveragePrice`, `Total Volume`, `type` and
//! `region`; everything else (bag counts, PLU volumes, the unnamed index
//! column) is ignored.

use crate::data::observation::{Observation, ProductType};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "AveragePrice")]
    price: f64,
    #[serde(rename = "Total Volume")]
    volume: f64,
    #[serde(rename = "type")]
    product_type: String,
    region: String,
}

/// Parse `YYYY-MM-DD`, falling back to `MM/DD/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
}

/// Load observations from a CSV file.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ForecastError::Io(format!("cannot open '{}': {e}", path.display())))?;
    let observations = read_csv(BufReader::new(file))?;
    debug!(path = %path.display(), rows = observations.len(), "loaded sales data");
    Ok(observations)
}

/// Read observations from any CSV source with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let parse_error = |message: String| ForecastError::Parse { line, message };

        let raw: RawRecord = record
            .deserialize(Some(&headers))
            .map_err(|e| parse_error(e.to_string()))?;

        let week = parse_date(&raw.date)
            .ok_or_else(|| parse_error(format!("invalid date '{}'", raw.date)))?;
        let product_type: ProductType = raw
            .product_type
            .parse()
            .map_err(|e: ForecastError| parse_error(e.to_string()))?;
        if !(raw.price > 0.0 && raw.price.is_finite()) {
            return Err(parse_error(format!("price must be positive, got {}", raw.price)));
        }
        if !(raw.volume > 0.0 && raw.volume.is_finite()) {
            return Err(parse_error(format!(
                "volume must be positive, got {}",
                raw.volume
            )));
        }

        observations.push(Observation {
            region: raw.region,
            product_type,
            week,
            price: raw.price,
            volume: raw.volume,
        });
    }

    if observations.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
,Date,AveragePrice,Total Volume,4046,4225,4770,Total Bags,type,year,region
0,2015-12-27,1.33,64236.62,1036.74,54454.85,48.16,8696.87,conventional,2015,Albany
1,2015-12-20,1.35,54876.98,674.28,44638.81,58.33,9505.56,conventional,2015,Albany
2,12/13/2015,1.93,1118.47,8.02,178.78,0,931.67,organic,2015,Albany
";

    #[test]
    fn reads_sample_rows() {
        let observations = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(observations.len(), 3);

        let first = &observations[0];
        assert_eq!(first.region, "Albany");
        assert_eq!(first.product_type, ProductType::Conventional);
        assert_eq!(first.week, NaiveDate::from_ymd_opt(2015, 12, 27).unwrap());
        assert_eq!(first.price, 1.33);
        assert_eq!(first.volume, 64236.62);

        assert_eq!(observations[2].product_type, ProductType::Organic);
        assert_eq!(
            observations[2].week,
            NaiveDate::from_ymd_opt(2015, 12, 13).unwrap()
        );
    }

    #[test]
    fn reports_line_of_bad_value() {
        let data = "Date,AveragePrice,Total Volume,type,region\n\
                    2016-01-03,1.10,100.0,organic,Boston\n\
                    2016-01-10,1.12,0,organic,Boston\n";
        match read_csv(data.as_bytes()) {
            Err(ForecastError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("volume"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_date_and_type() {
        let bad_date = "Date,AveragePrice,Total Volume,type,region\n2016-13-03,1.1,5,organic,X\n";
        assert!(matches!(
            read_csv(bad_date.as_bytes()),
            Err(ForecastError::Parse { line: 2, .. })
        ));

        let bad_type = "Date,AveragePrice,Total Volume,type,region\n2016-01-03,1.1,5,hass,X\n";
        assert!(read_csv(bad_type.as_bytes()).is_err());
    }

    #[test]
    fn empty_file_is_an_error() {
        let header_only = "Date,AveragePrice,Total Volume,type,region\n";
        assert!(matches!(
            read_csv(header_only.as_bytes()),
            Err(ForecastError::EmptyData)
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            load_csv("/definitely/not/here.csv"),
            Err(ForecastError::Io(_))
        ));
    }
}
