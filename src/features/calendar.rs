//! Calendar features of weekly dates: trend index and month.

use crate::core::Regressors;
use chrono::{Datelike, NaiveDate};

/// Column name of the linear trend.
pub const TREND: &str = "trend";

/// 1-based week index `offset + 1 ..= offset + n`.
///
/// Passing the training length as `offset` continues the training trend
/// into the test window.
pub fn trend(n: usize, offset: usize) -> Vec<f64> {
    (offset + 1..=offset + n).map(|t| t as f64).collect()
}

/// Calendar month (1-12) of a week.
pub fn month_of(date: NaiveDate) -> u32 {
    date.month()
}

/// Month indicators `month_02` .. `month_12`; January is the baseline.
pub fn month_dummies(dates: &[NaiveDate]) -> Regressors {
    (2..=12u32)
        .map(|month| {
            let column = dates
                .iter()
                .map(|d| if month_of(*d) == month { 1.0 } else { 0.0 })
                .collect();
            (format!("month_{month:02}"), column)
        })
        .collect()
}
