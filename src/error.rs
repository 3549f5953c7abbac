//! Error types for the avocado-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading data, fitting models or writing reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Date-related error (ordering, parsing).
    #[error("date error: {0}")]
    DateError(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// A regressor the model was fitted with is absent from the prediction data.
    #[error("missing regressor: {0}")]
    MissingRegressor(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// I/O failure while reading or writing files.
    #[error("io error: {0}")]
    Io(String),

    /// Malformed input record.
    #[error("parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Invalid analysis configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failure serializing a report.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        ForecastError::Parse {
            line,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData {
            needed: 169,
            got: 166,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 169, got 166"
        );

        let err = ForecastError::MissingRegressor("log_price".to_string());
        assert_eq!(err.to_string(), "missing regressor: log_price");

        let err = ForecastError::Parse {
            line: 12,
            message: "volume must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parse error at line 12: volume must be positive"
        );

        let err = ForecastError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "avocado.csv");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::Io(msg) if msg.contains("avocado.csv")));
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::Config("train weeks must be positive".into());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
