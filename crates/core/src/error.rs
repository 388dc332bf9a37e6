//! Error types shared across the harbinger crates.
//!
//! Every caller-facing operation reports one of these kinds with a message,
//! never a raw backtrace. Cache, source, forecaster, and engine failures all
//! funnel into this enum so the app layer has a single error surface.

use thiserror::Error;

/// Errors that can occur while fetching data, training, or backtesting.
#[derive(Debug, Error)]
pub enum HarbingerError {
    /// The market-data source returned no rows for the symbol.
    #[error("no data found for symbol {symbol}")]
    EmptySeries {
        /// Symbol the fetch was issued for.
        symbol: String,
    },

    /// The series has too few points for the requested operation.
    #[error("insufficient history: need at least {required} points, have {actual}")]
    InsufficientHistory {
        /// Minimum number of points required.
        required: usize,
        /// Number of points actually available.
        actual: usize,
    },

    /// Data or model retrieval failed. Any partial artifact has been removed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Forecaster fit failed.
    #[error("training failed: {0}")]
    Train(String),

    /// Predict was requested but no trained model exists for the symbol.
    #[error("no trained model found for symbol {symbol}")]
    ModelNotFound {
        /// Symbol the prediction was requested for.
        symbol: String,
    },

    /// Missing or malformed input parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A blocking call exceeded its configured deadline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Name of the operation that timed out.
        operation: String,
        /// Deadline in seconds.
        seconds: u64,
    },
}

impl HarbingerError {
    /// Creates an empty-series error.
    pub fn empty_series(symbol: impl Into<String>) -> Self {
        Self::EmptySeries {
            symbol: symbol.into(),
        }
    }

    /// Creates a fetch error.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Creates a training error.
    pub fn train(message: impl Into<String>) -> Self {
        Self::Train(message.into())
    }

    /// Creates a model-not-found error.
    pub fn model_not_found(symbol: impl Into<String>) -> Self {
        Self::ModelNotFound {
            symbol: symbol.into(),
        }
    }

    /// Creates an invalid-parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds,
        }
    }

    /// Returns a stable machine-readable kind for structured reporting.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptySeries { .. } => "empty_series",
            Self::InsufficientHistory { .. } => "insufficient_history",
            Self::Fetch(_) => "fetch_error",
            Self::Train(_) => "train_error",
            Self::ModelNotFound { .. } => "model_not_found",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// Returns true if retrying the operation later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Timeout { .. })
    }
}

impl From<std::io::Error> for HarbingerError {
    fn from(err: std::io::Error) -> Self {
        Self::Fetch(format!("io error: {err}"))
    }
}

/// Result type alias for harbinger operations.
pub type Result<T> = std::result::Result<T, HarbingerError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Construction Tests ====================

    #[test]
    fn empty_series_includes_symbol() {
        let err = HarbingerError::empty_series("AAPL");
        assert!(err.to_string().contains("AAPL"));
        assert_eq!(err.kind(), "empty_series");
    }

    #[test]
    fn insufficient_history_includes_counts() {
        let err = HarbingerError::InsufficientHistory {
            required: 210,
            actual: 90,
        };
        assert!(err.to_string().contains("210"));
        assert!(err.to_string().contains("90"));
        assert_eq!(err.kind(), "insufficient_history");
    }

    #[test]
    fn model_not_found_includes_symbol() {
        let err = HarbingerError::model_not_found("MSFT");
        assert!(err.to_string().contains("MSFT"));
        assert_eq!(err.kind(), "model_not_found");
    }

    #[test]
    fn timeout_includes_operation_and_deadline() {
        let err = HarbingerError::timeout("fetch", 30);
        assert!(err.to_string().contains("fetch"));
        assert!(err.to_string().contains("30"));
        assert_eq!(err.kind(), "timeout");
    }

    // ==================== Transience Tests ====================

    #[test]
    fn fetch_and_timeout_are_transient() {
        assert!(HarbingerError::fetch("connection reset").is_transient());
        assert!(HarbingerError::timeout("fit", 60).is_transient());
    }

    #[test]
    fn validation_errors_are_not_transient() {
        assert!(!HarbingerError::invalid_parameter("missing symbol").is_transient());
        assert!(!HarbingerError::empty_series("X").is_transient());
        assert!(!HarbingerError::train("singular matrix").is_transient());
        assert!(!HarbingerError::model_not_found("X").is_transient());
    }

    #[test]
    fn io_error_maps_to_fetch() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = HarbingerError::from(io);
        assert_eq!(err.kind(), "fetch_error");
        assert!(err.to_string().contains("gone"));
    }
}
