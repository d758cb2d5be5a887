//! Feature Engineering Error Types

use thiserror::Error;

/// Errors raised while turning a measurement record into model columns
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Feature name that the record cannot supply
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Physical measurement that is zero or negative
    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: String, value: f64 },

    /// NaN or infinite measurement
    #[error("{field} is not a finite number")]
    NonFinite { field: String },

    /// Columns handed to a fitted transform differ from its fitted columns
    #[error("Column mismatch: expected {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// Errors raised by the categorical encoder
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    /// Category outside the encoder's fitted set
    #[error("Unknown category {value:?} for {feature}, expected one of {known:?}")]
    UnknownCategory {
        feature: String,
        value: String,
        known: Vec<String>,
    },
}
