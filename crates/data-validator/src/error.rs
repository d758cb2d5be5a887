//! Validation Error Types

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single problem with one request field
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationError {
    /// Missing required field
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    /// Category outside the accepted codes
    #[error("{field} must be one of {allowed:?}, got {value:?}")]
    InvalidCategory {
        field: &'static str,
        value: String,
        allowed: Vec<&'static str>,
    },

    /// Measurement that is zero or negative
    #[error("{field} must be greater than 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// NaN or infinite measurement
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl ValidationError {
    /// Request field the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::InvalidCategory { field, .. }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::NotFinite { field } => field,
        }
    }
}

/// Every problem found in one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Human-readable message per error
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid field(s): {}", self.errors.len(), self.messages().join("; "))
    }
}

impl std::error::Error for ValidationReport {}
