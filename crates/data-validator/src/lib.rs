//! Request Validation
//!
//! Schema for the prediction request body and the checks that turn it into
//! a [`feature_engine::MeasurementRecord`] before it reaches the pipeline.

mod error;
mod validator;

pub use error::{ValidationError, ValidationReport};
pub use validator::{PredictRequest, Validator};
