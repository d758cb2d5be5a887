//! Abalone Age Inference Engine
//!
//! Loads the fitted artifacts (feature list, encoder, scaler, regressor) once
//! and runs the per-request transform-and-predict pipeline over them.

mod artifacts;
mod gbdt;
mod onnx;
mod pipeline;
mod regressor;

pub use artifacts::{ArtifactBundle, ArtifactPaths};
pub use gbdt::GbdtRegressor;
pub use onnx::OnnxRegressor;
pub use pipeline::{AgePipeline, AgePrediction};
pub use regressor::{load_regressor, Regressor};

use feature_engine::{EncodingError, FeatureError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading fitted artifacts at startup
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("Failed to read {artifact} artifact at {}: {source}", path.display())]
    Io {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {artifact} artifact at {}: {source}", path.display())]
    Parse {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid {artifact} artifact: {reason}")]
    Shape {
        artifact: &'static str,
        reason: String,
    },
    #[error("Artifacts are incompatible: {0}")]
    Incompatible(String),
    #[error("Model load failed for {}: {reason}", path.display())]
    Model { path: PathBuf, reason: String },
}

/// Errors raised by the regressor itself
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("Invalid input shape: expected {expected} columns, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Model produced a non-finite output: {0}")]
    NonFinite(f64),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

/// Any failure of a single pipeline invocation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl PipelineError {
    /// Pipeline stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Feature(_) => "feature",
            PipelineError::Encoding(_) => "encoding",
            PipelineError::Prediction(_) => "prediction",
        }
    }
}
