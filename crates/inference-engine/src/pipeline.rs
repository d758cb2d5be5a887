//! Inference Pipeline

use crate::artifacts::ArtifactBundle;
use crate::{PipelineError, PredictionError};
use feature_engine::{assemble, FeatureVector, MeasurementRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Predicted age
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgePrediction {
    /// Age in rings, truncated toward zero and floored at zero
    pub rings: u32,
    /// Continuous model output
    pub raw: f64,
}

impl AgePrediction {
    /// Convert a raw model output
    ///
    /// Truncates like an integer cast of the model output; negative outputs
    /// saturate to zero rings.
    pub fn from_raw(raw: f64) -> Result<Self, PredictionError> {
        if !raw.is_finite() {
            return Err(PredictionError::NonFinite(raw));
        }
        Ok(Self {
            rings: raw.trunc().max(0.0) as u32,
            raw,
        })
    }
}

/// Stateless transform-and-predict pipeline over shared artifacts
#[derive(Debug, Clone)]
pub struct AgePipeline {
    artifacts: Arc<ArtifactBundle>,
}

impl AgePipeline {
    /// Create a pipeline over loaded artifacts
    pub fn new(artifacts: Arc<ArtifactBundle>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ArtifactBundle {
        &self.artifacts
    }

    /// Build the model input row for `record`
    ///
    /// Encoded `Sex` indicators come first, followed by the scaled numeric
    /// columns with `Volume` last.
    pub fn preprocess(&self, record: &MeasurementRecord) -> Result<FeatureVector, PipelineError> {
        let row = assemble(record, self.artifacts.feature_names())?;

        let encoder = self.artifacts.encoder();
        let encoded = encoder.encode(row.sex)?;

        let scaled = self
            .artifacts
            .scaler()
            .transform(&row.numeric_names, &row.numeric_values)?;

        Ok(FeatureVector::concat(
            encoder.feature_names_out(),
            encoded,
            &row.numeric_names,
            scaled,
        ))
    }

    /// Predict the age of one abalone
    pub fn predict(&self, record: &MeasurementRecord) -> Result<AgePrediction, PipelineError> {
        let start = Instant::now();

        let features = self.preprocess(record)?;
        let raw = self.artifacts.regressor().predict(&features.values)?;
        let prediction = AgePrediction::from_raw(raw)?;

        debug!(
            "Predicted {} rings (raw={:.4}) in {}us",
            prediction.rings,
            raw,
            start.elapsed().as_micros()
        );
        Ok(prediction)
    }
}
