//! ONNX Regressor backed by tract

use crate::regressor::Regressor;
use crate::{ArtifactLoadError, PredictionError};
use std::path::Path;
use tracing::info;
use tract_onnx::prelude::*;

/// Regression graph exported to ONNX, input `f32[1, width]`
pub struct OnnxRegressor {
    plan: TypedRunnableModel<TypedModel>,
    width: usize,
}

impl OnnxRegressor {
    /// Load and optimize an ONNX graph for a fixed input width
    pub fn load(path: impl AsRef<Path>, width: usize) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ArtifactLoadError::Io {
            artifact: "model",
            path: path.to_path_buf(),
            source,
        })?;

        let plan = tract_onnx::onnx()
            .model_for_read(&mut bytes.as_slice())
            .and_then(|model| model.with_input_fact(0, f32::fact([1, width]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| ArtifactLoadError::Model {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!("ONNX model loaded: {} inputs", width);
        Ok(Self { plan, width })
    }
}

fn inference_failed(e: impl std::fmt::Display) -> PredictionError {
    PredictionError::InferenceFailed(e.to_string())
}

impl Regressor for OnnxRegressor {
    fn n_features(&self) -> usize {
        self.width
    }

    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn predict(&self, row: &[f64]) -> Result<f64, PredictionError> {
        self.check_width(row)?;

        let input: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let tensor = Tensor::from_shape(&[1, self.width], &input).map_err(inference_failed)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(inference_failed)?;

        let output = outputs
            .first()
            .ok_or_else(|| inference_failed("model produced no outputs"))?;
        let output = output.cast_to::<f64>().map_err(inference_failed)?;
        let value = output
            .as_slice::<f64>()
            .map_err(inference_failed)?
            .first()
            .copied()
            .ok_or_else(|| inference_failed("model produced an empty output"))?;

        Ok(value)
    }
}
