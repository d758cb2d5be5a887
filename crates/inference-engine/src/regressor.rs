//! Regressor capability

use crate::gbdt::GbdtRegressor;
use crate::onnx::OnnxRegressor;
use crate::{ArtifactLoadError, PredictionError};
use std::path::Path;
use tracing::info;

/// A fitted model mapping one feature row to one continuous value
///
/// Implementations are immutable after load and shared across request
/// threads.
pub trait Regressor: Send + Sync {
    /// Input width the model was fitted with
    fn n_features(&self) -> usize;

    /// Column names recorded in the model file, if any
    fn feature_names(&self) -> Option<&[String]>;

    /// Evaluate one row
    fn predict(&self, row: &[f64]) -> Result<f64, PredictionError>;

    /// Check `row` against the fitted input width
    fn check_width(&self, row: &[f64]) -> Result<(), PredictionError> {
        if row.len() != self.n_features() {
            return Err(PredictionError::InvalidInputShape {
                expected: self.n_features(),
                actual: row.len(),
            });
        }
        Ok(())
    }
}

/// Load a regressor, choosing the backend from the file extension
///
/// `.onnx` files go through tract; anything else is read as a LightGBM
/// JSON model dump. `width` is the expected input width, used to pin the
/// ONNX input shape.
pub fn load_regressor(
    path: impl AsRef<Path>,
    width: usize,
) -> Result<Box<dyn Regressor>, ArtifactLoadError> {
    let path = path.as_ref();
    let is_onnx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));

    if is_onnx {
        info!("Loading ONNX regressor from {}", path.display());
        Ok(Box::new(OnnxRegressor::load(path, width)?))
    } else {
        info!("Loading GBDT regressor from {}", path.display());
        Ok(Box::new(GbdtRegressor::load(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_on_extension() {
        let crate_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

        let onnx = load_regressor(crate_dir.join("tests/fixtures/linear.onnx"), 11).unwrap();
        assert!(onnx.feature_names().is_none());
        assert_eq!(onnx.predict(&[1.0; 11]).unwrap(), 66.0);

        let gbdt = load_regressor(crate_dir.join("../../models/model.json"), 11).unwrap();
        assert_eq!(gbdt.n_features(), 11);
        assert!(gbdt.feature_names().is_some());
    }
}
