//! Robust Scaling with pre-fitted median and IQR

use crate::error::FeatureError;
use serde::{Deserialize, Serialize};

/// Fitted robust scaler
///
/// Each column is transformed as `(x - center) / scale`, where `center` is
/// the training median and `scale` the interquartile range. A `None` center
/// or scale disables that half of the transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustScaler {
    /// Columns in fitted order
    pub feature_names_in: Vec<String>,
    /// Per-column median
    #[serde(default)]
    pub center: Option<Vec<f64>>,
    /// Per-column interquartile range
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

impl RobustScaler {
    /// Create a scaler with both centering and scaling
    pub fn new(feature_names_in: Vec<String>, center: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            feature_names_in,
            center: Some(center),
            scale: Some(scale),
        }
    }

    /// Number of columns the scaler was fitted on
    pub fn width(&self) -> usize {
        self.feature_names_in.len()
    }

    /// Describe why the fitted parameters are unusable, if they are
    pub fn shape_problem(&self) -> Option<String> {
        let width = self.width();
        if width == 0 {
            return Some("scaler has no columns".to_string());
        }
        for (label, params) in [("center", &self.center), ("scale", &self.scale)] {
            let Some(params) = params else { continue };
            if params.len() != width {
                return Some(format!(
                    "{} has {} values for {} columns",
                    label,
                    params.len(),
                    width
                ));
            }
            if params.iter().any(|v| !v.is_finite()) {
                return Some(format!("{} contains non-finite values", label));
            }
        }
        if let Some(scale) = &self.scale {
            if let Some(idx) = scale.iter().position(|s| *s == 0.0) {
                return Some(format!(
                    "scale for {} is zero",
                    self.feature_names_in[idx]
                ));
            }
        }
        None
    }

    /// Scale `values`, whose columns are named `names`
    pub fn transform(&self, names: &[String], values: &[f64]) -> Result<Vec<f64>, FeatureError> {
        if names != self.feature_names_in.as_slice() || values.len() != names.len() {
            return Err(FeatureError::ColumnMismatch {
                expected: self.feature_names_in.clone(),
                actual: names.to_vec(),
            });
        }

        let scaled = values
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let centered = match &self.center {
                    Some(center) => x - center[i],
                    None => x,
                };
                match &self.scale {
                    Some(scale) => centered / scale[i],
                    None => centered,
                }
            })
            .collect();

        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn scaler() -> RobustScaler {
        RobustScaler::new(cols(&["Length", "Volume"]), vec![0.5, 0.02], vec![0.2, 0.01])
    }

    #[test]
    fn test_median_maps_to_zero() {
        let out = scaler().transform(&cols(&["Length", "Volume"]), &[0.5, 0.02]).unwrap();
        assert!(out.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_iqr_units() {
        let out = scaler().transform(&cols(&["Length", "Volume"]), &[0.7, 0.005]).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-9);
        assert!((out[1] + 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let err = scaler()
            .transform(&cols(&["Volume", "Length"]), &[0.02, 0.5])
            .unwrap_err();
        assert!(matches!(err, FeatureError::ColumnMismatch { .. }));
    }

    #[test]
    fn test_centering_disabled() {
        let s = RobustScaler {
            feature_names_in: cols(&["Length"]),
            center: None,
            scale: Some(vec![0.5]),
        };
        assert_eq!(s.transform(&cols(&["Length"]), &[1.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_shape_problems() {
        assert_eq!(scaler().shape_problem(), None);

        let mut short = scaler();
        short.center = Some(vec![0.5]);
        assert!(short.shape_problem().unwrap().contains("center"));

        let mut zero = scaler();
        zero.scale = Some(vec![0.2, 0.0]);
        assert!(zero.shape_problem().unwrap().contains("Volume"));
    }

    #[test]
    fn test_deserialize_with_null_center() {
        let s: RobustScaler = serde_json::from_str(
            r#"{"feature_names_in":["Height"],"center":null,"scale":[0.05]}"#,
        )
        .unwrap();
        assert_eq!(s.center, None);
        assert_eq!(s.scale, Some(vec![0.05]));
    }
}
