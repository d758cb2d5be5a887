//! One-Hot Categorical Encoder

use crate::error::EncodingError;
use crate::record::Sex;
use serde::{Deserialize, Serialize};

/// Fitted one-hot encoder for a single categorical column
///
/// Output width and column order come from `categories`, in fitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Input column the encoder was fitted on
    pub feature: String,
    /// Fitted categories, in output column order
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    /// Create an encoder from fitted categories
    pub fn new(feature: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            feature: feature.into(),
            categories,
        }
    }

    /// Number of indicator columns produced
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Output column names, `<feature>_<category>`
    pub fn feature_names_out(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.feature, c))
            .collect()
    }

    /// Encode a raw category code
    pub fn encode_code(&self, code: &str) -> Result<Vec<f64>, EncodingError> {
        let hot = self
            .categories
            .iter()
            .position(|c| c == code)
            .ok_or_else(|| EncodingError::UnknownCategory {
                feature: self.feature.clone(),
                value: code.to_string(),
                known: self.categories.clone(),
            })?;

        let mut out = vec![0.0; self.categories.len()];
        out[hot] = 1.0;
        Ok(out)
    }

    /// Encode a sex value
    pub fn encode(&self, sex: Sex) -> Result<Vec<f64>, EncodingError> {
        self.encode_code(sex.code())
    }

    /// Categories from `expected` that the encoder was not fitted with
    pub fn missing_categories<'a>(&self, expected: &[&'a str]) -> Vec<&'a str> {
        expected
            .iter()
            .copied()
            .filter(|e| !self.categories.iter().any(|c| c == e))
            .collect()
    }
}
