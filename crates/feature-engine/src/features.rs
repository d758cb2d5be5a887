//! Feature Vector Assembly

use crate::error::FeatureError;
use crate::record::{FieldValue, MeasurementRecord, Sex, SEX, VOLUME};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::trace;

/// Ellipsoid volume using half of each dimension as a semi-axis
pub fn ellipsoid_volume(length: f64, diameter: f64, height: f64) -> Result<f64, FeatureError> {
    check_measurement("Length", length)?;
    check_measurement("Diameter", diameter)?;
    check_measurement("Height", height)?;

    Ok((4.0 / 3.0) * PI * (length / 2.0) * (diameter / 2.0) * (height / 2.0))
}

fn check_measurement(field: &str, value: f64) -> Result<(), FeatureError> {
    if !value.is_finite() {
        return Err(FeatureError::NonFinite {
            field: field.to_string(),
        });
    }
    if value <= 0.0 {
        return Err(FeatureError::NonPositive {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

/// A record laid out in fitted column order, before encoding and scaling
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRow {
    /// Categorical column, isolated for the encoder
    pub sex: Sex,
    /// Numeric column names: feature list minus `Sex`, then `Volume`
    pub numeric_names: Vec<String>,
    /// Values matching `numeric_names`
    pub numeric_values: Vec<f64>,
}

/// Lay out `record` following `feature_names` and append the volume column
///
/// Column order is taken from `feature_names` alone; the fitted encoder and
/// scaler depend on it matching training time exactly.
pub fn assemble(
    record: &MeasurementRecord,
    feature_names: &[String],
) -> Result<AssembledRow, FeatureError> {
    let volume = ellipsoid_volume(record.length, record.diameter, record.height)?;

    let mut sex = None;
    let mut numeric_names = Vec::with_capacity(feature_names.len());
    let mut numeric_values = Vec::with_capacity(feature_names.len());

    for name in feature_names {
        match record.get(name) {
            Some(FieldValue::Categorical(value)) => sex = Some(value),
            Some(FieldValue::Numeric(value)) => {
                check_measurement(name, value)?;
                numeric_names.push(name.clone());
                numeric_values.push(value);
            }
            None => return Err(FeatureError::MissingField(name.clone())),
        }
    }

    let sex = sex.ok_or_else(|| FeatureError::MissingField(SEX.to_string()))?;

    numeric_names.push(VOLUME.to_string());
    numeric_values.push(volume);

    trace!("Assembled {} numeric columns, volume={:.6}", numeric_values.len(), volume);

    Ok(AssembledRow {
        sex,
        numeric_names,
        numeric_values,
    })
}

/// Final named feature row handed to the regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Column names, encoded indicators first
    pub names: Vec<String>,
    /// Column values
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Concatenate encoded columns followed by scaled columns
    pub fn concat(
        encoded_names: Vec<String>,
        encoded: Vec<f64>,
        scaled_names: &[String],
        scaled: Vec<f64>,
    ) -> Self {
        let mut names = encoded_names;
        names.extend(scaled_names.iter().cloned());
        let mut values = encoded;
        values.extend(scaled);
        Self { names, values }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }
}
