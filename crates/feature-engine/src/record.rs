//! Measurement Record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column name of the categorical field
pub const SEX: &str = "Sex";
/// Column name of the derived volume feature
pub const VOLUME: &str = "Volume";

/// Canonical input column names, in the order the dataset publishes them
pub const INPUT_COLUMNS: [&str; 8] = [
    SEX,
    "Length",
    "Diameter",
    "Height",
    "Whole weight",
    "Shucked weight",
    "Viscera weight",
    "Shell weight",
];

/// Abalone sex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "I")]
    Infant,
}

impl Sex {
    /// All variants
    pub const ALL: [Sex; 3] = [Sex::Male, Sex::Female, Sex::Infant];

    /// Single-letter category code
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Infant => "I",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Sex::Male),
            "F" => Ok(Sex::Female),
            "I" => Ok(Sex::Infant),
            other => Err(other.to_string()),
        }
    }
}

/// Value of one record column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Categorical(Sex),
    Numeric(f64),
}

/// Physical measurements of one abalone
///
/// Lengths are in mm and weights in grams. Every numeric field is expected
/// to be strictly positive; [`crate::assemble`] re-checks this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub sex: Sex,
    pub length: f64,
    pub diameter: f64,
    pub height: f64,
    pub whole_weight: f64,
    pub shucked_weight: f64,
    pub viscera_weight: f64,
    pub shell_weight: f64,
}

impl MeasurementRecord {
    /// Look up a column by name
    ///
    /// Accepts the canonical spelling (`Whole weight`) and the underscore
    /// spelling (`Whole_weight`) used by some fitted feature lists.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        let value = match canonical_column(name)? {
            "Sex" => return Some(FieldValue::Categorical(self.sex)),
            "Length" => self.length,
            "Diameter" => self.diameter,
            "Height" => self.height,
            "Whole weight" => self.whole_weight,
            "Shucked weight" => self.shucked_weight,
            "Viscera weight" => self.viscera_weight,
            "Shell weight" => self.shell_weight,
            _ => return None,
        };
        Some(FieldValue::Numeric(value))
    }
}

/// Map a column name to its canonical spelling, if it names an input column
pub fn canonical_column(name: &str) -> Option<&'static str> {
    INPUT_COLUMNS
        .iter()
        .copied()
        .find(|canonical| *canonical == name || canonical.replace(' ', "_") == name)
}
