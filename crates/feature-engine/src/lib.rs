//! Feature Engineering Engine
//!
//! Turns abalone measurements into the column layout a fitted model expects:
//! ellipsoid volume derivation, ordered feature assembly, one-hot encoding of
//! `Sex` and robust scaling of the numeric columns.

mod encoder;
mod error;
mod features;
mod record;
mod scaler;

pub use encoder::OneHotEncoder;
pub use error::{EncodingError, FeatureError};
pub use features::{assemble, ellipsoid_volume, AssembledRow, FeatureVector};
pub use record::{canonical_column, FieldValue, MeasurementRecord, Sex, INPUT_COLUMNS, SEX, VOLUME};
pub use scaler::RobustScaler;
