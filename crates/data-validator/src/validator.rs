//! Prediction Request Validation

use crate::error::{ValidationError, ValidationReport};
use feature_engine::{MeasurementRecord, Sex};
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::debug;

/// JSON body of a prediction request
///
/// Fields accept either their published name (`"Whole weight"`) or the
/// underscore form (`"Whole_weight"`). Every field is optional at the serde
/// level so that [`Validator`] can report all missing fields at once.
/// Measurements may be sent as numbers or numeric strings (`"0.455"`).
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "Sex")]
    pub sex: Option<String>,
    #[serde(rename = "Length", default, deserialize_with = "lax_f64")]
    pub length: Option<f64>,
    #[serde(rename = "Diameter", default, deserialize_with = "lax_f64")]
    pub diameter: Option<f64>,
    #[serde(rename = "Height", default, deserialize_with = "lax_f64")]
    pub height: Option<f64>,
    #[serde(
        rename = "Whole weight",
        alias = "Whole_weight",
        default,
        deserialize_with = "lax_f64"
    )]
    pub whole_weight: Option<f64>,
    #[serde(
        rename = "Shucked weight",
        alias = "Shucked_weight",
        default,
        deserialize_with = "lax_f64"
    )]
    pub shucked_weight: Option<f64>,
    #[serde(
        rename = "Viscera weight",
        alias = "Viscera_weight",
        default,
        deserialize_with = "lax_f64"
    )]
    pub viscera_weight: Option<f64>,
    #[serde(
        rename = "Shell weight",
        alias = "Shell_weight",
        default,
        deserialize_with = "lax_f64"
    )]
    pub shell_weight: Option<f64>,
}

/// Read a measurement given either as a JSON number or a numeric string
fn lax_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lax {
        Number(f64),
        Text(String),
    }

    match Option::<Lax>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Lax::Number(value)) => Ok(Some(value)),
        Some(Lax::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid number {:?}", text))),
    }
}

impl From<&MeasurementRecord> for PredictRequest {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            sex: Some(record.sex.code().to_string()),
            length: Some(record.length),
            diameter: Some(record.diameter),
            height: Some(record.height),
            whole_weight: Some(record.whole_weight),
            shucked_weight: Some(record.shucked_weight),
            viscera_weight: Some(record.viscera_weight),
            shell_weight: Some(record.shell_weight),
        }
    }
}

/// Validator for prediction requests
#[derive(Debug, Default)]
pub struct Validator;

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a sex code
    pub fn validate_sex(&self, value: Option<&str>) -> Result<Sex, ValidationError> {
        let value = value.ok_or(ValidationError::MissingField { field: "Sex" })?;
        value
            .parse::<Sex>()
            .map_err(|value| ValidationError::InvalidCategory {
                field: "Sex",
                value,
                allowed: Sex::ALL.iter().map(Sex::code).collect(),
            })
    }

    /// Validate a strictly positive measurement
    pub fn validate_positive(
        &self,
        field: &'static str,
        value: Option<f64>,
    ) -> Result<f64, ValidationError> {
        let value = value.ok_or(ValidationError::MissingField { field })?;
        if !value.is_finite() {
            Err(ValidationError::NotFinite { field })
        } else if value <= 0.0 {
            Err(ValidationError::NotPositive { field, value })
        } else {
            Ok(value)
        }
    }

    /// Validate a whole request, collecting every field error
    pub fn validate(&self, request: &PredictRequest) -> Result<MeasurementRecord, ValidationReport> {
        let mut errors = Vec::new();

        let sex = self
            .validate_sex(request.sex.as_deref())
            .map_err(|e| errors.push(e))
            .ok();

        let mut measure = |field: &'static str, value: Option<f64>| {
            self.validate_positive(field, value)
                .map_err(|e| errors.push(e))
                .ok()
        };

        let length = measure("Length", request.length);
        let diameter = measure("Diameter", request.diameter);
        let height = measure("Height", request.height);
        let whole_weight = measure("Whole weight", request.whole_weight);
        let shucked_weight = measure("Shucked weight", request.shucked_weight);
        let viscera_weight = measure("Viscera weight", request.viscera_weight);
        let shell_weight = measure("Shell weight", request.shell_weight);

        match (
            sex,
            length,
            diameter,
            height,
            whole_weight,
            shucked_weight,
            viscera_weight,
            shell_weight,
        ) {
            (
                Some(sex),
                Some(length),
                Some(diameter),
                Some(height),
                Some(whole_weight),
                Some(shucked_weight),
                Some(viscera_weight),
                Some(shell_weight),
            ) => Ok(MeasurementRecord {
                sex,
                length,
                diameter,
                height,
                whole_weight,
                shucked_weight,
                viscera_weight,
                shell_weight,
            }),
            _ => {
                debug!("Rejected request with {} invalid field(s)", errors.len());
                Err(ValidationReport { errors })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EXAMPLE: &str = r#"{
        "Sex": "M", "Length": 0.455, "Diameter": 0.365, "Height": 0.095,
        "Whole weight": 0.514, "Shucked weight": 0.2245,
        "Viscera weight": 0.101, "Shell weight": 0.15
    }"#;

    fn example() -> PredictRequest {
        serde_json::from_str(EXAMPLE).unwrap()
    }

    #[test]
    fn test_valid_example() {
        let record = Validator::new().validate(&example()).unwrap();
        assert_eq!(record.sex, Sex::Male);
        assert_eq!(record.whole_weight, 0.514);
        assert_eq!(record.shell_weight, 0.15);
    }

    #[test]
    fn test_underscore_aliases() {
        let request: PredictRequest = serde_json::from_str(
            r#"{"Sex": "F", "Length": 0.5, "Diameter": 0.4, "Height": 0.1,
                "Whole_weight": 0.6, "Shucked_weight": 0.25,
                "Viscera_weight": 0.12, "Shell_weight": 0.2, "Rings": 9}"#,
        )
        .unwrap();
        let record = Validator::new().validate(&request).unwrap();
        assert_eq!(record.sex, Sex::Female);
        assert_eq!(record.viscera_weight, 0.12);
    }

    #[test]
    fn test_key_order_irrelevant() {
        let shuffled: PredictRequest = serde_json::from_str(
            r#"{"Shell weight": 0.15, "Height": 0.095, "Sex": "M",
                "Viscera weight": 0.101, "Length": 0.455, "Shucked weight": 0.2245,
                "Diameter": 0.365, "Whole weight": 0.514}"#,
        )
        .unwrap();
        assert_eq!(shuffled, example());
    }

    #[test]
    fn test_numeric_strings_coerced() {
        let request: PredictRequest = serde_json::from_str(
            r#"{"Sex": "M", "Length": "0.455", "Diameter": 0.365, "Height": " 0.095 ",
                "Whole weight": "0.514", "Shucked weight": 0.2245,
                "Viscera weight": 0.101, "Shell weight": "0.15"}"#,
        )
        .unwrap();
        assert_eq!(request, example());
    }

    #[test]
    fn test_non_numeric_string_rejected() {
        let err = serde_json::from_str::<PredictRequest>(
            r#"{"Sex": "M", "Length": "long"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("long"));

        assert!(serde_json::from_str::<PredictRequest>(r#"{"Height": [0.1]}"#).is_err());
    }

    #[test]
    fn test_null_measurement_is_missing() {
        let request: PredictRequest =
            serde_json::from_str(r#"{"Sex": "M", "Length": null}"#).unwrap();
        assert_eq!(request.length, None);
        let report = Validator::new().validate(&request).unwrap_err();
        assert_eq!(report.errors.len(), 7);
    }

    #[test]
    fn test_invalid_sex() {
        let mut request = example();
        request.sex = Some("X".to_string());
        let report = Validator::new().validate(&request).unwrap_err();
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            ValidationError::InvalidCategory { value, .. } if value == "X"
        ));
    }

    #[test]
    fn test_collects_every_error() {
        let mut request = example();
        request.sex = None;
        request.height = Some(0.0);
        request.shell_weight = Some(-1.0);
        request.length = None;

        let report = Validator::new().validate(&request).unwrap_err();
        let fields: Vec<&str> = report.errors.iter().map(ValidationError::field).collect();
        assert_eq!(fields, vec!["Sex", "Length", "Height", "Shell weight"]);
    }

    #[test]
    fn test_empty_body() {
        let report = Validator::new().validate(&PredictRequest::default()).unwrap_err();
        assert_eq!(report.errors.len(), 8);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, ValidationError::MissingField { .. })));
    }

    #[test]
    fn test_report_serializes_with_type_tag() {
        let report = ValidationReport {
            errors: vec![ValidationError::NotPositive {
                field: "Height",
                value: 0.0,
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][0]["type"], "not_positive");
        assert_eq!(json["errors"][0]["field"], "Height");
    }

    #[test]
    fn test_round_trip_from_record() {
        let record = Validator::new().validate(&example()).unwrap();
        assert_eq!(PredictRequest::from(&record), example());
    }

    proptest! {
        #[test]
        fn prop_non_positive_rejected(value in -100.0f64..=0.0) {
            let validator = Validator::new();
            prop_assert!(validator.validate_positive("Length", Some(value)).is_err());
        }

        #[test]
        fn prop_positive_accepted(value in 1e-9f64..1e6) {
            let validator = Validator::new();
            prop_assert_eq!(validator.validate_positive("Length", Some(value)), Ok(value));
        }

        #[test]
        fn prop_only_three_codes(code in "[A-Za-z]{1,2}") {
            let accepted = Validator::new().validate_sex(Some(&code)).is_ok();
            prop_assert_eq!(accepted, code == "M" || code == "F" || code == "I");
        }
    }
}
