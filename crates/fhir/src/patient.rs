//! FHIR Patient wire model and translation helpers.
//!
//! Only the demographics the MELD formula needs are read: administrative gender and birth
//! date. Every other Patient element is ignored, since real servers return far more than this.

use crate::{expect_resource_type, parse_json, FhirError};
use serde::Deserialize;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Demographics read from a Patient resource.
///
/// Both fields are optional in FHIR and are passed through untouched; deciding whether a value
/// is acceptable belongs to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientDemographics {
    /// Administrative gender (`male`, `female`, `other`, `unknown`).
    pub gender: Option<String>,

    /// Date of birth, normally `YYYY-MM-DD` but FHIR also allows `YYYY` and `YYYY-MM`.
    pub birth_date: Option<String>,
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
pub struct Patient;

impl Patient {
    /// Parse a Patient resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not match the wire schema (the message names the failing path),
    /// - resourceType is not "Patient".
    pub fn parse(json_text: &str) -> Result<PatientDemographics, FhirError> {
        let wire: PatientWire = parse_json(json_text, "Patient")?;
        expect_resource_type(&wire.resource_type, "Patient")?;

        Ok(PatientDemographics {
            gender: wire.gender.filter(|g| !g.trim().is_empty()),
            birth_date: wire.birth_date.filter(|d| !d.trim().is_empty()),
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
struct PatientWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    gender: Option<String>,

    #[serde(rename = "birthDate", default)]
    birth_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gender_and_birth_date() {
        let input = r#"{
            "resourceType": "Patient",
            "id": "example",
            "name": [{ "family": "Chalmers", "given": ["Peter", "James"] }],
            "gender": "male",
            "birthDate": "1974-12-25"
        }"#;

        let patient = Patient::parse(input).expect("parse patient");
        assert_eq!(patient.gender.as_deref(), Some("male"));
        assert_eq!(patient.birth_date.as_deref(), Some("1974-12-25"));
    }

    #[test]
    fn missing_fields_are_none() {
        let patient = Patient::parse(r#"{ "resourceType": "Patient", "gender": "" }"#)
            .expect("parse minimal patient");
        assert_eq!(patient, PatientDemographics::default());
    }

    #[test]
    fn rejects_invalid_resource_type() {
        let err = Patient::parse(r#"{ "resourceType": "Observation" }"#)
            .expect_err("should reject invalid resourceType");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Patient"));
                assert!(msg.contains("Observation"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_types_with_path() {
        let err = Patient::parse(r#"{ "resourceType": "Patient", "birthDate": 1974 }"#)
            .expect_err("should reject numeric birthDate");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("birthDate")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }
}
