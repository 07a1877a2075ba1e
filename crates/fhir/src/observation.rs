//! FHIR Observation search-bundle wire model.
//!
//! The client asks the server for the single most recent observation per LOINC code, so only
//! the first bundle entry is ever read.

use crate::{expect_resource_type, parse_json, FhirError, LabCode};
use serde::Deserialize;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Most recent laboratory value for one LOINC code.
#[derive(Clone, Debug, PartialEq)]
pub struct LabResult {
    /// `valueQuantity.value`.
    pub value: f64,

    /// `valueQuantity.unit`, when the server supplies one.
    pub unit: Option<String>,

    /// `effectiveDateTime`, kept as sent for display.
    pub effective: Option<String>,
}

// ============================================================================
// Public bundle operations
// ============================================================================

/// Observation search-bundle operations.
pub struct ObservationBundle;

impl ObservationBundle {
    /// Extract the first observation of a searchset bundle.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not match the wire schema,
    /// - resourceType is not "Bundle", or the entry is not an "Observation",
    /// - the bundle is empty ([`FhirError::NotFound`]),
    /// - the observation carries no numeric `valueQuantity.value`.
    pub fn latest(json_text: &str, code: LabCode) -> Result<LabResult, FhirError> {
        let wire: BundleWire = parse_json(json_text, "Bundle")?;
        expect_resource_type(&wire.resource_type, "Bundle")?;

        let Some(entry) = wire.entry.into_iter().next() else {
            return Err(FhirError::NotFound(format!(
                "No observations found for LOINC code {} for the patient",
                code.loinc()
            )));
        };

        let observation = entry.resource;
        expect_resource_type(&observation.resource_type, "Observation")?;

        let quantity = observation.value_quantity.unwrap_or_default();
        let value = quantity.value.ok_or_else(|| {
            FhirError::Translation(format!(
                "Observation for LOINC code {} has no valueQuantity.value",
                code.loinc()
            ))
        })?;

        Ok(LabResult {
            value,
            unit: quantity.unit,
            effective: observation.effective_date_time,
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    entry: Vec<BundleEntryWire>,
}

#[derive(Clone, Debug, Deserialize)]
struct BundleEntryWire {
    resource: ObservationWire,
}

#[derive(Clone, Debug, Deserialize)]
struct ObservationWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(rename = "valueQuantity", default)]
    value_quantity: Option<QuantityWire>,

    #[serde(rename = "effectiveDateTime", default)]
    effective_date_time: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct QuantityWire {
    #[serde(default)]
    value: Option<f64>,

    #[serde(default)]
    unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_entry() {
        let input = r#"{
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 2,
            "entry": [
                {
                    "fullUrl": "https://fhir.example/Observation/b2",
                    "resource": {
                        "resourceType": "Observation",
                        "status": "final",
                        "code": { "coding": [{ "system": "http://loinc.org", "code": "1975-2" }] },
                        "effectiveDateTime": "2024-05-30T09:12:00Z",
                        "valueQuantity": { "value": 2.4, "unit": "mg/dL" }
                    }
                },
                {
                    "resource": {
                        "resourceType": "Observation",
                        "valueQuantity": { "value": 1.1, "unit": "mg/dL" }
                    }
                }
            ]
        }"#;

        let lab = ObservationBundle::latest(input, LabCode::TotalBilirubin).expect("parse bundle");
        assert_eq!(
            lab,
            LabResult {
                value: 2.4,
                unit: Some("mg/dL".into()),
                effective: Some("2024-05-30T09:12:00Z".into()),
            }
        );
    }

    #[test]
    fn integer_values_are_accepted() {
        let input = r#"{
            "resourceType": "Bundle",
            "entry": [{ "resource": { "resourceType": "Observation", "valueQuantity": { "value": 135 } } }]
        }"#;
        let lab = ObservationBundle::latest(input, LabCode::Sodium).expect("parse bundle");
        assert_eq!(lab.value, 135.0);
        assert_eq!(lab.unit, None);
        assert_eq!(lab.effective, None);
    }

    #[test]
    fn empty_bundle_is_not_found() {
        let input = r#"{ "resourceType": "Bundle", "type": "searchset", "total": 0 }"#;
        let err = ObservationBundle::latest(input, LabCode::Albumin).expect_err("empty bundle");
        match err {
            FhirError::NotFound(msg) => assert!(msg.contains("1751-7")),
            other => panic!("expected NotFound error, got {other:?}"),
        }
    }

    #[test]
    fn missing_value_is_a_translation_error() {
        let input = r#"{
            "resourceType": "Bundle",
            "entry": [{ "resource": { "resourceType": "Observation", "valueString": "see note" } }]
        }"#;
        let err = ObservationBundle::latest(input, LabCode::Inr).expect_err("no quantity");
        assert!(matches!(err, FhirError::Translation(_)));
    }

    #[test]
    fn rejects_non_bundle() {
        let input = r#"{ "resourceType": "OperationOutcome" }"#;
        let err = ObservationBundle::latest(input, LabCode::Creatinine).expect_err("not a bundle");
        assert!(matches!(err, FhirError::InvalidInput(_)));
    }

    #[test]
    fn rejects_string_value_with_path() {
        let input = r#"{
            "resourceType": "Bundle",
            "entry": [{ "resource": { "resourceType": "Observation", "valueQuantity": { "value": "high" } } }]
        }"#;
        let err = ObservationBundle::latest(input, LabCode::Inr).expect_err("string value");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("valueQuantity")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }
}
