//! FHIR boundary support for the MELD CDS service.
//!
//! This crate provides **wire models** and a small **REST client** for the handful of FHIR R4
//! resources the MELD hook reads:
//! - `Patient` (administrative gender and birth date)
//! - `Observation` search bundles (latest laboratory value per LOINC code)
//!
//! Wire structs are private. Callers only see the flat domain carriers re-exported below, in
//! which every value that may be missing upstream is an explicit `Option`.

pub mod client;
pub mod loinc;
pub mod observation;
pub mod patient;

// Re-export facades
pub use client::{http_client, FhirClient};
pub use observation::ObservationBundle;
pub use patient::Patient;

// Re-export public domain-level types
pub use client::MeldInputs;
pub use loinc::LabCode;
pub use observation::LabResult;
pub use patient::PatientDemographics;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FHIR server returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialises `json_text` into `T`, naming the failing field path on mismatch.
pub(crate) fn parse_json<T>(json_text: &str, resource: &str) -> FhirResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("{resource} schema mismatch at {path}: {source}"))
    })
}

/// Rejects wire payloads whose `resourceType` is not `expected`.
pub(crate) fn expect_resource_type(actual: &str, expected: &str) -> FhirResult<()> {
    if actual != expected {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{expected}', got '{actual}'"
        )));
    }
    Ok(())
}
