//! CDS Hooks 1.0 wire types.
//!
//! Only the parts of the envelope this service reads or writes are modelled. Unknown request
//! fields are ignored, so newer CDS clients keep working.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::FhirAuthorization;

// ============================================================================
// Discovery
// ============================================================================

/// Response of `GET /cds-services`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DiscoveryRes {
    pub services: Vec<ServiceDescriptor>,
}

/// One CDS service advertised by the discovery endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServiceDescriptor {
    /// Hook that triggers the service, e.g. `patient-view`.
    pub hook: String,
    pub title: String,
    pub description: String,
    /// Path segment under `/cds-services/`.
    pub id: String,
}

// ============================================================================
// Hook request
// ============================================================================

/// Body of a CDS service call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HookRequest {
    pub hook: String,
    pub hook_instance: String,
    /// Base URL of the CDS client's FHIR server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fhir_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fhir_authorization: Option<FhirAuthorization>,
    #[serde(default)]
    pub context: HookContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub prefetch: Option<HashMap<String, serde_json::Value>>,
}

impl HookRequest {
    /// Non-blank patient id from the hook context.
    pub fn patient_id(&self) -> Option<&str> {
        self.context
            .patient_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Non-blank FHIR server base URL.
    pub fn fhir_server(&self) -> Option<&str> {
        self.fhir_server
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Bearer token granted for the FHIR server, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.fhir_authorization
            .as_ref()
            .and_then(FhirAuthorization::bearer_token)
    }
}

/// `context` of a `patient-view` hook.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct HookContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<String>,
}

// ============================================================================
// Cards
// ============================================================================

/// Response of a CDS service call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CardsRes {
    pub cards: Vec<Card>,
}

impl CardsRes {
    /// A response with no cards, for requests the service cannot act on.
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }
}

/// Urgency of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Info,
    Warning,
    Critical,
}

/// Provenance of a card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CardSource {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single advisory card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Card {
    #[schema(value_type = String)]
    pub uuid: Uuid,
    /// One-line summary, under 140 characters.
    pub summary: String,
    pub indicator: Indicator,
    /// GitHub-flavoured markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub source: CardSource,
}

impl Card {
    /// An informational card with a fresh random id.
    pub fn info(summary: impl Into<String>, detail: impl Into<String>, source: CardSource) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            summary: summary.into(),
            indicator: Indicator::Info,
            detail: Some(detail.into()),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_patient_view_request() {
        let body = json!({
            "hook": "patient-view",
            "hookInstance": "d1577c69-dfbe-44ad-ba6d-3e05e953b2ea",
            "fhirServer": "https://fhir.example.org/r4",
            "fhirAuthorization": {
                "access_token": "some-opaque-fhir-access-token",
                "token_type": "Bearer",
                "expires_in": 300,
                "scope": "user/Patient.read user/Observation.read",
                "subject": "cds-service4"
            },
            "context": {
                "userId": "Practitioner/example",
                "patientId": "1288992",
                "encounterId": "89284"
            },
            "prefetch": { "patientToGreet": { "resourceType": "Patient" } }
        });

        let request: HookRequest = serde_json::from_value(body).expect("parse hook request");
        assert_eq!(request.hook, "patient-view");
        assert_eq!(request.patient_id(), Some("1288992"));
        assert_eq!(request.fhir_server(), Some("https://fhir.example.org/r4"));
        assert_eq!(request.bearer_token(), Some("some-opaque-fhir-access-token"));
        assert_eq!(request.context.encounter_id.as_deref(), Some("89284"));
        assert!(request.prefetch.is_some());
    }

    #[test]
    fn minimal_request_has_no_patient_or_server() {
        let body = json!({
            "hook": "patient-view",
            "hookInstance": "abc",
            "fhirServer": "  ",
            "context": { "patientId": "" }
        });
        let request: HookRequest = serde_json::from_value(body).expect("parse hook request");
        assert_eq!(request.patient_id(), None);
        assert_eq!(request.fhir_server(), None);
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn card_serialises_to_cds_shape() {
        let card = Card::info(
            "MELD Score",
            "**Score:** *Not calculated*",
            CardSource {
                label: "OPTN".into(),
                url: Some("https://optn.example".into()),
            },
        );
        let json = serde_json::to_value(CardsRes { cards: vec![card.clone()] }).unwrap();
        assert_eq!(
            json,
            json!({
                "cards": [{
                    "uuid": card.uuid.to_string(),
                    "summary": "MELD Score",
                    "indicator": "info",
                    "detail": "**Score:** *Not calculated*",
                    "source": { "label": "OPTN", "url": "https://optn.example" }
                }]
            })
        );
    }

    #[test]
    fn empty_cards() {
        assert_eq!(
            serde_json::to_value(CardsRes::empty()).unwrap(),
            json!({ "cards": [] })
        );
    }
}
