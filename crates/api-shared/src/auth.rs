use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// OAuth 2.0 access details the CDS client grants for reading its FHIR server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FhirAuthorization {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub scope: String,
    pub subject: String,
}

impl FhirAuthorization {
    /// The access token, if it is a non-empty bearer token.
    ///
    /// `token_type` is compared case-insensitively; CDS clients send both `Bearer` and `bearer`.
    pub fn bearer_token(&self) -> Option<&str> {
        let token = self.access_token.trim();
        if self.token_type.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token)
        } else {
            None
        }
    }
}
