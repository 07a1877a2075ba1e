//! Minimal FHIR REST client for the MELD hook.
//!
//! Reads one Patient and the latest Observation for each MELD laboratory code. The six reads
//! are independent and run concurrently; a failed read is logged and leaves its field empty
//! rather than failing the whole fetch.

use std::time::Duration;

use reqwest::Url;

use crate::{
    FhirError, FhirResult, LabCode, LabResult, ObservationBundle, Patient, PatientDemographics,
};

/// Everything the MELD calculation reads from the FHIR server.
///
/// `None` means the value could not be retrieved: the resource was missing, the request failed,
/// or the server's answer could not be understood.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeldInputs {
    pub bilirubin: Option<LabResult>,
    pub sodium: Option<LabResult>,
    pub inr: Option<LabResult>,
    pub albumin: Option<LabResult>,
    pub creatinine: Option<LabResult>,
    pub sex: Option<String>,
    pub date_of_birth: Option<String>,
}

impl MeldInputs {
    /// The lab value fetched for `code`.
    pub fn lab(&self, code: LabCode) -> Option<&LabResult> {
        match code {
            LabCode::TotalBilirubin => self.bilirubin.as_ref(),
            LabCode::Sodium => self.sodium.as_ref(),
            LabCode::Inr => self.inr.as_ref(),
            LabCode::Albumin => self.albumin.as_ref(),
            LabCode::Creatinine => self.creatinine.as_ref(),
        }
    }
}

/// FHIR R4 REST client bound to one server and (optionally) one access token.
#[derive(Clone, Debug)]
pub struct FhirClient {
    http: reqwest::Client,
    base_url: Url,
    bearer: Option<String>,
}

/// Build the HTTP client that [`FhirClient`]s issue their requests through.
///
/// A `reqwest::Client` owns a connection pool; build one per process and hand clones to
/// [`FhirClient::with_http`].
///
/// # Errors
///
/// Returns [`FhirError::Http`] if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> FhirResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("meld-cds-hook/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

impl FhirClient {
    /// Create a client for the server at `base_url` with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if `base_url` is not an absolute http(s) URL, and
    /// [`FhirError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, bearer: Option<String>, timeout: Duration) -> FhirResult<Self> {
        Self::with_http(http_client(timeout)?, base_url, bearer)
    }

    /// Create a client for the server at `base_url` that sends requests through `http`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if `base_url` is not an absolute http(s) URL.
    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        bearer: Option<String>,
    ) -> FhirResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| FhirError::InvalidInput(format!("invalid FHIR server URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(FhirError::InvalidInput(format!(
                "FHIR server URL must be http(s): {base_url}"
            )));
        }

        Ok(Self {
            http,
            base_url,
            bearer: bearer.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Read `Patient/{patient_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the request fails, the server answers with a non-success status,
    /// or the body is not a Patient resource.
    pub async fn patient(&self, patient_id: &str) -> FhirResult<PatientDemographics> {
        let url = self.resource_url(&["Patient", patient_id])?;
        let body = self.get(url).await?;
        Patient::parse(&body)
    }

    /// Search for the most recent Observation with `code` for `patient_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::NotFound`] when the search matches nothing, and other [`FhirError`]
    /// variants for transport or schema problems.
    pub async fn latest_observation(
        &self,
        patient_id: &str,
        code: LabCode,
    ) -> FhirResult<LabResult> {
        let mut url = self.resource_url(&["Observation"])?;
        url.query_pairs_mut()
            .append_pair("patient", patient_id)
            .append_pair("code", code.loinc())
            .append_pair("_sort", "-date")
            .append_pair("_count", "1");
        let body = self.get(url).await?;
        ObservationBundle::latest(&body, code)
    }

    /// Fetch every MELD input for `patient_id` concurrently.
    ///
    /// Never fails: each read that errors is logged and its field left as `None`.
    pub async fn fetch_meld_inputs(&self, patient_id: &str) -> MeldInputs {
        let (bilirubin, sodium, inr, albumin, creatinine, patient) = tokio::join!(
            self.latest_observation(patient_id, LabCode::TotalBilirubin),
            self.latest_observation(patient_id, LabCode::Sodium),
            self.latest_observation(patient_id, LabCode::Inr),
            self.latest_observation(patient_id, LabCode::Albumin),
            self.latest_observation(patient_id, LabCode::Creatinine),
            self.patient(patient_id),
        );

        let patient = patient.unwrap_or_else(|e| {
            tracing::warn!(patient_id, error = %e, "failed to fetch patient");
            PatientDemographics::default()
        });

        MeldInputs {
            bilirubin: lab_or_log(LabCode::TotalBilirubin, bilirubin),
            sodium: lab_or_log(LabCode::Sodium, sodium),
            inr: lab_or_log(LabCode::Inr, inr),
            albumin: lab_or_log(LabCode::Albumin, albumin),
            creatinine: lab_or_log(LabCode::Creatinine, creatinine),
            sex: patient.gender,
            date_of_birth: patient.birth_date,
        }
    }

    fn resource_url(&self, segments: &[&str]) -> FhirResult<Url> {
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(FhirError::InvalidInput(
                "FHIR path segments cannot be empty".into(),
            ));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FhirError::InvalidInput("FHIR server URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url) -> FhirResult<String> {
        tracing::debug!(%url, "FHIR GET");

        let mut request = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/fhir+json");
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FhirError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

fn lab_or_log(code: LabCode, result: FhirResult<LabResult>) -> Option<LabResult> {
    match result {
        Ok(lab) => Some(lab),
        Err(e) => {
            tracing::warn!(lab = %code, error = %e, "failed to fetch observation");
            None
        }
    }
}
