//! # API REST
//!
//! REST API implementation of the MELD CDS Hooks service.
//!
//! Handles:
//! - HTTP endpoints with axum (discovery, the MELD hook, health)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS)
//!
//! Uses `api-shared` for the CDS Hooks wire types, `fhir` to read the patient's data and
//! `meld-core` for the calculation itself.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    Card, CardSource, CardsRes, DiscoveryRes, FhirAuthorization, HealthRes, HealthService,
    HookContext, HookRequest, Indicator, ServiceDescriptor,
};
use fhir::FhirClient;
use meld_core::constants::{OPTN_CALCULATOR_URL, SERVICE_ID};
use meld_core::MeldService;

/// Summary shown on every MELD card.
const CARD_SUMMARY: &str = "MELD Score";

/// Application state shared across REST API handlers
///
/// Holds the MELD service, the HTTP client every hook call reads FHIR through, and the clock
/// used to date each calculation. The clock is a plain function pointer so tests can pin
/// "today".
#[derive(Clone)]
pub struct AppState {
    meld: MeldService,
    http: reqwest::Client,
    today: fn() -> NaiveDate,
}

impl AppState {
    /// State using the server's local calendar date.
    pub fn new(meld: MeldService, http: reqwest::Client) -> Self {
        Self::with_clock(meld, http, local_today)
    }

    pub fn with_clock(
        meld: MeldService,
        http: reqwest::Client,
        today: fn() -> NaiveDate,
    ) -> Self {
        Self { meld, http, today }
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(OpenApi)]
#[openapi(
    paths(health, discovery, meld_score_optn),
    components(schemas(
        HealthRes,
        DiscoveryRes,
        ServiceDescriptor,
        HookRequest,
        HookContext,
        FhirAuthorization,
        CardsRes,
        Card,
        CardSource,
        Indicator,
    ))
)]
pub struct ApiDoc;

/// Build the application router.
///
/// CORS is fully permissive: CDS clients call from arbitrary EHR origins.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cds-services", get(discovery))
        .route(&format!("/cds-services/{SERVICE_ID}"), post(meld_score_optn))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The discovery entry for the MELD service.
pub fn meld_service_descriptor() -> ServiceDescriptor {
    ServiceDescriptor {
        hook: "patient-view".into(),
        title: "MELD Score (OPTN)".into(),
        description: format!(
            "The Model for End-Stage Liver Disease (MELD) is a calculated formula used to assign \
             priority to most liver transplant candidates age 12 and older based upon their \
             medical urgency. Read more at {OPTN_CALCULATOR_URL}"
        ),
        id: SERVICE_ID.into(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/cds-services",
    responses(
        (status = 200, description = "CDS Hooks discovery document", body = DiscoveryRes)
    )
)]
/// CDS Hooks discovery endpoint
///
/// Advertises the single MELD service and the hook that triggers it.
#[axum::debug_handler]
async fn discovery() -> Json<DiscoveryRes> {
    Json(DiscoveryRes {
        services: vec![meld_service_descriptor()],
    })
}

#[utoipa::path(
    post,
    path = "/cds-services/meld-score-optn",
    request_body = HookRequest,
    responses(
        (status = 200, description = "MELD card, or no cards when the request lacks a FHIR server or patient", body = CardsRes),
        (status = 400, description = "fhirServer is not a usable http(s) URL")
    )
)]
/// MELD score hook
///
/// Reads the patient's latest MELD labs and demographics from the CDS client's FHIR server,
/// scores them with and without dialysis, and returns one informational card whose markdown
/// detail shows the scores (or why they could not be calculated) and every input used.
///
/// Requests without `fhirServer` or `context.patientId` get an empty card list.
///
/// # Returns
/// * `Ok(Json<CardsRes>)` - Zero or one card
/// * `Err((StatusCode, &str))` - Bad request if the FHIR server URL is unusable
#[axum::debug_handler]
async fn meld_score_optn(
    State(state): State<AppState>,
    Json(req): Json<HookRequest>,
) -> Result<Json<CardsRes>, (StatusCode, &'static str)> {
    let (Some(fhir_server), Some(patient_id)) = (req.fhir_server(), req.patient_id()) else {
        tracing::warn!(
            hook_instance = %req.hook_instance,
            "FHIR server and patient ID are required"
        );
        return Ok(Json(CardsRes::empty()));
    };

    let client = FhirClient::with_http(
        state.http.clone(),
        fhir_server,
        req.bearer_token().map(str::to_owned),
    )
    .map_err(|e| {
        tracing::warn!(hook_instance = %req.hook_instance, error = %e, "unusable FHIR server");
        (StatusCode::BAD_REQUEST, "Invalid fhirServer")
    })?;

    let inputs = client.fetch_meld_inputs(patient_id).await;
    let report = state.meld.report(&inputs, (state.today)());

    tracing::info!(
        hook_instance = %req.hook_instance,
        scored = report.assessment.is_scored(),
        "MELD card rendered"
    );

    Ok(Json(CardsRes {
        cards: vec![Card::info(
            CARD_SUMMARY,
            report.detail,
            CardSource {
                label: "OPTN".into(),
                url: Some(OPTN_CALCULATOR_URL.into()),
            },
        )],
    }))
}
