use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use meld_core::config::{fhir_timeout_from_env_value, missing_lab_policy_from_env_value};
use meld_core::constants::DEFAULT_REST_ADDR;
use meld_core::{CoreConfig, MeldService};

/// Main entry point for the MELD CDS Hooks service
///
/// Serves the CDS Hooks discovery endpoint and the MELD hook over REST, with Swagger UI at
/// `/swagger-ui`.
///
/// # Environment Variables
/// - `MELD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MELD_FHIR_TIMEOUT_SECS`: per-request timeout for FHIR reads (default: 10)
/// - `MELD_MISSING_LAB_POLICY`: `block` or `zero-fill` (default: `block`)
/// - `RUST_LOG`: extra tracing directives
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid, or server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meld_run=info".parse()?)
                .add_directive("meld_core=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("fhir=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MELD_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let fhir_timeout = fhir_timeout_from_env_value(std::env::var("MELD_FHIR_TIMEOUT_SECS").ok())?;
    let missing_lab_policy =
        missing_lab_policy_from_env_value(std::env::var("MELD_MISSING_LAB_POLICY").ok())?;

    let cfg = Arc::new(CoreConfig::new(fhir_timeout, missing_lab_policy)?);

    tracing::info!("++ Starting MELD CDS Hooks REST on {}", rest_addr);
    tracing::info!(
        fhir_timeout_secs = fhir_timeout.as_secs(),
        %missing_lab_policy,
        "configuration resolved"
    );

    let http = fhir::http_client(cfg.fhir_timeout())?;
    let app = api_rest::router(AppState::new(MeldService::new(cfg), http));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
