//! # API Shared
//!
//! Shared wire types for the MELD CDS Hooks API.
//!
//! Contains:
//! - The CDS Hooks request envelope, discovery document and card response (`cds` module)
//! - The `fhirAuthorization` block and bearer-token helpers (`auth` module)
//! - A health check service
//!
//! Every type derives serde and `utoipa::ToSchema` so `api-rest` can serve and document them
//! without redefining anything.

pub mod auth;
pub mod cds;
pub mod health;

pub use auth::FhirAuthorization;
pub use cds::{
    Card, CardSource, CardsRes, DiscoveryRes, HookContext, HookRequest, Indicator,
    ServiceDescriptor,
};
pub use health::{HealthRes, HealthService};
