//! # MELD Core
//!
//! Core business logic for the MELD CDS Hooks service.
//!
//! This crate contains the pure clinical logic:
//! - Validation of the MELD inputs against the OPTN plausibility ranges
//! - The MELD/PELD-band score calculation with its floors, clamps and dialysis override
//! - Assessment of fetched FHIR inputs and rendering of the advisory card detail
//!
//! **No API concerns**: HTTP serving, CORS and the CDS Hooks envelope belong in `api-rest` and
//! `api-shared`; FHIR transport belongs in `fhir`. Nothing here reads the clock: callers pass
//! "today" explicitly.

pub mod assessment;
pub mod config;
pub mod constants;
pub mod error;
pub mod markdown;
pub mod score;
pub mod validation;

use std::sync::Arc;

use chrono::NaiveDate;
use fhir::MeldInputs;

pub use assessment::{assess, MeldAssessment};
pub use config::{CoreConfig, MissingLabPolicy};
pub use error::{MeldError, MeldResult};
pub use score::{calculate_score, MeldScore, ScoreResult};
pub use validation::{
    validate, validate_all, ClinicalParameters, RawParameters, Sex, ValidationError,
};

/// A rendered assessment, ready to be placed on a card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeldReport {
    pub assessment: MeldAssessment,
    /// Markdown detail for the card.
    pub detail: String,
}

/// MELD operations bound to a startup configuration - no API concerns.
#[derive(Clone, Debug)]
pub struct MeldService {
    cfg: Arc<CoreConfig>,
}

impl MeldService {
    /// Creates a new `MeldService` using the supplied configuration.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Assesses fetched inputs as of `today` and renders the card detail.
    pub fn report(&self, inputs: &MeldInputs, today: NaiveDate) -> MeldReport {
        let assessment = assess(inputs, self.cfg.missing_lab_policy(), today);
        let detail = markdown::card_detail(&assessment, inputs);
        MeldReport { assessment, detail }
    }
}
