//! Constants used throughout the MELD core crate.
//!
//! Validation bounds, working clamps and formula coefficients follow the OPTN MELD/PELD
//! calculator user guide:
//! <https://optn.transplant.hrsa.gov/media/qmsdjqst/meld-peld-calculator-user-guide.pdf>

use std::ops::RangeInclusive;

/// Accepted total bilirubin, mg/dL.
pub const BILIRUBIN_RANGE: RangeInclusive<f64> = 0.0..=99.0;

/// Accepted serum sodium, mEq/L.
pub const SODIUM_RANGE: RangeInclusive<f64> = 100.0..=200.0;

/// Accepted INR.
pub const INR_RANGE: RangeInclusive<f64> = 0.5..=99.0;

/// Accepted albumin, g/dL.
pub const ALBUMIN_RANGE: RangeInclusive<f64> = 0.5..=9.9;

/// Accepted serum creatinine, mg/dL.
pub const CREATININE_RANGE: RangeInclusive<f64> = 0.01..=40.0;

/// Youngest age (in whole years) a MELD score is calculated for.
pub const MIN_AGE_YEARS: u32 = 12;

/// Age at which the adult formula replaces the pediatric band.
pub const ADULT_AGE_YEARS: u32 = 18;

/// Floor applied to bilirubin, INR and creatinine before taking logarithms.
pub const LAB_FLOOR: f64 = 1.0;

/// Working clamp for sodium, mEq/L.
pub const SODIUM_CLAMP: RangeInclusive<f64> = 125.0..=137.0;

/// Working clamp for albumin, g/dL.
pub const ALBUMIN_CLAMP: RangeInclusive<f64> = 1.5..=3.5;

/// Creatinine ceiling, also used when the patient had dialysis.
pub const CREATININE_CEILING: f64 = 3.0;

/// Lowest reportable MELD score.
pub const MIN_SCORE: u8 = 6;

/// Highest reportable MELD score.
pub const MAX_SCORE: u8 = 40;

/// Error reported for patients younger than [`MIN_AGE_YEARS`].
pub const AGE_INELIGIBLE_MESSAGE: &str = "Age must be 12 or older to calculate MELD score.";

/// Identifier of the CDS service exposed by the hook endpoint.
pub const SERVICE_ID: &str = "meld-score-optn";

/// OPTN MELD calculator reference page.
pub const OPTN_CALCULATOR_URL: &str =
    "https://optn.transplant.hrsa.gov/data/allocation-calculators/meld-calculator/";

/// Default listen address for the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default per-request timeout for FHIR reads, in seconds.
pub const DEFAULT_FHIR_TIMEOUT_SECS: u64 = 10;
