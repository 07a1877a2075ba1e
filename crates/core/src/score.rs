//! MELD score calculation.
//!
//! Implements the OPTN MELD formula for candidates aged 12 and older:
//! - ages 12 to 17 use the pediatric band (no sex term, constant 7.33)
//! - ages 18 and over use the adult formula (female term 1.33, constant 6)
//!
//! Bilirubin, INR and creatinine are floored at 1.0 so every logarithm is non-negative, sodium
//! and albumin are clamped to their working ranges, and creatinine is capped at 3.0 (also when
//! the patient had dialysis). The result is rounded half away from zero and clamped to 6..=40.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::constants::{
    ADULT_AGE_YEARS, AGE_INELIGIBLE_MESSAGE, ALBUMIN_CLAMP, CREATININE_CEILING, LAB_FLOOR,
    MAX_SCORE, MIN_AGE_YEARS, MIN_SCORE, SODIUM_CLAMP,
};
use crate::validation::{ClinicalParameters, Sex};

/// A reportable MELD score, always within 6..=40.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MeldScore(u8);

impl MeldScore {
    /// Rounds a raw formula value to the nearest integer (half away from zero) and clamps it to
    /// the reportable range.
    ///
    /// Returns `None` for non-finite input.
    pub fn from_raw(raw: f64) -> Option<Self> {
        if !raw.is_finite() {
            return None;
        }
        let clamped = raw.round().clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE));
        Some(Self(clamped as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for MeldScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a score calculation.
///
/// Either a score with no errors, or no score with at least one error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    value: Option<MeldScore>,
    errors: Vec<String>,
    success: bool,
}

impl ScoreResult {
    pub fn success(value: MeldScore) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
            success: true,
        }
    }

    /// A failed calculation with a single reason.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            value: None,
            errors: vec![error.into()],
            success: false,
        }
    }

    /// A failed calculation with several reasons. An empty list is replaced with a generic
    /// reason so a failure is never silent.
    pub fn failures<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut errors: Vec<String> = errors.into_iter().map(Into::into).collect();
        if errors.is_empty() {
            errors.push("MELD score could not be calculated".into());
        }
        Self {
            value: None,
            errors,
            success: false,
        }
    }

    pub fn value(&self) -> Option<MeldScore> {
        self.value
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Formula band selected by age.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeBand {
    /// 12 to 17 years.
    Pediatric,
    /// 18 years and over.
    Adult,
}

impl AgeBand {
    /// Band for `age` whole years, or `None` below the supported minimum.
    pub fn for_age(age: u32) -> Option<Self> {
        if age < MIN_AGE_YEARS {
            None
        } else if age < ADULT_AGE_YEARS {
            Some(AgeBand::Pediatric)
        } else {
            Some(AgeBand::Adult)
        }
    }
}

/// Whole years between `date_of_birth` and `today`.
///
/// Returns 0 when `today` precedes the date of birth.
pub fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    u32::try_from(age).unwrap_or(0)
}

/// Working copies of the lab values after floors, clamps and the creatinine cap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AdjustedLabs {
    pub bilirubin: f64,
    pub sodium: f64,
    pub inr: f64,
    pub albumin: f64,
    pub creatinine: f64,
}

impl AdjustedLabs {
    pub(crate) fn from_params(params: &ClinicalParameters) -> Self {
        let mut creatinine = params.creatinine().max(LAB_FLOOR);
        if creatinine > CREATININE_CEILING || params.had_dialysis() {
            creatinine = CREATININE_CEILING;
        }

        Self {
            bilirubin: params.bilirubin().max(LAB_FLOOR),
            sodium: params
                .sodium()
                .clamp(*SODIUM_CLAMP.start(), *SODIUM_CLAMP.end()),
            inr: params.inr().max(LAB_FLOOR),
            albumin: params
                .albumin()
                .clamp(*ALBUMIN_CLAMP.start(), *ALBUMIN_CLAMP.end()),
            creatinine,
        }
    }
}

/// Unrounded, unclamped formula value.
pub(crate) fn raw_score(labs: &AdjustedLabs, band: AgeBand, sex: Sex) -> f64 {
    let ln_bilirubin = labs.bilirubin.ln();
    let ln_creatinine = labs.creatinine.ln();
    let sodium_deficit = 137.0 - labs.sodium;
    let albumin_deficit = 3.5 - labs.albumin;

    let polynomial = 4.56 * ln_bilirubin + 0.82 * sodium_deficit
        - 0.24 * sodium_deficit * ln_bilirubin
        + 9.09 * labs.inr.ln()
        + 11.14 * ln_creatinine
        + 1.85 * albumin_deficit
        - 1.83 * albumin_deficit * ln_creatinine;

    match band {
        AgeBand::Pediatric => polynomial + 7.33,
        AgeBand::Adult => {
            let sex_term = if sex == Sex::Female { 1.33 } else { 0.0 };
            polynomial + sex_term + 6.0
        }
    }
}

/// Calculates the MELD score for `params` as of `today`.
///
/// Never panics and never fails outright: patients younger than 12 and internal arithmetic
/// faults are reported through [`ScoreResult::errors`].
pub fn calculate_score(params: &ClinicalParameters, today: NaiveDate) -> ScoreResult {
    let age = age_in_years(params.date_of_birth(), today);
    let Some(band) = AgeBand::for_age(age) else {
        tracing::info!(age, "patient below MELD age range");
        return ScoreResult::failure(AGE_INELIGIBLE_MESSAGE);
    };

    let labs = AdjustedLabs::from_params(params);
    let raw = raw_score(&labs, band, params.sex());

    match MeldScore::from_raw(raw) {
        Some(score) => ScoreResult::success(score),
        None => {
            tracing::error!(?labs, ?band, raw, "non-finite MELD score");
            ScoreResult::failure(format!(
                "Error calculating MELD score: formula produced non-finite value {raw}"
            ))
        }
    }
}
