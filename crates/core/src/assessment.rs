//! Assessment of fetched FHIR inputs.
//!
//! Bridges the fetch layer and the calculator: decides what to do with inputs that could not be
//! fetched, validates the rest and scores the patient both with and without dialysis, since the
//! hook has no reliable dialysis history to choose between them.

use chrono::NaiveDate;
use fhir::{LabCode, MeldInputs};

use crate::config::MissingLabPolicy;
use crate::score::{calculate_score, MeldScore, ScoreResult};
use crate::validation::{validate_all, RawParameters};

/// Result of assessing one patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeldAssessment {
    Scored {
        with_dialysis: MeldScore,
        without_dialysis: MeldScore,
    },
    NotScored {
        /// Never empty.
        errors: Vec<String>,
    },
}

impl MeldAssessment {
    pub fn is_scored(&self) -> bool {
        matches!(self, MeldAssessment::Scored { .. })
    }

    pub fn errors(&self) -> &[String] {
        match self {
            MeldAssessment::Scored { .. } => &[],
            MeldAssessment::NotScored { errors } => errors,
        }
    }

    fn not_scored(errors: Vec<String>) -> Self {
        let failure = ScoreResult::failures(errors);
        MeldAssessment::NotScored {
            errors: failure.errors().to_vec(),
        }
    }
}

/// Build validator input from fetched values according to `policy`.
///
/// The dialysis flag is left `false`; [`assess`] scores both cases.
///
/// # Errors
///
/// Under [`MissingLabPolicy::Block`], returns one message per missing input.
pub fn raw_parameters(
    inputs: &MeldInputs,
    policy: MissingLabPolicy,
) -> Result<RawParameters, Vec<String>> {
    if policy == MissingLabPolicy::Block {
        let mut missing: Vec<String> = LabCode::ALL
            .iter()
            .filter(|code| inputs.lab(**code).is_none())
            .map(|code| format!("No {} observation found", code.label().to_lowercase()))
            .collect();
        if inputs.sex.is_none() {
            missing.push("No sex recorded for the patient".into());
        }
        if inputs.date_of_birth.is_none() {
            missing.push("No date of birth recorded for the patient".into());
        }
        if !missing.is_empty() {
            return Err(missing);
        }
    }

    let value = |code: LabCode| inputs.lab(code).map_or(0.0, |lab| lab.value);

    Ok(RawParameters {
        sex: inputs.sex.clone().unwrap_or_default(),
        bilirubin: value(LabCode::TotalBilirubin),
        sodium: value(LabCode::Sodium),
        inr: value(LabCode::Inr),
        albumin: value(LabCode::Albumin),
        creatinine: value(LabCode::Creatinine),
        had_dialysis: false,
        date_of_birth: inputs.date_of_birth.clone().unwrap_or_default(),
    })
}

/// Assess `inputs` as of `today`.
pub fn assess(inputs: &MeldInputs, policy: MissingLabPolicy, today: NaiveDate) -> MeldAssessment {
    let raw = match raw_parameters(inputs, policy) {
        Ok(raw) => raw,
        Err(missing) => {
            tracing::info!(?missing, "MELD inputs incomplete");
            return MeldAssessment::not_scored(missing);
        }
    };

    let params = match validate_all(&raw, today) {
        Ok(params) => params,
        Err(errors) => {
            tracing::info!(?errors, "MELD inputs failed validation");
            return MeldAssessment::not_scored(errors.iter().map(ToString::to_string).collect());
        }
    };

    let with_dialysis = calculate_score(&params.with_dialysis(true), today);
    let without_dialysis = calculate_score(&params.with_dialysis(false), today);

    match (with_dialysis.value(), without_dialysis.value()) {
        (Some(with_dialysis), Some(without_dialysis)) => MeldAssessment::Scored {
            with_dialysis,
            without_dialysis,
        },
        _ => {
            let mut errors = with_dialysis.errors().to_vec();
            for error in without_dialysis.errors() {
                if !errors.contains(error) {
                    errors.push(error.clone());
                }
            }
            MeldAssessment::not_scored(errors)
        }
    }
}
