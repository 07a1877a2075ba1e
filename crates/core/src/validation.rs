//! Parameter validation for the MELD calculation.
//!
//! Raw values arrive from the FHIR fetch layer or the CLI as plain scalars. They are checked
//! against the OPTN plausibility ranges before any arithmetic happens, and only a fully valid
//! set of values can become a [`ClinicalParameters`].

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ALBUMIN_RANGE, BILIRUBIN_RANGE, CREATININE_RANGE, INR_RANGE, SODIUM_RANGE,
};

/// Administrative sex as used by the adult MELD formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    /// Case-insensitive parse of `"male"` / `"female"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("male") {
            Ok(Sex::Male)
        } else if s.eq_ignore_ascii_case("female") {
            Ok(Sex::Female)
        } else {
            Err(ValidationError::InvalidSex {
                value: s.to_owned(),
            })
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input field a validation error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Sex,
    Bilirubin,
    Sodium,
    Inr,
    Albumin,
    Creatinine,
    DateOfBirth,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Sex => "sex",
            Field::Bilirubin => "bilirubin",
            Field::Sodium => "sodium",
            Field::Inr => "inr",
            Field::Albumin => "albumin",
            Field::Creatinine => "creatinine",
            Field::DateOfBirth => "date_of_birth",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a date of birth was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateOfBirthProblem {
    #[error("date of birth must be less than or equal to the current date")]
    InFuture(NaiveDate),
    #[error("date of birth must be a YYYY-MM-DD date, got {0:?}")]
    Unparseable(String),
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("sex must be either \"male\" or \"female\"")]
    InvalidSex { value: String },
    #[error("bilirubin must be between 0 and 99 mg/dL")]
    InvalidBilirubin { value: f64 },
    #[error("sodium must be between 100 and 200 mEq/L")]
    InvalidSodium { value: f64 },
    #[error("INR must be between 0.5 and 99")]
    InvalidInr { value: f64 },
    #[error("albumin must be between 0.5 and 9.9 g/dL")]
    InvalidAlbumin { value: f64 },
    #[error("creatinine must be between 0.01 and 40 mg/dL")]
    InvalidCreatinine { value: f64 },
    #[error("{0}")]
    InvalidDateOfBirth(DateOfBirthProblem),
}

impl ValidationError {
    /// The input field that failed.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::InvalidSex { .. } => Field::Sex,
            ValidationError::InvalidBilirubin { .. } => Field::Bilirubin,
            ValidationError::InvalidSodium { .. } => Field::Sodium,
            ValidationError::InvalidInr { .. } => Field::Inr,
            ValidationError::InvalidAlbumin { .. } => Field::Albumin,
            ValidationError::InvalidCreatinine { .. } => Field::Creatinine,
            ValidationError::InvalidDateOfBirth(_) => Field::DateOfBirth,
        }
    }
}

/// Unvalidated scalar inputs, exactly as received from the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct RawParameters {
    pub sex: String,
    pub bilirubin: f64,
    pub sodium: f64,
    pub inr: f64,
    pub albumin: f64,
    pub creatinine: f64,
    pub had_dialysis: bool,
    /// ISO 8601 date (`YYYY-MM-DD`); a trailing time component is ignored.
    pub date_of_birth: String,
}

/// Validated inputs to the MELD formula.
///
/// Can only be obtained through [`validate`] or [`validate_all`], so every value is known to be
/// inside its plausibility range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClinicalParameters {
    sex: Sex,
    bilirubin: f64,
    sodium: f64,
    inr: f64,
    albumin: f64,
    creatinine: f64,
    had_dialysis: bool,
    date_of_birth: NaiveDate,
}

impl ClinicalParameters {
    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn bilirubin(&self) -> f64 {
        self.bilirubin
    }

    pub fn sodium(&self) -> f64 {
        self.sodium
    }

    pub fn inr(&self) -> f64 {
        self.inr
    }

    pub fn albumin(&self) -> f64 {
        self.albumin
    }

    pub fn creatinine(&self) -> f64 {
        self.creatinine
    }

    pub fn had_dialysis(&self) -> bool {
        self.had_dialysis
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    /// Copy of these parameters with a different dialysis flag.
    ///
    /// The flag has no validation rule, so this cannot break any invariant.
    pub fn with_dialysis(self, had_dialysis: bool) -> Self {
        Self {
            had_dialysis,
            ..self
        }
    }
}

/// Validates `raw`, failing on the first rejected field.
///
/// Fields are checked in declaration order: sex, bilirubin, sodium, INR, albumin, creatinine,
/// date of birth. `today` is the reference date for the date-of-birth check.
///
/// # Errors
///
/// Returns the [`ValidationError`] for the first field outside its permitted range.
pub fn validate(
    raw: &RawParameters,
    today: NaiveDate,
) -> Result<ClinicalParameters, ValidationError> {
    Ok(ClinicalParameters {
        sex: raw.sex.parse()?,
        bilirubin: check_bilirubin(raw.bilirubin)?,
        sodium: check_sodium(raw.sodium)?,
        inr: check_inr(raw.inr)?,
        albumin: check_albumin(raw.albumin)?,
        creatinine: check_creatinine(raw.creatinine)?,
        had_dialysis: raw.had_dialysis,
        date_of_birth: parse_date_of_birth(&raw.date_of_birth, today)?,
    })
}

/// Validates every field of `raw` independently.
///
/// # Errors
///
/// Returns all rejected fields, in the same order [`validate`] checks them. The vector is never
/// empty.
pub fn validate_all(
    raw: &RawParameters,
    today: NaiveDate,
) -> Result<ClinicalParameters, Vec<ValidationError>> {
    let sex = raw.sex.parse::<Sex>();
    let bilirubin = check_bilirubin(raw.bilirubin);
    let sodium = check_sodium(raw.sodium);
    let inr = check_inr(raw.inr);
    let albumin = check_albumin(raw.albumin);
    let creatinine = check_creatinine(raw.creatinine);
    let date_of_birth = parse_date_of_birth(&raw.date_of_birth, today);

    match (sex, bilirubin, sodium, inr, albumin, creatinine, date_of_birth) {
        (Ok(sex), Ok(bilirubin), Ok(sodium), Ok(inr), Ok(albumin), Ok(creatinine), Ok(dob)) => {
            Ok(ClinicalParameters {
                sex,
                bilirubin,
                sodium,
                inr,
                albumin,
                creatinine,
                had_dialysis: raw.had_dialysis,
                date_of_birth: dob,
            })
        }
        (sex, bilirubin, sodium, inr, albumin, creatinine, dob) => Err([
            sex.err(),
            bilirubin.err(),
            sodium.err(),
            inr.err(),
            albumin.err(),
            creatinine.err(),
            dob.err(),
        ]
        .into_iter()
        .flatten()
        .collect()),
    }
}

// NaN never satisfies `contains`, so non-numbers fail with the field's range error.
fn within(
    value: f64,
    range: RangeInclusive<f64>,
    reject: fn(f64) -> ValidationError,
) -> Result<f64, ValidationError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(reject(value))
    }
}

fn check_bilirubin(value: f64) -> Result<f64, ValidationError> {
    within(value, BILIRUBIN_RANGE, |value| ValidationError::InvalidBilirubin { value })
}

fn check_sodium(value: f64) -> Result<f64, ValidationError> {
    within(value, SODIUM_RANGE, |value| ValidationError::InvalidSodium { value })
}

fn check_inr(value: f64) -> Result<f64, ValidationError> {
    within(value, INR_RANGE, |value| ValidationError::InvalidInr { value })
}

fn check_albumin(value: f64) -> Result<f64, ValidationError> {
    within(value, ALBUMIN_RANGE, |value| ValidationError::InvalidAlbumin { value })
}

fn check_creatinine(value: f64) -> Result<f64, ValidationError> {
    within(value, CREATININE_RANGE, |value| ValidationError::InvalidCreatinine { value })
}

fn parse_date_of_birth(value: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    // FHIR dateTime values carry the date in the first ten characters.
    let date_part = match trimmed.get(..10) {
        Some(date) if trimmed.as_bytes().get(10) == Some(&b'T') => date,
        _ => trimmed,
    };

    let dob = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidDateOfBirth(DateOfBirthProblem::Unparseable(value.to_owned()))
    })?;

    if dob > today {
        return Err(ValidationError::InvalidDateOfBirth(
            DateOfBirthProblem::InFuture(dob),
        ));
    }

    Ok(dob)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn sample() -> RawParameters {
        RawParameters {
            sex: "male".into(),
            bilirubin: 1.2,
            sodium: 135.0,
            inr: 1.1,
            albumin: 3.0,
            creatinine: 1.5,
            had_dialysis: false,
            date_of_birth: "1990-01-01".into(),
        }
    }

    #[test]
    fn accepts_sample_parameters() {
        let params = validate(&sample(), today()).expect("valid parameters");
        assert_eq!(params.sex(), Sex::Male);
        assert_eq!(params.bilirubin(), 1.2);
        assert_eq!(params.sodium(), 135.0);
        assert_eq!(params.inr(), 1.1);
        assert_eq!(params.albumin(), 3.0);
        assert_eq!(params.creatinine(), 1.5);
        assert!(!params.had_dialysis());
        assert_eq!(
            params.date_of_birth(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
        );
    }

    #[test]
    fn rejects_bilirubin_out_of_range() {
        let raw = RawParameters {
            bilirubin: 100.0,
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("bilirubin 100 is out of range");
        assert_eq!(err.field(), Field::Bilirubin);
        assert_eq!(err.to_string(), "bilirubin must be between 0 and 99 mg/dL");
    }

    #[test]
    fn rejects_sodium_out_of_range() {
        let raw = RawParameters {
            sodium: 99.0,
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("sodium 99 is out of range");
        assert_eq!(err, ValidationError::InvalidSodium { value: 99.0 });
        assert_eq!(err.to_string(), "sodium must be between 100 and 200 mEq/L");
    }

    #[test]
    fn rejects_inr_out_of_range() {
        let raw = RawParameters {
            inr: 0.4,
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("INR 0.4 is out of range");
        assert_eq!(err.field(), Field::Inr);
        assert_eq!(err.to_string(), "INR must be between 0.5 and 99");
    }

    #[test]
    fn rejects_albumin_out_of_range() {
        let raw = RawParameters {
            albumin: 0.4,
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("albumin 0.4 is out of range");
        assert_eq!(err.field(), Field::Albumin);
        assert_eq!(err.to_string(), "albumin must be between 0.5 and 9.9 g/dL");
    }

    #[test]
    fn rejects_zero_creatinine() {
        let raw = RawParameters {
            creatinine: 0.0,
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("creatinine 0 is out of range");
        assert_eq!(err.field(), Field::Creatinine);
        assert_eq!(err.to_string(), "creatinine must be between 0.01 and 40 mg/dL");
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let low = RawParameters {
            bilirubin: 0.0,
            sodium: 100.0,
            inr: 0.5,
            albumin: 0.5,
            creatinine: 0.01,
            ..sample()
        };
        let high = RawParameters {
            bilirubin: 99.0,
            sodium: 200.0,
            inr: 99.0,
            albumin: 9.9,
            creatinine: 40.0,
            ..sample()
        };
        assert!(validate(&low, today()).is_ok());
        assert!(validate(&high, today()).is_ok());
    }

    #[test]
    fn rejects_nan() {
        let raw = RawParameters {
            inr: f64::NAN,
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("NaN is never in range");
        assert_eq!(err.field(), Field::Inr);
    }

    #[test]
    fn sex_is_case_insensitive() {
        for sex in ["male", "female", "MALE", "Female", "fEmAlE"] {
            let raw = RawParameters {
                sex: sex.into(),
                ..sample()
            };
            assert!(validate(&raw, today()).is_ok(), "{sex} should be accepted");
        }

        let female = RawParameters {
            sex: "FEMALE".into(),
            ..sample()
        };
        assert_eq!(validate(&female, today()).unwrap().sex(), Sex::Female);
    }

    #[test]
    fn rejects_unknown_sex() {
        let raw = RawParameters {
            sex: "unknown".into(),
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("unknown sex is rejected");
        assert_eq!(err.field(), Field::Sex);
        assert_eq!(err.to_string(), "sex must be either \"male\" or \"female\"");
    }

    #[test]
    fn rejects_future_date_of_birth() {
        let raw = RawParameters {
            date_of_birth: "3000-01-01".into(),
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("future DOB is rejected");
        assert_eq!(err.field(), Field::DateOfBirth);
        assert!(matches!(
            err,
            ValidationError::InvalidDateOfBirth(DateOfBirthProblem::InFuture(_))
        ));
    }

    #[test]
    fn birth_today_is_accepted() {
        let raw = RawParameters {
            date_of_birth: "2024-06-01".into(),
            ..sample()
        };
        assert!(validate(&raw, today()).is_ok());
    }

    #[test]
    fn accepts_date_time_of_birth() {
        let raw = RawParameters {
            date_of_birth: "1990-01-01T08:30:00Z".into(),
            ..sample()
        };
        let params = validate(&raw, today()).expect("date-time DOB is accepted");
        assert_eq!(
            params.date_of_birth(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
        );
    }

    #[test]
    fn rejects_partial_date_of_birth() {
        for dob in ["1990", "1990-01", "", "not a date"] {
            let raw = RawParameters {
                date_of_birth: dob.into(),
                ..sample()
            };
            let err = validate(&raw, today()).expect_err("partial DOB is rejected");
            assert_eq!(
                err,
                ValidationError::InvalidDateOfBirth(DateOfBirthProblem::Unparseable(dob.into()))
            );
        }
    }

    #[test]
    fn validate_reports_first_failure_in_field_order() {
        let raw = RawParameters {
            sex: "unknown".into(),
            sodium: 50.0,
            date_of_birth: "3000-01-01".into(),
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("several fields are invalid");
        assert_eq!(err.field(), Field::Sex);

        let raw = RawParameters {
            albumin: 20.0,
            creatinine: 50.0,
            ..sample()
        };
        let err = validate(&raw, today()).expect_err("several fields are invalid");
        assert_eq!(err.field(), Field::Albumin);
    }

    #[test]
    fn validate_all_reports_every_failure_in_field_order() {
        let raw = RawParameters {
            sex: "".into(),
            bilirubin: 0.0,
            sodium: 0.0,
            inr: 0.0,
            albumin: 0.0,
            creatinine: 0.0,
            had_dialysis: true,
            date_of_birth: "".into(),
        };
        let errors = validate_all(&raw, today()).expect_err("zero-filled input is invalid");
        let fields: Vec<Field> = errors.iter().map(ValidationError::field).collect();
        // Zero bilirubin sits on the lower bound and passes.
        assert_eq!(
            fields,
            vec![
                Field::Sex,
                Field::Sodium,
                Field::Inr,
                Field::Albumin,
                Field::Creatinine,
                Field::DateOfBirth,
            ]
        );
    }

    #[test]
    fn validate_all_matches_validate_on_success() {
        let raw = sample();
        assert_eq!(
            validate_all(&raw, today()).expect("valid"),
            validate(&raw, today()).expect("valid")
        );
    }

    #[test]
    fn with_dialysis_only_changes_the_flag() {
        let params = validate(&sample(), today()).unwrap();
        let dialysed = params.with_dialysis(true);
        assert!(dialysed.had_dialysis());
        assert_eq!(dialysed.with_dialysis(false), params);
    }
}
