//! LOINC codes for the laboratory observations the MELD formula needs.

use std::fmt;

/// Laboratory observation used by the MELD score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabCode {
    /// Bilirubin.total, mass/volume in serum or plasma.
    TotalBilirubin,
    /// Sodium, moles/volume in serum or plasma.
    Sodium,
    /// INR of platelet-poor plasma by coagulation assay.
    Inr,
    /// Albumin, mass/volume in serum or plasma.
    Albumin,
    /// Creatinine, mass/volume in serum or plasma.
    Creatinine,
}

impl LabCode {
    pub const ALL: [LabCode; 5] = [
        LabCode::TotalBilirubin,
        LabCode::Sodium,
        LabCode::Inr,
        LabCode::Albumin,
        LabCode::Creatinine,
    ];

    /// LOINC code used in the `code` search parameter.
    pub fn loinc(self) -> &'static str {
        match self {
            LabCode::TotalBilirubin => "1975-2",
            LabCode::Sodium => "2947-0",
            LabCode::Inr => "34714-6",
            LabCode::Albumin => "1751-7",
            LabCode::Creatinine => "2160-0",
        }
    }

    /// Human-readable name for logs and cards.
    pub fn label(self) -> &'static str {
        match self {
            LabCode::TotalBilirubin => "Bilirubin",
            LabCode::Sodium => "Sodium",
            LabCode::Inr => "INR",
            LabCode::Albumin => "Albumin",
            LabCode::Creatinine => "Creatinine",
        }
    }
}

impl fmt::Display for LabCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.loinc())
    }
}
