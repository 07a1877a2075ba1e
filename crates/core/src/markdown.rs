//! Markdown rendering for the MELD advisory card.
//!
//! The card detail has three parts:
//! - the score line (both dialysis variants, or "Not calculated")
//! - the list of reasons a score could not be calculated, when there are any
//! - a table of every input with its value, unit and observation date
//!
//! Values that came from the FHIR server are escaped so they cannot break the table.

use std::fmt::Write as _;

use fhir::{LabCode, MeldInputs};

use crate::assessment::MeldAssessment;

/// Label shown for inputs that could not be fetched.
pub const NOT_FOUND: &str = "Not found";

/// Render the markdown detail of the MELD card.
pub fn card_detail(assessment: &MeldAssessment, inputs: &MeldInputs) -> String {
    let mut output = String::new();

    match assessment {
        MeldAssessment::Scored {
            with_dialysis,
            without_dialysis,
        } => {
            let _ = writeln!(
                output,
                "**Score with dialysis:** *{with_dialysis}*; **w/o dialysis:** *{without_dialysis}*"
            );
        }
        MeldAssessment::NotScored { errors } => {
            output.push_str("**Score:** *Not calculated*\n\nErrors:\n\n");
            for error in errors {
                let _ = writeln!(output, "- {}", escape_inline(error));
            }
        }
    }

    output.push_str("\n---\n\n");
    output.push_str("| Parameter | Value | Date |\n");
    output.push_str("|-----------|-------|------|\n");

    for code in LabCode::ALL {
        let (value, date) = match inputs.lab(code) {
            Some(lab) => {
                let value = match lab.unit.as_deref() {
                    Some(unit) if !unit.trim().is_empty() => format!("{} {}", lab.value, unit),
                    _ => lab.value.to_string(),
                };
                (value, lab.effective.clone().unwrap_or_default())
            }
            None => (NOT_FOUND.to_string(), String::new()),
        };
        push_row(&mut output, code.label(), &value, &date);
    }

    push_row(
        &mut output,
        "Sex",
        inputs.sex.as_deref().unwrap_or(NOT_FOUND),
        "",
    );
    push_row(
        &mut output,
        "DOB",
        inputs.date_of_birth.as_deref().unwrap_or(NOT_FOUND),
        "",
    );

    output
}

fn push_row(output: &mut String, parameter: &str, value: &str, date: &str) {
    let _ = writeln!(
        output,
        "| {} | {} | {} |",
        parameter,
        escape_cell(value),
        escape_cell(date)
    );
}

/// Escape text for a table cell: backslashes and pipes are escaped and line breaks flattened.
fn escape_cell(text: &str) -> String {
    escape_inline(text)
        .replace('\\', "\\\\")
        .replace('|', "\\|")
}

/// Collapse line breaks so a value stays on one markdown line.
fn escape_inline(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
