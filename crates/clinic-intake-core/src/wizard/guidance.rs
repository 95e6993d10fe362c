//! Helper text shown next to the wizard navigation.

use crate::engine::FormStatus;
use crate::models::FormSnapshot;

use super::Step;

/// Join labels as "a", "a and b", "a, b, and c".
pub fn format_list(values: &[&str]) -> String {
    match values {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

fn tests_queued(count: usize) -> String {
    format!("{} test{}", count, if count > 1 { "s" } else { "" })
}

/// Status line under the navigation buttons.
pub fn helper_text(step: Step, status: &FormStatus, signed: bool) -> String {
    match step {
        Step::Patient if status.can_proceed_from_step0 => {
            "All key patient details captured.".to_string()
        }
        Step::Patient => {
            let labels: Vec<&str> = status
                .missing_patient_fields
                .iter()
                .map(|f| f.label())
                .collect();
            format!("Add {} to continue.", format_list(&labels))
        }
        Step::Tests if status.can_proceed_from_step1 => {
            format!("{} queued.", tests_queued(status.total_selected))
        }
        Step::Tests => "Select at least one test or add an “Other” entry.".to_string(),
        Step::Review if signed => "Signed • Ready to export.".to_string(),
        Step::Review => "Capture signature before exporting.".to_string(),
    }
}

/// One hint per step for the progress header.
pub fn stepper_hints(form: &FormSnapshot, status: &FormStatus) -> [String; 3] {
    let patient = if form.patient.full_name.is_empty() {
        "Add core details".to_string()
    } else {
        form.patient.full_name.clone()
    };
    let tests = if status.total_selected > 0 {
        format!("{} selected", status.total_selected)
    } else {
        "Pick at least one test".to_string()
    };
    let review = if form.is_signed() {
        "Signed".to_string()
    } else {
        "Signature pending".to_string()
    };
    [patient, tests, review]
}

/// Label of the forward button.
pub fn forward_label(step: Step) -> &'static str {
    match step {
        Step::Review => "Finish",
        _ => "Continue",
    }
}
