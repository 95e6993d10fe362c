//! The intake form aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patient::PatientInfo;

/// Urgency of sample processing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SamplePriority {
    #[default]
    Regular,
    Urgent,
}

impl SamplePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplePriority::Regular => "Regular",
            SamplePriority::Urgent => "Urgent",
        }
    }
}

/// Everything captured during one intake session.
///
/// Snapshots are treated as immutable once published by the engine; every
/// mutation produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub patient: PatientInfo,
    pub priority: SamplePriority,
    /// Selected catalog item ids
    pub selected_item_ids: BTreeSet<String>,
    /// Free-text test not found in the catalog; empty means none
    pub other_test: String,
    /// Opaque signature image payload (PNG data URL)
    pub signature: Option<String>,
    /// Session start, replaced only on reset
    pub created_at: DateTime<Utc>,
}

impl FormSnapshot {
    /// Fresh form for a new session.
    pub fn new(doc_code: &str) -> Self {
        Self::new_at(doc_code, Utc::now())
    }

    pub fn new_at(doc_code: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            patient: PatientInfo::new(doc_code),
            priority: SamplePriority::default(),
            selected_item_ids: BTreeSet::new(),
            other_test: String::new(),
            signature: None,
            created_at,
        }
    }

    pub fn is_selected(&self, item_id: &str) -> bool {
        self.selected_item_ids.contains(item_id)
    }

    /// The free-text test, trimmed, if it carries anything.
    pub fn other_test_trimmed(&self) -> Option<&str> {
        let trimmed = self.other_test.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_form() {
        let form = FormSnapshot::new("23209");
        assert!(form.selected_item_ids.is_empty());
        assert_eq!(form.priority, SamplePriority::Regular);
        assert_eq!(form.patient.doc_code, "23209");
        assert!(!form.is_signed());
        assert!(form.other_test_trimmed().is_none());
    }

    #[test]
    fn test_other_test_trimmed() {
        let mut form = FormSnapshot::new("23209");
        form.other_test = "   ".into();
        assert!(form.other_test_trimmed().is_none());
        form.other_test = "  extra panel ".into();
        assert_eq!(form.other_test_trimmed(), Some("extra panel"));
    }
}
