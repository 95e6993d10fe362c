//! Draft serialization contract.
//!
//! The selection set is stored as a JSON array of ids; everything else keeps
//! its natural JSON shape with camelCase keys and ISO 8601 timestamps.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FormSnapshot, PatientInfo, SamplePriority};

/// Codec errors.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// On-disk shape of a [`FormSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedForm {
    pub patient: PatientInfo,
    pub priority: SamplePriority,
    pub selected_item_ids: Vec<String>,
    pub other_test: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_data_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&FormSnapshot> for PersistedForm {
    fn from(form: &FormSnapshot) -> Self {
        Self {
            patient: form.patient.clone(),
            priority: form.priority,
            selected_item_ids: form.selected_item_ids.iter().cloned().collect(),
            other_test: form.other_test.clone(),
            signature_data_url: form.signature.clone(),
            created_at: form.created_at,
        }
    }
}

impl From<PersistedForm> for FormSnapshot {
    fn from(persisted: PersistedForm) -> Self {
        Self {
            patient: persisted.patient,
            priority: persisted.priority,
            selected_item_ids: persisted.selected_item_ids.into_iter().collect::<BTreeSet<_>>(),
            other_test: persisted.other_test,
            signature: persisted.signature_data_url,
            created_at: persisted.created_at,
        }
    }
}

/// Serialize a snapshot into the draft payload.
pub fn encode_snapshot(form: &FormSnapshot) -> CodecResult<String> {
    Ok(serde_json::to_string(&PersistedForm::from(form))?)
}

/// Parse a draft payload. Truncated or mismatched documents are errors.
pub fn decode_snapshot(payload: &str) -> CodecResult<FormSnapshot> {
    let persisted: PersistedForm = serde_json::from_str(payload)?;
    Ok(persisted.into())
}
