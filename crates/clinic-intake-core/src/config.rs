//! Session configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DEFAULT_DOC_CODE;

/// Storage key of the session draft.
pub const DEFAULT_DRAFT_KEY: &str = "evolve_consultation_draft_v1";
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_DOCUMENT_TITLE: &str = "CONSULTATION FORM";
pub const DEFAULT_FOOTER_NOTICE: &str = "For service windows and support, refer to the printed notice on the original form (Cao Thang location). Hotline: 1900 1717 | diag.vn";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Settings applied when a session is opened.
///
/// Every field has a default, so a config file only needs the values it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IntakeConfig {
    /// Document code pre-filled on fresh forms
    pub default_doc_code: String,
    /// Key the draft is stored under
    pub draft_key: String,
    /// Quiet period before a draft write, in milliseconds
    pub debounce_ms: u64,
    /// Heading of exported documents
    pub document_title: String,
    /// Static notice printed at the bottom of exported documents
    pub footer_notice: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_doc_code: DEFAULT_DOC_CODE.into(),
            draft_key: DEFAULT_DRAFT_KEY.into(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            document_title: DEFAULT_DOCUMENT_TITLE.into(),
            footer_notice: DEFAULT_FOOTER_NOTICE.into(),
        }
    }
}

impl IntakeConfig {
    /// Load from a JSON file, falling back to defaults when it doesn't exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
