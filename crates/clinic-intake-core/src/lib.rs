//! Clinic Intake Core Library
//!
//! Local-first consultation intake: a three-step wizard that captures patient
//! details, lab test selections and a signature, then exports a document.
//!
//! # Architecture
//!
//! ```text
//!   UI edit ──► IntakeSession ──► FormEngine ──► Arc<FormSnapshot> (published)
//!                    │                 │
//!                    ▼                 ▼
//!                  Wizard         DraftWriter (debounced, one thread)
//!            {step, completed}         │
//!                                      ▼
//!                                 DraftStore ──► SQLite form_drafts
//!
//!   Review ──► ConsultationDocument ──► text / JSON + sha256
//! ```
//!
//! # Core Principle
//!
//! **The form never blocks on storage.** A missing or corrupt draft starts a
//! fresh form and a failed write is logged and dropped.
//!
//! # Modules
//!
//! - [`models`]: Domain types (PatientInfo, FormSnapshot, Catalog, Contact)
//! - [`engine`]: Form state engine and derived status
//! - [`wizard`]: Step controller and helper text
//! - [`store`]: Draft persistence (codec, stores, debounced writer)
//! - [`db`]: SQLite database layer for drafts and contacts
//! - [`session`]: Engine and wizard behind one handle
//! - [`export`]: Consultation document rendering
//! - [`config`]: Session configuration
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod db;
pub mod engine;
pub mod export;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;
pub mod wizard;

// Re-export commonly used types
pub use config::IntakeConfig;
pub use db::Database;
pub use engine::{CategoryProgress, FormEngine, FormStatus, RequiredField};
pub use export::{ConsultationDocument, ExportedDocument};
pub use models::{
    Catalog, Contact, FormSnapshot, PatientInfo, PatientPatch, SamplePriority, Sex,
};
pub use session::{Guidance, IntakeSession};
pub use store::{DraftStore, MemoryDraftStore, SqliteDraftStore};
pub use wizard::{Step, Wizard, WizardState};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum IntakeError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for IntakeError {
    fn from(e: db::DbError) -> Self {
        IntakeError::DatabaseError(e.to_string())
    }
}

impl From<store::StoreError> for IntakeError {
    fn from(e: store::StoreError) -> Self {
        IntakeError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for IntakeError {
    fn from(e: serde_json::Error) -> Self {
        IntakeError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for IntakeError {
    fn from(e: config::ConfigError) -> Self {
        IntakeError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for IntakeError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        IntakeError::StorageError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a session whose draft and contacts live in the database at `db_path`.
#[uniffi::export]
pub fn open_session(db_path: String) -> Result<Arc<IntakeCore>, IntakeError> {
    logging::init_tracing();
    let session = IntakeSession::open_path(&db_path, IntakeConfig::default(), builtin_catalog())?;
    Ok(IntakeCore::wrap(session))
}

/// Like [`open_session`], with settings read from a JSON config file.
/// A missing config file means defaults.
#[uniffi::export]
pub fn open_session_with_config(
    db_path: String,
    config_path: String,
) -> Result<Arc<IntakeCore>, IntakeError> {
    logging::init_tracing();
    let config = IntakeConfig::load(&config_path)?;
    let session = IntakeSession::open_path(&db_path, config, builtin_catalog())?;
    Ok(IntakeCore::wrap(session))
}

/// Open a session over an in-memory database (for testing).
#[uniffi::export]
pub fn open_session_in_memory() -> Result<Arc<IntakeCore>, IntakeError> {
    let session = IntakeSession::open_in_memory(IntakeConfig::default(), builtin_catalog())?;
    Ok(IntakeCore::wrap(session))
}

fn builtin_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::builtin())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct IntakeCore {
    session: Arc<Mutex<IntakeSession>>,
}

impl IntakeCore {
    fn wrap(session: IntakeSession) -> Arc<Self> {
        Arc::new(Self {
            session: Arc::new(Mutex::new(session)),
        })
    }
}

#[uniffi::export]
impl IntakeCore {
    // =========================================================================
    // Form Operations
    // =========================================================================

    /// Current patient details.
    pub fn patient(&self) -> Result<FfiPatientInfo, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.snapshot().patient.clone().into())
    }

    /// Replace the patient details. `dob` is `YYYY-MM-DD` or empty.
    pub fn set_patient(&self, info: FfiPatientInfo) -> Result<(), IntakeError> {
        let patch = PatientPatch::try_from(info)?;
        let mut session = self.session.lock()?;
        session.set_patient(patch);
        Ok(())
    }

    pub fn set_priority(&self, priority: FfiSamplePriority) -> Result<(), IntakeError> {
        let mut session = self.session.lock()?;
        session.set_priority(priority.into());
        Ok(())
    }

    pub fn priority(&self) -> Result<FfiSamplePriority, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.snapshot().priority.into())
    }

    pub fn toggle_item(&self, item_id: String) -> Result<(), IntakeError> {
        let mut session = self.session.lock()?;
        session.toggle_item(&item_id);
        Ok(())
    }

    /// Returns `false` for an unknown category.
    pub fn select_all_in(&self, category_id: String) -> Result<bool, IntakeError> {
        let mut session = self.session.lock()?;
        Ok(session.select_all_in(&category_id))
    }

    /// Returns `false` for an unknown category.
    pub fn clear_in(&self, category_id: String) -> Result<bool, IntakeError> {
        let mut session = self.session.lock()?;
        Ok(session.clear_in(&category_id))
    }

    pub fn selected_item_ids(&self) -> Result<Vec<String>, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.snapshot().selected_item_ids.iter().cloned().collect())
    }

    pub fn set_other_test(&self, text: String) -> Result<(), IntakeError> {
        let mut session = self.session.lock()?;
        session.set_other_test(text);
        Ok(())
    }

    pub fn other_test(&self) -> Result<String, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.snapshot().other_test.clone())
    }

    /// Store or clear the signature image payload.
    pub fn set_signature(&self, payload: Option<String>) -> Result<(), IntakeError> {
        let mut session = self.session.lock()?;
        session.set_signature(payload);
        Ok(())
    }

    pub fn signature(&self) -> Result<Option<String>, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.snapshot().signature.clone())
    }

    /// Start over: fresh form, first step, no saved draft.
    pub fn reset(&self) -> Result<(), IntakeError> {
        let mut session = self.session.lock()?;
        session.reset();
        Ok(())
    }

    /// Write the pending draft now (call when the app is backgrounded).
    pub fn flush(&self) -> Result<(), IntakeError> {
        let session = self.session.lock()?;
        session.flush();
        Ok(())
    }

    // =========================================================================
    // Status Operations
    // =========================================================================

    pub fn status(&self) -> Result<FfiFormStatus, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.status().into())
    }

    pub fn category_progress(&self) -> Result<Vec<FfiCategoryProgress>, IntakeError> {
        let session = self.session.lock()?;
        Ok(session
            .category_progress()
            .into_iter()
            .map(|p| p.into())
            .collect())
    }

    pub fn guidance(&self) -> Result<FfiGuidance, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.guidance().into())
    }

    // =========================================================================
    // Wizard Operations
    // =========================================================================

    /// Current step index (0 = patient, 1 = tests, 2 = review).
    pub fn current_step(&self) -> Result<u8, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.wizard().step.index())
    }

    pub fn is_completed(&self) -> Result<bool, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.wizard().completed)
    }

    /// Jump to a step by index without gating.
    pub fn set_step(&self, step: u8) -> Result<(), IntakeError> {
        let step = Step::try_from(step)
            .map_err(|i| IntakeError::InvalidInput(format!("Unknown step: {}", i)))?;
        let mut session = self.session.lock()?;
        session.set_step(step);
        Ok(())
    }

    pub fn can_advance(&self) -> Result<bool, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.can_advance())
    }

    /// Continue to the next step, or finish on the review step.
    pub fn advance(&self) -> Result<bool, IntakeError> {
        let mut session = self.session.lock()?;
        Ok(session.advance())
    }

    pub fn back(&self) -> Result<bool, IntakeError> {
        let mut session = self.session.lock()?;
        Ok(session.back())
    }

    /// Mark the review completed. Only takes effect on the review step.
    pub fn complete(&self) -> Result<bool, IntakeError> {
        let mut session = self.session.lock()?;
        Ok(session.complete())
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Categories with the items whose label matches `query`, in catalog
    /// order. A blank query matches everything.
    pub fn search_catalog(&self, query: String) -> Result<Vec<FfiCategoryMatches>, IntakeError> {
        let session = self.session.lock()?;
        Ok(session
            .catalog()
            .search(&query)
            .groups
            .into_iter()
            .map(|group| FfiCategoryMatches {
                category_id: group.category.id.clone(),
                name: group.category.name_en.clone(),
                item_ids: group.items.iter().map(|i| i.id.clone()).collect(),
            })
            .collect())
    }

    // =========================================================================
    // Contact Operations
    // =========================================================================

    pub fn search_contacts(&self, query: String) -> Result<Vec<FfiContact>, IntakeError> {
        let session = self.session.lock()?;
        let contacts = session.search_contacts(&query)?;
        Ok(contacts.into_iter().map(|c| c.into()).collect())
    }

    pub fn save_contact(&self, contact: FfiContact) -> Result<(), IntakeError> {
        let contact = Contact::try_from(contact)?;
        let session = self.session.lock()?;
        session.save_contact(&contact)?;
        Ok(())
    }

    /// Fill the patient fields from a contact.
    pub fn apply_contact(&self, contact: FfiContact) -> Result<(), IntakeError> {
        let contact = Contact::try_from(contact)?;
        let mut session = self.session.lock()?;
        session.apply_contact(&contact);
        Ok(())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Render the consultation document as plain text.
    pub fn export_document(&self) -> Result<FfiExportedDocument, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.export_document().render().into())
    }

    /// Export the consultation document as JSON.
    pub fn export_document_json(&self) -> Result<String, IntakeError> {
        let session = self.session.lock()?;
        Ok(session.export_document().to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

fn parse_dob(raw: &str) -> Result<Option<NaiveDate>, IntakeError> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| IntakeError::InvalidInput(format!("Invalid date of birth: {}", raw)))
}

fn format_dob(dob: Option<NaiveDate>) -> String {
    dob.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_sex(raw: &str) -> Result<Sex, IntakeError> {
    match raw {
        "Male" => Ok(Sex::Male),
        "Female" => Ok(Sex::Female),
        other => Err(IntakeError::InvalidInput(format!("Unknown sex: {}", other))),
    }
}

/// FFI-safe patient details.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInfo {
    pub full_name: String,
    /// `YYYY-MM-DD`, or empty
    pub dob: String,
    pub customer_code: String,
    pub address: String,
    pub clinical_diagnosis: String,
    pub national_id: String,
    /// "Male" or "Female"
    pub sex: String,
    pub phone: String,
    pub doctor: String,
    pub doc_code: String,
}

impl From<PatientInfo> for FfiPatientInfo {
    fn from(p: PatientInfo) -> Self {
        Self {
            full_name: p.full_name,
            dob: format_dob(p.dob),
            customer_code: p.customer_code,
            address: p.address,
            clinical_diagnosis: p.clinical_diagnosis,
            national_id: p.national_id,
            sex: p.sex.as_str().to_string(),
            phone: p.phone,
            doctor: p.doctor,
            doc_code: p.doc_code,
        }
    }
}

impl TryFrom<FfiPatientInfo> for PatientPatch {
    type Error = IntakeError;

    fn try_from(p: FfiPatientInfo) -> Result<Self, Self::Error> {
        Ok(PatientPatch {
            full_name: Some(p.full_name),
            dob: Some(parse_dob(&p.dob)?),
            customer_code: Some(p.customer_code),
            address: Some(p.address),
            clinical_diagnosis: Some(p.clinical_diagnosis),
            national_id: Some(p.national_id),
            sex: Some(parse_sex(&p.sex)?),
            phone: Some(p.phone),
            doctor: Some(p.doctor),
            doc_code: Some(p.doc_code),
        })
    }
}

/// FFI-safe sample priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSamplePriority {
    Regular,
    Urgent,
}

impl From<FfiSamplePriority> for SamplePriority {
    fn from(p: FfiSamplePriority) -> Self {
        match p {
            FfiSamplePriority::Regular => SamplePriority::Regular,
            FfiSamplePriority::Urgent => SamplePriority::Urgent,
        }
    }
}

impl From<SamplePriority> for FfiSamplePriority {
    fn from(p: SamplePriority) -> Self {
        match p {
            SamplePriority::Regular => FfiSamplePriority::Regular,
            SamplePriority::Urgent => FfiSamplePriority::Urgent,
        }
    }
}

/// FFI-safe form status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFormStatus {
    pub total_selected: u32,
    pub can_proceed_from_step0: bool,
    pub can_proceed_from_step1: bool,
    /// Keys of the missing required fields ("fullName", "phone")
    pub missing_patient_fields: Vec<String>,
}

impl From<FormStatus> for FfiFormStatus {
    fn from(status: FormStatus) -> Self {
        Self {
            total_selected: status.total_selected as u32,
            can_proceed_from_step0: status.can_proceed_from_step0,
            can_proceed_from_step1: status.can_proceed_from_step1,
            missing_patient_fields: status
                .missing_patient_fields
                .iter()
                .map(|f| f.key().to_string())
                .collect(),
        }
    }
}

/// FFI-safe per-category selection count.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCategoryProgress {
    pub category_id: String,
    pub selected: u32,
    pub total: u32,
}

impl From<CategoryProgress> for FfiCategoryProgress {
    fn from(p: CategoryProgress) -> Self {
        Self {
            category_id: p.category_id,
            selected: p.selected as u32,
            total: p.total as u32,
        }
    }
}

/// FFI-safe catalog search group.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCategoryMatches {
    pub category_id: String,
    pub name: String,
    pub item_ids: Vec<String>,
}

/// FFI-safe navigation text.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGuidance {
    pub helper: String,
    pub stepper_hints: Vec<String>,
    pub forward_label: String,
}

impl From<Guidance> for FfiGuidance {
    fn from(g: Guidance) -> Self {
        Self {
            helper: g.helper,
            stepper_hints: g.stepper_hints.to_vec(),
            forward_label: g.forward_label.to_string(),
        }
    }
}

/// FFI-safe contact.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiContact {
    pub customer_code: String,
    pub full_name: String,
    pub phone: String,
    /// `YYYY-MM-DD`, or empty
    pub dob: String,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub sex: Option<String>,
    pub doctor: Option<String>,
    pub clinical_diagnosis: Option<String>,
}

impl From<Contact> for FfiContact {
    fn from(c: Contact) -> Self {
        Self {
            customer_code: c.customer_code,
            full_name: c.full_name,
            phone: c.phone,
            dob: format_dob(c.dob),
            address: c.address,
            national_id: c.national_id,
            sex: c.sex.map(|s| s.as_str().to_string()),
            doctor: c.doctor,
            clinical_diagnosis: c.clinical_diagnosis,
        }
    }
}

impl TryFrom<FfiContact> for Contact {
    type Error = IntakeError;

    fn try_from(c: FfiContact) -> Result<Self, Self::Error> {
        Ok(Contact {
            customer_code: c.customer_code,
            full_name: c.full_name,
            phone: c.phone,
            dob: parse_dob(&c.dob)?,
            address: c.address,
            national_id: c.national_id,
            sex: c.sex.as_deref().map(parse_sex).transpose()?,
            doctor: c.doctor,
            clinical_diagnosis: c.clinical_diagnosis,
        })
    }
}

/// FFI-safe exported document.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExportedDocument {
    pub file_name: String,
    pub content: String,
    pub sha256: String,
}

impl From<ExportedDocument> for FfiExportedDocument {
    fn from(doc: ExportedDocument) -> Self {
        Self {
            file_name: doc.file_name,
            content: doc.content,
            sha256: doc.sha256,
        }
    }
}
