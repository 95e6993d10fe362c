//! Intake session: the form engine and the wizard behind one handle.
//!
//! A session can only be obtained through one of its constructors, so no
//! caller ever sees an uninitialized form.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::IntakeConfig;
use crate::db::Database;
use crate::engine::{CategoryProgress, FormEngine, FormStatus};
use crate::export::ConsultationDocument;
use crate::models::{Catalog, Contact, FormSnapshot, PatientPatch, SamplePriority};
use crate::store::{DraftStore, SqliteDraftStore, StoreError, StoreResult};
use crate::wizard::{forward_label, helper_text, stepper_hints, Step, Wizard, WizardState};

/// Text the presentation shows around the wizard navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guidance {
    pub helper: String,
    pub stepper_hints: [String; 3],
    pub forward_label: &'static str,
}

/// One intake session.
///
/// Dropping the session writes any pending draft before returning.
pub struct IntakeSession {
    engine: FormEngine,
    wizard: Wizard,
    config: IntakeConfig,
    contacts: Option<Arc<Mutex<Database>>>,
}

impl IntakeSession {
    /// Open a session over an arbitrary draft store, restoring its draft.
    ///
    /// The contact directory is unavailable on sessions opened this way.
    pub fn open(config: IntakeConfig, catalog: Arc<Catalog>, store: Box<dyn DraftStore>) -> Self {
        let engine = FormEngine::open(
            store,
            catalog,
            config.default_doc_code.clone(),
            config.debounce(),
        );
        tracing::info!(
            selected = engine.status().total_selected,
            "intake session opened"
        );

        Self {
            engine,
            wizard: Wizard::new(),
            config,
            contacts: None,
        }
    }

    /// Open a session whose draft and contacts live in `db`.
    pub fn open_with_database(
        config: IntakeConfig,
        catalog: Arc<Catalog>,
        db: Arc<Mutex<Database>>,
    ) -> Self {
        let store = SqliteDraftStore::new(Arc::clone(&db), config.draft_key.clone());
        let mut session = Self::open(config, catalog, Box::new(store));
        session.contacts = Some(db);
        session
    }

    /// Open a session backed by the SQLite file at `path`.
    pub fn open_path<P: AsRef<Path>>(
        path: P,
        config: IntakeConfig,
        catalog: Arc<Catalog>,
    ) -> StoreResult<Self> {
        let db = Database::open(path)?;
        Ok(Self::open_with_database(
            config,
            catalog,
            Arc::new(Mutex::new(db)),
        ))
    }

    /// Open a session backed by an in-memory database.
    pub fn open_in_memory(config: IntakeConfig, catalog: Arc<Catalog>) -> StoreResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::open_with_database(
            config,
            catalog,
            Arc::new(Mutex::new(db)),
        ))
    }

    // =========================================================================
    // Readers
    // =========================================================================

    pub fn snapshot(&self) -> Arc<FormSnapshot> {
        self.engine.snapshot()
    }

    pub fn status(&self) -> FormStatus {
        self.engine.status()
    }

    pub fn wizard(&self) -> WizardState {
        self.wizard.state()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.engine.catalog()
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn category_progress(&self) -> Vec<CategoryProgress> {
        self.engine.category_progress()
    }

    pub fn guidance(&self) -> Guidance {
        let form = self.engine.form();
        let status = self.engine.status();
        let step = self.wizard.step();

        Guidance {
            helper: helper_text(step, &status, form.is_signed()),
            stepper_hints: stepper_hints(form, &status),
            forward_label: forward_label(step),
        }
    }

    // =========================================================================
    // Form edits
    // =========================================================================

    pub fn set_patient(&mut self, patch: PatientPatch) {
        self.engine.set_patient(patch);
        self.wizard.invalidate();
    }

    pub fn set_patient_as_of(&mut self, patch: PatientPatch, today: NaiveDate) {
        self.engine.set_patient_as_of(patch, today);
        self.wizard.invalidate();
    }

    pub fn set_priority(&mut self, priority: SamplePriority) {
        self.engine.set_priority(priority);
        self.wizard.invalidate();
    }

    pub fn toggle_item(&mut self, item_id: &str) {
        self.engine.toggle_item(item_id);
        self.wizard.invalidate();
    }

    pub fn select_all_in(&mut self, category_id: &str) -> bool {
        let changed = self.engine.select_all_in(category_id);
        if changed {
            self.wizard.invalidate();
        }
        changed
    }

    pub fn clear_in(&mut self, category_id: &str) -> bool {
        let changed = self.engine.clear_in(category_id);
        if changed {
            self.wizard.invalidate();
        }
        changed
    }

    pub fn set_other_test(&mut self, text: impl Into<String>) {
        self.engine.set_other_test(text);
        self.wizard.invalidate();
    }

    pub fn set_signature(&mut self, payload: Option<String>) {
        self.engine.set_signature(payload);
        self.wizard.invalidate();
    }

    /// Discard the form and the saved draft; the wizard goes back to the
    /// first step.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.wizard.reset();
    }

    pub fn flush(&self) {
        self.engine.flush();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Jump to any step. Validity is not consulted.
    pub fn set_step(&mut self, step: Step) {
        self.wizard.set_step(step);
    }

    /// Whether the forward action is allowed. Review can always finish.
    pub fn can_advance(&self) -> bool {
        let status = self.engine.status();
        match self.wizard.step() {
            Step::Patient => status.can_proceed_from_step0,
            Step::Tests => status.can_proceed_from_step1,
            Step::Review => true,
        }
    }

    /// The forward action: move to the next step, or mark the review
    /// completed when already on the last one. Returns `false` when the
    /// current step's data doesn't allow it.
    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        match self.wizard.step().next() {
            Some(next) => {
                self.wizard.set_step(next);
                true
            }
            None => self.wizard.complete(),
        }
    }

    /// Move back one step. Returns `false` on the first step.
    pub fn back(&mut self) -> bool {
        match self.wizard.step().previous() {
            Some(previous) => {
                self.wizard.set_step(previous);
                true
            }
            None => false,
        }
    }

    pub fn complete(&mut self) -> bool {
        self.wizard.complete()
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    /// Quick-fill candidates. Empty when the session has no database.
    pub fn search_contacts(&self, query: &str) -> StoreResult<Vec<Contact>> {
        let Some(db) = &self.contacts else {
            return Ok(Vec::new());
        };
        let db = db.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(db.search_contacts(query)?)
    }

    /// Remember a patient for later quick-fill.
    pub fn save_contact(&self, contact: &Contact) -> StoreResult<()> {
        let Some(db) = &self.contacts else {
            return Err(StoreError::Unavailable("no contact directory".into()));
        };
        let db = db.lock().map_err(|_| StoreError::LockPoisoned)?;
        db.upsert_contact(contact)?;
        Ok(())
    }

    /// Copy a contact's details into the patient fields. The document code
    /// is left as it is.
    pub fn apply_contact(&mut self, contact: &Contact) {
        tracing::debug!(customer_code = %contact.customer_code, "applying contact");
        self.set_patient(contact.to_patch());
    }

    // =========================================================================
    // Export
    // =========================================================================

    pub fn export_document(&self) -> ConsultationDocument {
        let document =
            ConsultationDocument::from_snapshot(self.engine.form(), self.engine.catalog(), &self.config);
        tracing::info!(file_name = %document.file_name, "consultation exported");
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDraftStore;

    fn session() -> (IntakeSession, MemoryDraftStore) {
        let store = MemoryDraftStore::new();
        let config = IntakeConfig {
            debounce_ms: 30_000,
            ..IntakeConfig::default()
        };
        let session = IntakeSession::open(config, Arc::new(Catalog::builtin()), Box::new(store.clone()));
        (session, store)
    }

    fn fill_patient(session: &mut IntakeSession) {
        session.set_patient(PatientPatch::default().full_name("Jane Doe").phone("0912345678"));
    }

    #[test]
    fn test_fresh_session_starts_on_patient_step() {
        let (session, _) = session();
        assert_eq!(session.wizard(), WizardState::default());
        assert!(!session.can_advance());
        assert_eq!(session.snapshot().patient.doc_code, "23209");
    }

    #[test]
    fn test_advance_is_gated() {
        let (mut session, _) = session();
        assert!(!session.advance());
        assert_eq!(session.wizard().step, Step::Patient);

        fill_patient(&mut session);
        assert!(session.advance());
        assert_eq!(session.wizard().step, Step::Tests);

        assert!(!session.advance());
        session.toggle_item("cbc");
        assert!(session.advance());
        assert_eq!(session.wizard().step, Step::Review);
        assert!(!session.wizard().completed);

        assert!(session.back());
        assert!(session.back());
        assert!(!session.back());
    }

    #[test]
    fn test_advance_on_review_finishes() {
        let (mut session, _) = session();
        fill_patient(&mut session);
        session.toggle_item("cbc");
        session.set_step(Step::Review);

        assert!(session.can_advance());
        assert_eq!(session.guidance().forward_label, "Finish");
        assert!(session.advance());
        assert_eq!(
            session.wizard(),
            WizardState {
                step: Step::Review,
                completed: true
            }
        );

        // Finishing again keeps the completion
        assert!(session.advance());
        assert!(session.wizard().completed);
    }

    #[test]
    fn test_set_step_is_ungated() {
        let (mut session, _) = session();
        session.set_step(Step::Review);
        assert_eq!(session.wizard().step, Step::Review);
    }

    #[test]
    fn test_edits_invalidate_completion() {
        let (mut session, _) = session();
        session.set_step(Step::Review);
        assert!(session.complete());
        assert!(session.wizard().completed);

        session.set_signature(Some("data:image/png;base64,AAAA".into()));
        assert!(!session.wizard().completed);
        assert_eq!(session.wizard().step, Step::Review);
    }

    #[test]
    fn test_unknown_category_keeps_completion() {
        let (mut session, _) = session();
        session.set_step(Step::Review);
        session.complete();

        assert!(!session.select_all_in("nope"));
        assert!(!session.clear_in("nope"));
        assert!(session.wizard().completed);
    }

    #[test]
    fn test_guidance_follows_step() {
        let (mut session, _) = session();
        let guidance = session.guidance();
        assert_eq!(guidance.helper, "Add full name and phone to continue.");
        assert_eq!(guidance.stepper_hints[0], "Add core details");
        assert_eq!(guidance.forward_label, "Continue");

        fill_patient(&mut session);
        session.set_step(Step::Review);
        let guidance = session.guidance();
        assert_eq!(guidance.helper, "Capture signature before exporting.");
        assert_eq!(guidance.stepper_hints[0], "Jane Doe");
        assert_eq!(guidance.forward_label, "Finish");
    }

    #[test]
    fn test_contacts_absent_without_database() {
        let (session, _) = session();
        assert!(session.search_contacts("").unwrap().is_empty());
        let contact = Contact::new("C1".into(), "A".into(), "1".into());
        assert!(matches!(
            session.save_contact(&contact),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_contact_quick_fill() {
        let mut session =
            IntakeSession::open_in_memory(IntakeConfig::default(), Arc::new(Catalog::builtin()))
                .unwrap();
        let mut contact = Contact::new("C77".into(), "Tran Thi Binh".into(), "0901000001".into());
        contact.doctor = Some("Dr. Hoang".into());
        session.save_contact(&contact).unwrap();

        let found = session.search_contacts("binh").unwrap();
        assert_eq!(found.len(), 1);
        session.apply_contact(&found[0]);

        let form = session.snapshot();
        assert_eq!(form.patient.full_name, "Tran Thi Binh");
        assert_eq!(form.patient.customer_code, "C77");
        assert_eq!(form.patient.doctor, "Dr. Hoang");
        assert_eq!(form.patient.doc_code, "23209");
        assert!(session.status().can_proceed_from_step0);
    }

    #[test]
    fn test_reset_returns_to_start() {
        let (mut session, store) = session();
        fill_patient(&mut session);
        session.set_step(Step::Review);
        session.complete();
        session.flush();
        assert!(store.payload().is_some());

        session.reset();

        assert_eq!(session.wizard(), WizardState::default());
        assert!(session.snapshot().patient.full_name.is_empty());
        assert!(store.payload().is_none());
    }

    #[test]
    fn test_drop_flushes_pending_draft() {
        let (mut session, store) = session();
        session.toggle_item("tsh");
        drop(session);
        assert!(store.payload().unwrap().contains("tsh"));
    }
}
