//! Form state engine.
//!
//! Owns the canonical [`FormSnapshot`]. Every mutation publishes a new
//! immutable snapshot and hands its encoded form to the debounced writer.

mod status;

pub use status::*;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::models::{Catalog, FormSnapshot, PatientPatch, SamplePriority};
use crate::store::{encode_snapshot, load_snapshot, DraftStore, DraftWriter};

/// Single source of truth for the captured form data.
pub struct FormEngine {
    form: Arc<FormSnapshot>,
    catalog: Arc<Catalog>,
    writer: DraftWriter,
    doc_code: String,
}

impl FormEngine {
    /// Restore the saved draft from `store`, or start a fresh form.
    ///
    /// A missing or unreadable draft is never an error.
    pub fn open(
        store: Box<dyn DraftStore>,
        catalog: Arc<Catalog>,
        doc_code: impl Into<String>,
        debounce: Duration,
    ) -> Self {
        let doc_code = doc_code.into();
        let form = load_snapshot(store.as_ref()).unwrap_or_else(|| FormSnapshot::new(&doc_code));
        let writer = DraftWriter::spawn(store, debounce);

        Self {
            form: Arc::new(form),
            catalog,
            writer,
            doc_code,
        }
    }

    /// Frozen view of the current form.
    pub fn snapshot(&self) -> Arc<FormSnapshot> {
        Arc::clone(&self.form)
    }

    pub fn form(&self) -> &FormSnapshot {
        &self.form
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn status(&self) -> FormStatus {
        FormStatus::of(&self.form)
    }

    pub fn category_progress(&self) -> Vec<CategoryProgress> {
        category_progress(&self.form, &self.catalog)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Merge patient fields. Dates of birth are clamped to today.
    pub fn set_patient(&mut self, patch: PatientPatch) {
        self.set_patient_as_of(patch, Local::now().date_naive());
    }

    /// [`set_patient`](Self::set_patient) with an explicit "today".
    pub fn set_patient_as_of(&mut self, patch: PatientPatch, today: NaiveDate) {
        self.update(|form| form.patient.merge(patch, today));
    }

    pub fn set_priority(&mut self, priority: SamplePriority) {
        self.update(|form| form.priority = priority);
    }

    /// Flip membership of `item_id`. Catalog membership isn't checked.
    pub fn toggle_item(&mut self, item_id: &str) {
        self.update(|form| {
            if !form.selected_item_ids.remove(item_id) {
                form.selected_item_ids.insert(item_id.to_string());
            }
        });
    }

    /// Select every item of a category. Returns `false` for an unknown
    /// category, which leaves the form untouched.
    pub fn select_all_in(&mut self, category_id: &str) -> bool {
        let Some(ids) = self.owned_ids_in(category_id) else {
            tracing::debug!(category_id, "select all ignored, unknown category");
            return false;
        };
        self.update(|form| form.selected_item_ids.extend(ids));
        true
    }

    /// Deselect every item of a category. Returns `false` for an unknown
    /// category, which leaves the form untouched.
    pub fn clear_in(&mut self, category_id: &str) -> bool {
        let Some(ids) = self.owned_ids_in(category_id) else {
            tracing::debug!(category_id, "clear ignored, unknown category");
            return false;
        };
        self.update(|form| {
            for id in &ids {
                form.selected_item_ids.remove(id);
            }
        });
        true
    }

    /// Replace the free-text test verbatim.
    pub fn set_other_test(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update(|form| form.other_test = text);
    }

    pub fn set_signature(&mut self, payload: Option<String>) {
        self.update(|form| form.signature = payload);
    }

    /// Drop the saved draft and start over with a fresh form.
    ///
    /// The stored draft is gone when this returns. The fresh form isn't
    /// saved; the draft stays absent until the next edit.
    pub fn reset(&mut self) {
        self.writer.clear();
        self.form = Arc::new(FormSnapshot::new(&self.doc_code));
        tracing::info!("form reset");
    }

    /// Write the pending draft now.
    pub fn flush(&self) {
        self.writer.flush();
    }

    fn owned_ids_in(&self, category_id: &str) -> Option<Vec<String>> {
        self.catalog
            .item_ids_in(category_id)
            .map(|ids| ids.into_iter().map(str::to_string).collect())
    }

    fn update(&mut self, apply: impl FnOnce(&mut FormSnapshot)) {
        let mut next = FormSnapshot::clone(&self.form);
        apply(&mut next);
        self.form = Arc::new(next);
        self.schedule_save();
    }

    fn schedule_save(&self) {
        match encode_snapshot(&self.form) {
            Ok(payload) => self.writer.schedule(payload),
            Err(e) => tracing::warn!(error = %e, "failed to encode draft"),
        }
    }
}
