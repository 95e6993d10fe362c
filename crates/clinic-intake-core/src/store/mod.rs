//! Draft persistence: storage backends, codec and the debounced writer.

pub mod codec;
mod writer;

pub use codec::{decode_snapshot, encode_snapshot, CodecError, PersistedForm};
pub use writer::*;

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::FormSnapshot;

/// Draft storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value storage for the single session draft.
pub trait DraftStore: Send {
    /// Raw payload of the stored draft, if any.
    fn load(&self) -> StoreResult<Option<String>>;

    /// Replace the stored draft.
    fn save(&mut self, payload: &str) -> StoreResult<()>;

    /// Remove the stored draft.
    fn clear(&mut self) -> StoreResult<()>;
}

/// Load and decode the stored draft.
///
/// Missing, unreadable and malformed drafts all yield `None`; the caller
/// starts a fresh form.
pub fn load_snapshot(store: &dyn DraftStore) -> Option<FormSnapshot> {
    let payload = match store.load() {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            tracing::debug!("no saved draft");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "draft store unreadable, starting fresh");
            return None;
        }
    };

    match decode_snapshot(&payload) {
        Ok(snapshot) => {
            tracing::info!(
                selected = snapshot.selected_item_ids.len(),
                "restored saved draft"
            );
            Some(snapshot)
        }
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed draft");
            None
        }
    }
}

// =========================================================================
// SQLite
// =========================================================================

/// Draft store backed by the `form_drafts` table.
pub struct SqliteDraftStore {
    db: Arc<Mutex<Database>>,
    key: String,
}

impl SqliteDraftStore {
    pub fn new(db: Arc<Mutex<Database>>, key: impl Into<String>) -> Self {
        Self {
            db,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl DraftStore for SqliteDraftStore {
    fn load(&self) -> StoreResult<Option<String>> {
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(db.load_draft(&self.key)?)
    }

    fn save(&mut self, payload: &str) -> StoreResult<()> {
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        db.save_draft(&self.key, payload)?;
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        db.clear_draft(&self.key)?;
        Ok(())
    }
}

// =========================================================================
// In-memory
// =========================================================================

#[derive(Debug, Default)]
struct MemoryInner {
    payload: Option<String>,
    saves: usize,
    unavailable: bool,
}

/// In-memory draft store. Clones share the same slot, so a test can keep a
/// handle while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw payload.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.payload = Some(payload.into());
        }
        store
    }

    pub fn payload(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|inner| inner.payload.clone())
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.saves).unwrap_or(0)
    }

    /// Make every following write fail, like a full or blocked storage area.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.unavailable = unavailable;
        }
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self) -> StoreResult<Option<String>> {
        let inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.payload.clone())
    }

    fn save(&mut self, payload: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        if inner.unavailable {
            return Err(StoreError::Unavailable("quota exceeded".into()));
        }
        inner.payload = Some(payload.to_string());
        inner.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::LockPoisoned)?;
        inner.payload = None;
        Ok(())
    }
}
