//! SQLite schema definition.

/// Complete database schema for clinic intake.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Form Drafts (single key per session, JSON payload)
-- ============================================================================

CREATE TABLE IF NOT EXISTS form_drafts (
    key TEXT PRIMARY KEY,
    payload TEXT NOT NULL,                        -- JSON document, see store::codec
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Contacts (quick-fill directory)
-- ============================================================================

CREATE TABLE IF NOT EXISTS contacts (
    customer_code TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    phone TEXT NOT NULL,
    dob TEXT,                                     -- YYYY-MM-DD
    address TEXT,
    national_id TEXT,
    sex TEXT,                                     -- 'Male' | 'Female'
    doctor TEXT,
    clinical_diagnosis TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(full_name);
CREATE INDEX IF NOT EXISTS idx_contacts_phone ON contacts(phone);
"#;
