//! Form draft database operations.
//!
//! Drafts are opaque JSON payloads stored under a fixed key.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};

impl Database {
    /// Insert or replace the draft stored under `key`.
    pub fn save_draft(&self, key: &str, payload: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO form_drafts (key, payload, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = datetime('now')
            "#,
            params![key, payload],
        )?;
        Ok(())
    }

    /// Get the raw draft payload stored under `key`.
    pub fn load_draft(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT payload FROM form_drafts WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete the draft stored under `key`.
    pub fn clear_draft(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM form_drafts WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test_draft";

    #[test]
    fn test_save_and_load() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.load_draft(KEY).unwrap(), None);

        db.save_draft(KEY, r#"{"a":1}"#).unwrap();
        assert_eq!(db.load_draft(KEY).unwrap().as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_save_replaces_existing() {
        let db = Database::open_in_memory().unwrap();
        db.save_draft(KEY, "first").unwrap();
        db.save_draft(KEY, "second").unwrap();

        assert_eq!(db.load_draft(KEY).unwrap().as_deref(), Some("second"));

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM form_drafts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let db = Database::open_in_memory().unwrap();
        db.save_draft("a", "one").unwrap();
        db.save_draft("b", "two").unwrap();

        assert!(db.clear_draft("a").unwrap());
        assert_eq!(db.load_draft("a").unwrap(), None);
        assert_eq!(db.load_draft("b").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_clear_missing_draft() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.clear_draft(KEY).unwrap());
    }
}
