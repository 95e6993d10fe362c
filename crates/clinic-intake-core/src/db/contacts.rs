//! Contact directory database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Contact, Sex};

/// Contacts offered before the user types anything.
pub const CONTACT_PREVIEW_LIMIT: usize = 4;
/// Contacts offered for a non-empty query.
pub const CONTACT_SEARCH_LIMIT: usize = 5;

impl Database {
    /// Insert or update a contact keyed by customer code.
    pub fn upsert_contact(&self, contact: &Contact) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO contacts (
                customer_code, full_name, phone, dob, address,
                national_id, sex, doctor, clinical_diagnosis, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, datetime('now'))
            ON CONFLICT(customer_code) DO UPDATE SET
                full_name = excluded.full_name,
                phone = excluded.phone,
                dob = excluded.dob,
                address = excluded.address,
                national_id = excluded.national_id,
                sex = excluded.sex,
                doctor = excluded.doctor,
                clinical_diagnosis = excluded.clinical_diagnosis,
                updated_at = datetime('now')
            "#,
            params![
                contact.customer_code,
                contact.full_name,
                contact.phone,
                contact.dob.map(|d| d.format("%Y-%m-%d").to_string()),
                contact.address,
                contact.national_id,
                contact.sex.map(|s| s.as_str()),
                contact.doctor,
                contact.clinical_diagnosis,
            ],
        )?;
        Ok(())
    }

    /// Get a contact by customer code.
    pub fn get_contact(&self, customer_code: &str) -> DbResult<Option<Contact>> {
        self.conn
            .query_row(
                r#"
                SELECT customer_code, full_name, phone, dob, address,
                       national_id, sex, doctor, clinical_diagnosis
                FROM contacts
                WHERE customer_code = ?
                "#,
                [customer_code],
                contact_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all contacts ordered by name.
    pub fn list_contacts(&self) -> DbResult<Vec<Contact>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT customer_code, full_name, phone, dob, address,
                   national_id, sex, doctor, clinical_diagnosis
            FROM contacts
            ORDER BY full_name
            "#,
        )?;

        let rows = stmt.query_map([], contact_row)?;

        let mut contacts = Vec::new();
        for row in rows {
            contacts.push(row?.try_into()?);
        }
        Ok(contacts)
    }

    /// Quick-fill lookup.
    ///
    /// A blank query previews the first few contacts. Otherwise the name and
    /// customer code are matched case-insensitively and the phone as a plain
    /// substring.
    pub fn search_contacts(&self, query: &str) -> DbResult<Vec<Contact>> {
        let q = query.trim().to_lowercase();
        let contacts = self.list_contacts()?;

        if q.is_empty() {
            return Ok(contacts.into_iter().take(CONTACT_PREVIEW_LIMIT).collect());
        }

        Ok(contacts
            .into_iter()
            .filter(|c| {
                c.full_name.to_lowercase().contains(&q)
                    || c.phone.contains(&q)
                    || c.customer_code.to_lowercase().contains(&q)
            })
            .take(CONTACT_SEARCH_LIMIT)
            .collect())
    }

    /// Delete a contact.
    pub fn delete_contact(&self, customer_code: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM contacts WHERE customer_code = ?", [customer_code])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ContactRow {
    customer_code: String,
    full_name: String,
    phone: String,
    dob: Option<String>,
    address: Option<String>,
    national_id: Option<String>,
    sex: Option<String>,
    doctor: Option<String>,
    clinical_diagnosis: Option<String>,
}

fn contact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContactRow> {
    Ok(ContactRow {
        customer_code: row.get(0)?,
        full_name: row.get(1)?,
        phone: row.get(2)?,
        dob: row.get(3)?,
        address: row.get(4)?,
        national_id: row.get(5)?,
        sex: row.get(6)?,
        doctor: row.get(7)?,
        clinical_diagnosis: row.get(8)?,
    })
}

impl TryFrom<ContactRow> for Contact {
    type Error = DbError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let dob = row
            .dob
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|_| DbError::Constraint(format!("Invalid date of birth: {}", raw)))
            })
            .transpose()?;
        let sex = row.sex.as_deref().map(string_to_sex).transpose()?;

        Ok(Contact {
            customer_code: row.customer_code,
            full_name: row.full_name,
            phone: row.phone,
            dob,
            address: row.address,
            national_id: row.national_id,
            sex,
            doctor: row.doctor,
            clinical_diagnosis: row.clinical_diagnosis,
        })
    }
}

fn string_to_sex(s: &str) -> Result<Sex, DbError> {
    match s {
        "Male" => Ok(Sex::Male),
        "Female" => Ok(Sex::Female),
        _ => Err(DbError::Constraint(format!("Unknown sex: {}", s))),
    }
}
