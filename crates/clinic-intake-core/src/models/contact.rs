//! Known-patient contacts used for quick-fill.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::patient::{PatientPatch, Sex};

/// A returning patient whose details can pre-fill the form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    /// Clinic customer code - unique
    pub customer_code: String,
    pub full_name: String,
    pub phone: String,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub national_id: Option<String>,
    pub sex: Option<Sex>,
    pub doctor: Option<String>,
    pub clinical_diagnosis: Option<String>,
}

impl Contact {
    /// Create a contact with required fields.
    pub fn new(customer_code: String, full_name: String, phone: String) -> Self {
        Self {
            customer_code,
            full_name,
            phone,
            dob: None,
            address: None,
            national_id: None,
            sex: None,
            doctor: None,
            clinical_diagnosis: None,
        }
    }

    /// Patch that copies this contact onto the patient record.
    ///
    /// Optional fields the contact doesn't carry are left untouched on the form.
    pub fn to_patch(&self) -> PatientPatch {
        PatientPatch {
            full_name: Some(self.full_name.clone()),
            dob: self.dob.map(Some),
            customer_code: Some(self.customer_code.clone()),
            address: self.address.clone(),
            clinical_diagnosis: self.clinical_diagnosis.clone(),
            national_id: self.national_id.clone(),
            sex: self.sex,
            phone: Some(self.phone.clone()),
            doctor: self.doctor.clone(),
            doc_code: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_carries_identity() {
        let mut contact = Contact::new("C12345".into(), "Nguyen Van A".into(), "0901234567".into());
        contact.sex = Some(Sex::Female);

        let patch = contact.to_patch();
        assert_eq!(patch.full_name.as_deref(), Some("Nguyen Van A"));
        assert_eq!(patch.customer_code.as_deref(), Some("C12345"));
        assert_eq!(patch.sex, Some(Sex::Female));
        assert!(patch.dob.is_none());
        assert!(patch.address.is_none());
        assert!(patch.doc_code.is_none());
    }
}
