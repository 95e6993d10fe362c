//! Patient identity models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Document code applied to fresh sessions when no configuration overrides it.
pub const DEFAULT_DOC_CODE: &str = "23209";

/// Patient sex as captured on the intake form.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

/// Patient details captured on the first wizard step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    /// Full name (required to leave the first step)
    pub full_name: String,
    /// Date of birth, never later than the day it was entered
    #[serde(with = "optional_date")]
    pub dob: Option<NaiveDate>,
    /// Clinic customer code
    pub customer_code: String,
    pub address: String,
    pub clinical_diagnosis: String,
    /// National ID or passport number
    pub national_id: String,
    pub sex: Sex,
    /// Contact phone (required to leave the first step)
    pub phone: String,
    /// Referring doctor
    pub doctor: String,
    /// Referring doctor's code
    pub doc_code: String,
}

impl PatientInfo {
    /// Create an empty patient record carrying the given document code.
    pub fn new(doc_code: impl Into<String>) -> Self {
        Self {
            full_name: String::new(),
            dob: None,
            customer_code: String::new(),
            address: String::new(),
            clinical_diagnosis: String::new(),
            national_id: String::new(),
            sex: Sex::default(),
            phone: String::new(),
            doctor: String::new(),
            doc_code: doc_code.into(),
        }
    }

    /// Merge the fields present in `patch`, clamping the date of birth to `today`.
    pub fn merge(&mut self, patch: PatientPatch, today: NaiveDate) {
        let PatientPatch {
            full_name,
            dob,
            customer_code,
            address,
            clinical_diagnosis,
            national_id,
            sex,
            phone,
            doctor,
            doc_code,
        } = patch;

        if let Some(v) = full_name {
            self.full_name = v;
        }
        if let Some(v) = dob {
            self.dob = v.map(|d| clamp_dob(d, today));
        }
        if let Some(v) = customer_code {
            self.customer_code = v;
        }
        if let Some(v) = address {
            self.address = v;
        }
        if let Some(v) = clinical_diagnosis {
            self.clinical_diagnosis = v;
        }
        if let Some(v) = national_id {
            self.national_id = v;
        }
        if let Some(v) = sex {
            self.sex = v;
        }
        if let Some(v) = phone {
            self.phone = v;
        }
        if let Some(v) = doctor {
            self.doctor = v;
        }
        if let Some(v) = doc_code {
            self.doc_code = v;
        }
    }
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self::new(DEFAULT_DOC_CODE)
    }
}

/// Partial update for [`PatientInfo`]. `None` leaves a field untouched.
///
/// `dob` is doubly optional: `Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientPatch {
    pub full_name: Option<String>,
    pub dob: Option<Option<NaiveDate>>,
    pub customer_code: Option<String>,
    pub address: Option<String>,
    pub clinical_diagnosis: Option<String>,
    pub national_id: Option<String>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
    pub doctor: Option<String>,
    pub doc_code: Option<String>,
}

impl PatientPatch {
    pub fn full_name(mut self, value: impl Into<String>) -> Self {
        self.full_name = Some(value.into());
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }

    pub fn dob(mut self, value: Option<NaiveDate>) -> Self {
        self.dob = Some(value);
        self
    }

    pub fn customer_code(mut self, value: impl Into<String>) -> Self {
        self.customer_code = Some(value.into());
        self
    }

    pub fn clinical_diagnosis(mut self, value: impl Into<String>) -> Self {
        self.clinical_diagnosis = Some(value.into());
        self
    }

    pub fn national_id(mut self, value: impl Into<String>) -> Self {
        self.national_id = Some(value.into());
        self
    }

    pub fn sex(mut self, value: Sex) -> Self {
        self.sex = Some(value);
        self
    }

    pub fn address(mut self, value: impl Into<String>) -> Self {
        self.address = Some(value.into());
        self
    }

    pub fn doctor(mut self, value: impl Into<String>) -> Self {
        self.doctor = Some(value.into());
        self
    }

    pub fn doc_code(mut self, value: impl Into<String>) -> Self {
        self.doc_code = Some(value.into());
        self
    }

    /// True when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        *self == PatientPatch::default()
    }
}

/// A date of birth can't be in the future.
pub fn clamp_dob(dob: NaiveDate, today: NaiveDate) -> NaiveDate {
    dob.min(today)
}

/// Serializes `Option<NaiveDate>` as `"YYYY-MM-DD"`, with `""` for no date.
mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&raw, FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_patient_defaults() {
        let patient = PatientInfo::default();
        assert_eq!(patient.doc_code, "23209");
        assert_eq!(patient.sex, Sex::Male);
        assert!(patient.full_name.is_empty());
        assert!(patient.dob.is_none());
    }

    #[test]
    fn test_merge_only_touches_present_fields() {
        let mut patient = PatientInfo::default();
        patient.address = "12 Le Loi".into();

        let patch = PatientPatch::default().full_name("Jane Doe").phone("0912345678");
        patient.merge(patch, date(2026, 10, 18));

        assert_eq!(patient.full_name, "Jane Doe");
        assert_eq!(patient.phone, "0912345678");
        assert_eq!(patient.address, "12 Le Loi");
        assert_eq!(patient.doc_code, "23209");
    }

    #[test]
    fn test_future_dob_clamped_to_today() {
        let today = date(2026, 10, 18);
        let mut patient = PatientInfo::default();

        patient.merge(PatientPatch::default().dob(Some(date(2030, 1, 1))), today);
        assert_eq!(patient.dob, Some(today));

        patient.merge(PatientPatch::default().dob(Some(date(1990, 5, 2))), today);
        assert_eq!(patient.dob, Some(date(1990, 5, 2)));

        patient.merge(PatientPatch::default().dob(None), today);
        assert_eq!(patient.dob, None);
    }

    #[test]
    fn test_dob_serializes_as_plain_date() {
        let mut patient = PatientInfo::default();
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["dob"], "");
        assert_eq!(json["docCode"], "23209");

        patient.dob = Some(date(1990, 5, 2));
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["dob"], "1990-05-02");

        let back: PatientInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, patient);
    }

    #[test]
    fn test_builder_covers_every_field() {
        let dob = date(1990, 5, 2);
        let patch = PatientPatch::default()
            .full_name("Jane Doe")
            .dob(Some(dob))
            .customer_code("C42")
            .address("12 Le Loi")
            .clinical_diagnosis("Fatigue")
            .national_id("079190000001")
            .sex(Sex::Female)
            .phone("0912345678")
            .doctor("Dr. Hoang")
            .doc_code("11111");

        let mut patient = PatientInfo::default();
        patient.merge(patch, date(2026, 10, 18));

        assert_eq!(
            patient,
            PatientInfo {
                full_name: "Jane Doe".into(),
                dob: Some(dob),
                customer_code: "C42".into(),
                address: "12 Le Loi".into(),
                clinical_diagnosis: "Fatigue".into(),
                national_id: "079190000001".into(),
                sex: Sex::Female,
                phone: "0912345678".into(),
                doctor: "Dr. Hoang".into(),
                doc_code: "11111".into(),
            }
        );
    }

    #[test]
    fn test_empty_patch() {
        assert!(PatientPatch::default().is_empty());
        assert!(!PatientPatch::default().phone("1").is_empty());
    }
}
