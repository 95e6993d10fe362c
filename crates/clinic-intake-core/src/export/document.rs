//! Consultation document rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::IntakeConfig;
use crate::engine::selected_by_category;
use crate::models::{Catalog, FormSnapshot};

/// Shown for patient fields left blank.
pub const EMPTY_FIELD: &str = "—";
/// Shown instead of the signature image on unsigned forms.
pub const NOT_SIGNED: &str = "(not signed)";

/// One labelled patient field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentField {
    pub label: &'static str,
    pub value: String,
}

/// Selected tests of one catalog category.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentGroup {
    pub category: String,
    pub tests: Vec<String>,
}

/// Frozen, printable view of a form.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationDocument {
    pub export_id: String,
    pub file_name: String,
    pub exported_at: DateTime<Utc>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub patient: Vec<DocumentField>,
    pub priority: String,
    pub selected_tests: Vec<DocumentGroup>,
    /// Trimmed free-text test, when not blank
    pub other_test: Option<String>,
    /// Signature image payload, passed through untouched
    pub signature: Option<String>,
    pub footer: String,
}

/// Rendered document ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub file_name: String,
    pub content: String,
    /// Hex SHA-256 of `content`
    pub sha256: String,
}

impl ConsultationDocument {
    /// Build a document from whatever the form holds; incomplete forms are
    /// rendered with placeholders rather than rejected.
    pub fn from_snapshot(form: &FormSnapshot, catalog: &Catalog, config: &IntakeConfig) -> Self {
        let exported_at = Utc::now();
        let export_id = uuid::Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "consultation_{}_{}.txt",
            exported_at.timestamp_millis(),
            &export_id[..8]
        );

        let p = &form.patient;
        let patient = vec![
            field("Full name", &p.full_name),
            field(
                "DOB",
                &p.dob.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            ),
            field("Sex", p.sex.as_str()),
            field("Phone", &p.phone),
            field("Customer code", &p.customer_code),
            field("National ID", &p.national_id),
            field("Address", &p.address),
            field("Doctor", &p.doctor),
            field("DOCCODE", &p.doc_code),
            field("Clinical diagnosis", &p.clinical_diagnosis),
        ];

        let selected_tests = selected_by_category(form, catalog)
            .into_iter()
            .map(|group| DocumentGroup {
                category: group.category.name_en.clone(),
                tests: group.items.iter().map(|i| i.label_en.clone()).collect(),
            })
            .collect();

        Self {
            export_id,
            file_name,
            exported_at,
            title: config.document_title.clone(),
            created_at: form.created_at,
            patient,
            priority: form.priority.as_str().to_string(),
            selected_tests,
            other_test: form.other_test_trimmed().map(str::to_string),
            signature: form.signature.clone(),
            footer: config.footer_notice.clone(),
        }
    }

    /// Plain-text rendering.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&format!(
            "Created: {}\n\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        out.push_str("Patient Information\n");
        for f in &self.patient {
            out.push_str(&format!("{}: {}\n", f.label, f.value));
        }
        out.push_str(&format!("Sample priority: {}\n\n", self.priority));

        out.push_str("Selected Tests\n");
        if self.selected_tests.is_empty() && self.other_test.is_none() {
            out.push_str("No tests selected.\n");
        }
        for group in &self.selected_tests {
            out.push_str(&group.category);
            out.push('\n');
            for test in &group.tests {
                out.push_str(&format!("  • {}\n", test));
            }
        }
        if let Some(other) = &self.other_test {
            out.push_str(&format!("• Other: {}\n", other));
        }
        out.push('\n');

        out.push_str("Signature\n");
        match &self.signature {
            Some(payload) => out.push_str(&format!(
                "[signature image attached, {} bytes]\n",
                payload.len()
            )),
            None => {
                out.push_str(NOT_SIGNED);
                out.push('\n');
            }
        }
        out.push('\n');

        out.push_str(&self.footer);
        out.push('\n');
        out
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render the text form with its file name and digest.
    pub fn render(&self) -> ExportedDocument {
        let content = self.to_text();
        let sha256 = hex::encode(Sha256::digest(content.as_bytes()));
        ExportedDocument {
            file_name: self.file_name.clone(),
            content,
            sha256,
        }
    }
}

fn field(label: &'static str, value: &str) -> DocumentField {
    let value = if value.trim().is_empty() {
        EMPTY_FIELD.to_string()
    } else {
        value.to_string()
    };
    DocumentField { label, value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> FormSnapshot {
        let mut form = FormSnapshot::new("23209");
        form.patient.full_name = "Jane Doe".into();
        form.patient.phone = "0912345678".into();
        form.selected_item_ids.insert("cbc".into());
        form.selected_item_ids.insert("hdl".into());
        form.selected_item_ids.insert("cholesterol".into());
        form.other_test = "  extra panel ".into();
        form
    }

    fn value_of<'a>(doc: &'a ConsultationDocument, label: &str) -> &'a str {
        &doc.patient.iter().find(|f| f.label == label).unwrap().value
    }

    #[test]
    fn test_groups_follow_catalog_order() {
        let doc = ConsultationDocument::from_snapshot(
            &filled_form(),
            &Catalog::builtin(),
            &IntakeConfig::default(),
        );

        assert_eq!(doc.selected_tests.len(), 2);
        assert_eq!(doc.selected_tests[0].category, "Hematology");
        assert_eq!(
            doc.selected_tests[1].tests,
            vec!["Total cholesterol".to_string(), "HDL cholesterol".to_string()]
        );
        assert_eq!(doc.other_test.as_deref(), Some("extra panel"));
    }

    #[test]
    fn test_blank_fields_get_placeholder() {
        let doc = ConsultationDocument::from_snapshot(
            &FormSnapshot::new("23209"),
            &Catalog::builtin(),
            &IntakeConfig::default(),
        );

        assert_eq!(value_of(&doc, "Full name"), EMPTY_FIELD);
        assert_eq!(value_of(&doc, "DOB"), EMPTY_FIELD);
        assert_eq!(value_of(&doc, "DOCCODE"), "23209");

        let text = doc.to_text();
        assert!(text.contains("No tests selected."));
        assert!(text.contains(NOT_SIGNED));
    }

    #[test]
    fn test_text_rendering() {
        let mut form = filled_form();
        form.signature = Some("data:image/png;base64,AAAA".into());
        let doc = ConsultationDocument::from_snapshot(&form, &Catalog::builtin(), &IntakeConfig::default());
        let text = doc.to_text();

        assert!(text.starts_with("CONSULTATION FORM\n"));
        assert!(text.contains("Full name: Jane Doe"));
        assert!(text.contains("Sample priority: Regular"));
        assert!(text.contains("  • Complete blood count (CBC)"));
        assert!(text.contains("• Other: extra panel"));
        assert!(text.contains("[signature image attached, 26 bytes]"));
        assert!(!text.contains(NOT_SIGNED));
        assert!(text.trim_end().ends_with("diag.vn"));
    }

    #[test]
    fn test_file_names_unique_per_export() {
        let form = filled_form();
        let catalog = Catalog::builtin();
        let config = IntakeConfig::default();

        let a = ConsultationDocument::from_snapshot(&form, &catalog, &config);
        let b = ConsultationDocument::from_snapshot(&form, &catalog, &config);

        assert_ne!(a.file_name, b.file_name);
        assert!(a.file_name.starts_with("consultation_"));
        assert!(a.file_name.ends_with(".txt"));
    }

    #[test]
    fn test_render_digest() {
        let doc = ConsultationDocument::from_snapshot(
            &filled_form(),
            &Catalog::builtin(),
            &IntakeConfig::default(),
        );
        let exported = doc.render();

        assert_eq!(exported.sha256.len(), 64);
        assert_eq!(
            exported.sha256,
            hex::encode(Sha256::digest(doc.to_text().as_bytes()))
        );
    }

    #[test]
    fn test_json_export() {
        let doc = ConsultationDocument::from_snapshot(
            &filled_form(),
            &Catalog::builtin(),
            &IntakeConfig::default(),
        );
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"file_name\""));
        assert!(json.contains("Jane Doe"));
        assert!(json.contains("extra panel"));
    }
}
