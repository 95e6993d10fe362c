//! End-to-end intake flows through the session.

use std::sync::Arc;

use chrono::NaiveDate;
use clinic_intake_core::store::MemoryDraftStore;
use clinic_intake_core::{
    Catalog, IntakeConfig, IntakeSession, PatientPatch, RequiredField, SamplePriority, Step,
    WizardState,
};

fn open(store: &MemoryDraftStore) -> IntakeSession {
    let config = IntakeConfig {
        debounce_ms: 30_000,
        ..IntakeConfig::default()
    };
    IntakeSession::open(config, Arc::new(Catalog::builtin()), Box::new(store.clone()))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

#[test]
fn test_jane_doe_intake() {
    let store = MemoryDraftStore::new();
    let mut session = open(&store);

    let status = session.status();
    assert!(!status.can_proceed_from_step0);
    assert_eq!(
        status.missing_patient_fields,
        vec![RequiredField::FullName, RequiredField::Phone]
    );

    session.set_patient_as_of(
        PatientPatch::default()
            .full_name("Jane Doe")
            .phone("0912345678")
            .dob(NaiveDate::from_ymd_opt(1990, 5, 2)),
        today(),
    );
    assert!(session.status().can_proceed_from_step0);
    assert!(session.advance());

    session.toggle_item("cbc");
    session.set_other_test("  Vitamin D  ");
    let status = session.status();
    assert_eq!(status.total_selected, 2);
    assert!(status.can_proceed_from_step1);
    assert!(session.advance());

    session.set_signature(Some("data:image/png;base64,iVBORw0KGgo=".into()));
    assert_eq!(session.guidance().helper, "Signed • Ready to export.");
    assert!(session.complete());
    assert_eq!(
        session.wizard(),
        WizardState {
            step: Step::Review,
            completed: true
        }
    );

    let text = session.export_document().to_text();
    assert!(text.contains("Full name: Jane Doe"));
    assert!(text.contains("DOB: 1990-05-02"));
    assert!(text.contains("Hematology"));
    assert!(text.contains("• Other: Vitamin D"));
    assert!(!text.contains("(not signed)"));
}

#[test]
fn test_lipid_select_all_and_clear() {
    let store = MemoryDraftStore::new();
    let mut session = open(&store);
    session.toggle_item("cbc");

    assert!(session.select_all_in("lipid"));
    let lipid = session
        .category_progress()
        .into_iter()
        .find(|p| p.category_id == "lipid")
        .unwrap();
    assert_eq!((lipid.selected, lipid.total), (4, 4));
    assert!(lipid.is_complete());
    assert_eq!(session.status().total_selected, 5);

    assert!(session.clear_in("lipid"));
    let form = session.snapshot();
    assert_eq!(form.selected_item_ids.len(), 1);
    assert!(form.is_selected("cbc"));
}

#[test]
fn test_whitespace_other_test_not_counted() {
    let store = MemoryDraftStore::new();
    let mut session = open(&store);

    session.set_other_test("   ");
    let status = session.status();
    assert_eq!(status.total_selected, 0);
    assert!(!status.can_proceed_from_step1);
}

#[test]
fn test_every_edit_invalidates_completion() {
    let store = MemoryDraftStore::new();
    let mut session = open(&store);

    let edits: [fn(&mut IntakeSession); 7] = [
        |s| s.set_patient(PatientPatch::default().full_name("X")),
        |s| s.set_priority(SamplePriority::Urgent),
        |s| s.toggle_item("tsh"),
        |s| {
            s.select_all_in("kidney");
        },
        |s| {
            s.clear_in("kidney");
        },
        |s| s.set_other_test("extra"),
        |s| s.set_signature(None),
    ];

    for edit in edits {
        session.set_step(Step::Review);
        assert!(session.complete());
        edit(&mut session);
        assert!(!session.wizard().completed);
        assert_eq!(session.wizard().step, Step::Review);
    }
}

#[test]
fn test_leaving_review_clears_completion() {
    let store = MemoryDraftStore::new();
    let mut session = open(&store);

    session.set_step(Step::Review);
    session.complete();
    session.set_step(Step::Review);
    assert!(session.wizard().completed);

    session.set_step(Step::Tests);
    assert!(!session.wizard().completed);
    assert!(!session.complete());
}

#[test]
fn test_reset_starts_over() {
    let store = MemoryDraftStore::new();
    let mut session = open(&store);
    session.set_patient(PatientPatch::default().full_name("Jane Doe").phone("1"));
    session.toggle_item("cbc");
    session.set_step(Step::Review);
    session.complete();
    session.flush();
    let created_before = session.snapshot().created_at;

    session.reset();

    let form = session.snapshot();
    assert_eq!(session.wizard(), WizardState::default());
    assert!(form.patient.full_name.is_empty());
    assert!(form.selected_item_ids.is_empty());
    assert!(form.signature.is_none());
    assert_eq!(form.patient.doc_code, "23209");
    assert!(form.created_at >= created_before);
    assert!(store.payload().is_none());
}

#[test]
fn test_malformed_draft_falls_back_to_fresh_form() {
    let store = MemoryDraftStore::with_payload("{\"patient\": {\"fullName\": \"Ja");
    let session = open(&store);

    let form = session.snapshot();
    assert!(form.patient.full_name.is_empty());
    assert!(form.selected_item_ids.is_empty());
    assert_eq!(session.wizard(), WizardState::default());
}

#[test]
fn test_restored_draft_keeps_wizard_at_start() {
    let store = MemoryDraftStore::new();
    {
        let mut session = open(&store);
        session.set_patient(PatientPatch::default().full_name("Jane Doe").phone("1"));
        session.toggle_item("hba1c");
        session.set_step(Step::Review);
    }

    let session = open(&store);
    assert_eq!(session.snapshot().patient.full_name, "Jane Doe");
    assert!(session.snapshot().is_selected("hba1c"));
    assert_eq!(session.wizard().step, Step::Patient);
}

#[test]
fn test_config_doc_code_used_for_fresh_forms() {
    let store = MemoryDraftStore::new();
    let config = IntakeConfig {
        default_doc_code: "99001".into(),
        ..IntakeConfig::default()
    };
    let mut session =
        IntakeSession::open(config, Arc::new(Catalog::builtin()), Box::new(store.clone()));
    assert_eq!(session.snapshot().patient.doc_code, "99001");

    session.set_patient(PatientPatch::default().doc_code("11111"));
    session.reset();
    assert_eq!(session.snapshot().patient.doc_code, "99001");
}
