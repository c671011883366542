//! Upload entry point: file import, initial extraction and the first run.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{api_error, TestHarness};
use docflow::workflow::{ProgressKind, WorkflowOutcome};
use docflow::{DocumentIntake, DocumentStatus, DocumentStore, UploadError};

fn intake(h: &TestHarness) -> DocumentIntake {
    DocumentIntake::new(Arc::new(h.rule_executor()), h.fakes.clone())
}

#[test]
fn test_upload_runs_to_completion() {
    let h = TestHarness::new();
    let source = h.write_source("memo.txt", "Board meeting moved to Friday");

    let report = intake(&h).upload(&source).unwrap();

    assert_eq!(report.outcome, WorkflowOutcome::Completed);
    assert_eq!(report.document.filename, "memo.txt");
    assert_eq!(report.document.status, DocumentStatus::Complete);
    assert_eq!(
        report.document.extracted_text.as_deref(),
        Some("Board meeting moved to Friday")
    );
    assert!(h.upload_dir.join("memo.txt").is_file());

    // Text came from intake, so the run starts at summarize.
    assert_eq!(report.events.len(), 4);
    assert_eq!(h.fakes.extract_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_upload_records_metadata() {
    let h = TestHarness::new();
    let source = h.write_source("memo.txt", "hello");

    let report = intake(&h).upload(&source).unwrap();
    let metadata = report.document.metadata.unwrap();

    assert_eq!(metadata["original_name"], "memo.txt");
    assert_eq!(metadata["mime_type"], "text/plain");
    assert_eq!(metadata["size_bytes"], 5);
}

#[test]
fn test_duplicate_names_get_unique_uploads() {
    let h = TestHarness::new();
    let source = h.write_source("memo.txt", "hello");
    let intake = intake(&h);

    let first = intake.upload_with_budget(&source, 0).unwrap();
    let second = intake.upload_with_budget(&source, 0).unwrap();

    assert_eq!(first.document.filename, "memo.txt");
    assert_eq!(second.document.filename, "memo_2.txt");
    assert_ne!(first.document.id, second.document.id);
    assert!(h.upload_dir.join("memo_2.txt").is_file());
    assert_eq!(second.outcome, WorkflowOutcome::Exhausted);
    assert!(second.events.is_empty());
}

#[test]
fn test_failed_initial_extraction_is_retried_by_workflow() {
    let h = TestHarness::new();
    let source = h.write_source("scan.txt", "recovered text");
    h.fakes.fail_extract(api_error("ocr crashed"));

    let report = intake(&h).upload_with_budget(&source, 1).unwrap();

    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, ProgressKind::Applied);
    assert_eq!(
        report.document.extracted_text.as_deref(),
        Some("recovered text")
    );
    assert_eq!(report.document.status, DocumentStatus::TextExtracted);
}

#[test]
fn test_empty_extraction_stored_as_absent() {
    let h = TestHarness::new();
    let source = h.write_source("image.png", "");
    h.fakes.extract_returns("");

    let report = intake(&h).upload_with_budget(&source, 0).unwrap();

    assert_eq!(report.document.extracted_text, None);
    assert_eq!(report.document.status, DocumentStatus::Uploaded);
    let trail = h.db.audit_trail(report.document.id).unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[1].note, "Metadata updated");
}

#[test]
fn test_missing_source_rejected() {
    let h = TestHarness::new();
    let missing = h.temp_path().join("nope.pdf");

    assert!(matches!(
        intake(&h).upload(&missing),
        Err(UploadError::InvalidPath(_))
    ));
    assert!(h.db.list_documents(10, 0).unwrap().is_empty());
}
