//! Upload entry point: store the file, extract text, record the document and
//! drive it through the workflow.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, info_span, warn};

use crate::capability::TextExtractor;
use crate::document::DocumentRecord;
use crate::error::UploadError;
use crate::sanitize::redact_path;
use crate::workflow::{ProgressEvent, WorkflowExecutor, WorkflowOutcome};

/// Result of one upload: the record as it ended up plus the run that
/// produced it.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub document: DocumentRecord,
    pub events: Vec<ProgressEvent>,
    pub outcome: WorkflowOutcome,
}

pub struct DocumentIntake {
    executor: Arc<WorkflowExecutor>,
    extractor: Arc<dyn TextExtractor>,
}

impl DocumentIntake {
    pub fn new(executor: Arc<WorkflowExecutor>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            executor,
            extractor,
        }
    }

    /// Runs the configured step budget.
    pub fn upload(&self, source: &Path) -> Result<UploadReport, UploadError> {
        self.upload_with_budget(source, self.executor.config().max_steps)
    }

    pub fn upload_with_budget(
        &self,
        source: &Path,
        max_steps: usize,
    ) -> Result<UploadReport, UploadError> {
        if !source.is_file() {
            return Err(UploadError::InvalidPath(source.to_path_buf()));
        }
        let _span = info_span!("intake.upload", file = %redact_path(source)).entered();

        let stored = self.executor.uploads().import(source)?;
        let filename = stored
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| UploadError::InvalidPath(stored.clone()))?;

        let text = match self.extractor.extract_text(&stored) {
            Ok(text) => Some(text).filter(|t| !t.trim().is_empty()),
            Err(e) => {
                // The workflow retries extraction as its first step.
                warn!(file = %filename, error = %e, "Initial extraction failed");
                None
            }
        };

        let store = self.executor.store();
        let id = store.insert_document(&filename, text.as_deref())?;
        info!(document_id = id, file = %filename, has_text = text.is_some(), "Document uploaded");

        let metadata = intake_metadata(source, &stored);
        if !store.update_metadata(id, &metadata)? {
            warn!(document_id = id, "Intake metadata was not recorded");
        }

        let report = self.executor.run_workflow(id, max_steps).into_report();

        let document = store
            .get_document(id)?
            .ok_or(UploadError::Missing(id))?;

        Ok(UploadReport {
            document,
            events: report.events,
            outcome: report.outcome,
        })
    }
}

fn intake_metadata(source: &Path, stored: &Path) -> serde_json::Value {
    let original_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_guess::from_path(stored)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let size_bytes = std::fs::metadata(stored).map(|m| m.len()).unwrap_or(0);

    json!({
        "original_name": original_name,
        "mime_type": mime_type,
        "size_bytes": size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intake_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Quarterly Report.txt");
        std::fs::write(&source, "# Q3").unwrap();
        let stored = dir.path().join("Quarterly Report_2.txt");
        std::fs::write(&stored, "# Q3").unwrap();

        let metadata = intake_metadata(&source, &stored);
        assert_eq!(metadata["original_name"], "Quarterly Report.txt");
        assert_eq!(metadata["mime_type"], "text/plain");
        assert_eq!(metadata["size_bytes"], 4);
    }

    #[test]
    fn test_intake_metadata_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blob.zzz");
        std::fs::write(&file, [0u8; 3]).unwrap();

        let metadata = intake_metadata(&file, &file);
        assert_eq!(metadata["mime_type"], "application/octet-stream");
    }
}
