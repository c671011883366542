//! Persistence contract consumed by the planner and the executor.

use std::path::Path;

use crate::db::audit_repo::AuditEntry;
use crate::db::DatabaseError;
use crate::document::{DocumentId, DocumentRecord, DocumentStatus};

/// CRUD over document records plus the append-only audit log.
///
/// Every mutating call appends exactly one audit entry when it applies.
/// Field updates bump `version` and refresh `status` together with the
/// field. Updates return `Ok(false)` when nothing was written: unknown
/// document, an empty value, or a status label that contradicts the
/// populated fields.
pub trait DocumentStore: Send + Sync {
    fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>, DatabaseError>;

    fn insert_document(
        &self,
        filename: &str,
        extracted_text: Option<&str>,
    ) -> Result<DocumentId, DatabaseError>;

    fn update_extracted_text(&self, id: DocumentId, text: &str) -> Result<bool, DatabaseError>;

    fn update_summary(&self, id: DocumentId, summary: &str) -> Result<bool, DatabaseError>;

    fn update_tts_path(&self, id: DocumentId, path: &Path) -> Result<bool, DatabaseError>;

    fn update_image_path(&self, id: DocumentId, path: &Path) -> Result<bool, DatabaseError>;

    fn update_status(&self, id: DocumentId, status: DocumentStatus) -> Result<bool, DatabaseError>;

    fn update_metadata(
        &self,
        id: DocumentId,
        metadata: &serde_json::Value,
    ) -> Result<bool, DatabaseError>;

    /// Newest first.
    fn list_documents(&self, limit: u64, offset: u64) -> Result<Vec<DocumentRecord>, DatabaseError>;

    /// Oldest first.
    fn audit_trail(&self, id: DocumentId) -> Result<Vec<AuditEntry>, DatabaseError>;
}
