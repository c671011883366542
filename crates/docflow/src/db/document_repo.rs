//! Document repository: the SQLite implementation of [`DocumentStore`].

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::audit_repo::{self, AuditEntry, SYSTEM_ACTOR};
use super::{Database, DatabaseError};
use crate::document::{DocumentId, DocumentRecord, DocumentStatus, Presence};
use crate::store::DocumentStore;

/// Columns written by exactly one pipeline action each.
#[derive(Debug, Clone, Copy)]
enum Field {
    ExtractedText,
    Summary,
    TtsPath,
    ImagePath,
}

impl Field {
    fn column(&self) -> &'static str {
        match self {
            Field::ExtractedText => "extracted_text",
            Field::Summary => "summary",
            Field::TtsPath => "tts_path",
            Field::ImagePath => "image_path",
        }
    }

    fn apply(&self, record: &mut DocumentRecord, value: &str) {
        match self {
            Field::ExtractedText => record.extracted_text = Some(value.to_string()),
            Field::Summary => record.summary = Some(value.to_string()),
            Field::TtsPath => record.tts_path = Some(PathBuf::from(value)),
            Field::ImagePath => record.image_path = Some(PathBuf::from(value)),
        }
    }
}

fn record_from_row(row: &Row<'_>) -> Result<DocumentRecord, rusqlite::Error> {
    let id: DocumentId = row.get("id")?;
    let uploaded_at: String = row.get("uploaded_at")?;
    let metadata_json: Option<String> = row.get("metadata_json")?;
    let metadata = metadata_json
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()?;
    let status_label: String = row.get("status")?;

    let mut record = DocumentRecord {
        id,
        filename: row.get("filename")?,
        status: DocumentStatus::Uploaded,
        extracted_text: row.get("extracted_text")?,
        summary: row.get("summary")?,
        tts_path: row.get::<_, Option<String>>("tts_path")?.map(PathBuf::from),
        image_path: row.get::<_, Option<String>>("image_path")?.map(PathBuf::from),
        metadata,
        version: row.get("version")?,
        uploaded_at: audit_repo::parse_timestamp(&uploaded_at)?,
    };

    record.status = match DocumentStatus::parse(&status_label) {
        Some(status) => status,
        None => {
            let derived = DocumentStatus::derive(record.presence());
            log::warn!(
                "Document {} has unknown status '{}', using '{}'",
                id,
                status_label,
                derived
            );
            derived
        }
    };

    Ok(record)
}

fn find_in(conn: &Connection, id: DocumentId) -> Result<Option<DocumentRecord>, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT * FROM documents WHERE id = ?1",
            params![id],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

impl Database {
    fn update_field(
        &self,
        id: DocumentId,
        field: Field,
        value: &str,
        note: &str,
    ) -> Result<bool, DatabaseError> {
        if value.is_empty() {
            log::warn!(
                "Refusing to write empty {} for document {}",
                field.column(),
                id
            );
            return Ok(false);
        }

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let Some(mut record) = find_in(&tx, id)? else {
                return Ok(false);
            };

            field.apply(&mut record, value);
            let status = DocumentStatus::refresh(record.status, record.presence());

            tx.execute(
                &format!(
                    "UPDATE documents SET {} = ?2, status = ?3, version = version + 1 WHERE id = ?1",
                    field.column()
                ),
                params![id, value, status.as_str()],
            )?;
            audit_repo::append(&tx, id, "update", SYSTEM_ACTOR, note)?;
            tx.commit()?;
            Ok(true)
        })
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl DocumentStore for Database {
    fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>, DatabaseError> {
        self.with_conn(|conn| find_in(conn, id))
    }

    fn insert_document(
        &self,
        filename: &str,
        extracted_text: Option<&str>,
    ) -> Result<DocumentId, DatabaseError> {
        let text = extracted_text.filter(|t| !t.is_empty());
        let status = DocumentStatus::derive(Presence {
            text: text.is_some(),
            ..Presence::default()
        });

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO documents (filename, uploaded_at, status, extracted_text)
                 VALUES (?1, ?2, ?3, ?4)",
                params![filename, audit_repo::now_timestamp(), status.as_str(), text],
            )?;
            let id = tx.last_insert_rowid();
            audit_repo::append(
                &tx,
                id,
                "insert",
                SYSTEM_ACTOR,
                &format!("Document {} uploaded", filename),
            )?;
            tx.commit()?;
            Ok(id)
        })
    }

    fn update_extracted_text(&self, id: DocumentId, text: &str) -> Result<bool, DatabaseError> {
        self.update_field(id, Field::ExtractedText, text, "Extracted text updated")
    }

    fn update_summary(&self, id: DocumentId, summary: &str) -> Result<bool, DatabaseError> {
        self.update_field(id, Field::Summary, summary, "Summary updated")
    }

    fn update_tts_path(&self, id: DocumentId, path: &Path) -> Result<bool, DatabaseError> {
        let value = path_str(path);
        let note = format!("TTS path updated: {}", value);
        self.update_field(id, Field::TtsPath, &value, &note)
    }

    fn update_image_path(&self, id: DocumentId, path: &Path) -> Result<bool, DatabaseError> {
        let value = path_str(path);
        let note = format!("Image path updated: {}", value);
        self.update_field(id, Field::ImagePath, &value, &note)
    }

    fn update_status(&self, id: DocumentId, status: DocumentStatus) -> Result<bool, DatabaseError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let Some(record) = find_in(&tx, id)? else {
                return Ok(false);
            };

            if !status.is_consistent_with(record.presence()) {
                log::warn!(
                    "Refusing status '{}' for document {}: fields say '{}'",
                    status,
                    id,
                    DocumentStatus::derive(record.presence())
                );
                return Ok(false);
            }

            tx.execute(
                "UPDATE documents SET status = ?2, version = version + 1 WHERE id = ?1",
                params![id, status.as_str()],
            )?;
            audit_repo::append(
                &tx,
                id,
                "update",
                SYSTEM_ACTOR,
                &format!("Status updated to: {}", status),
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    fn update_metadata(
        &self,
        id: DocumentId,
        metadata: &serde_json::Value,
    ) -> Result<bool, DatabaseError> {
        let json = serde_json::to_string(metadata)
            .map_err(|source| DatabaseError::Metadata { id, source })?;

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let changed = tx.execute(
                "UPDATE documents SET metadata_json = ?2, version = version + 1 WHERE id = ?1",
                params![id, json],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            audit_repo::append(&tx, id, "update", SYSTEM_ACTOR, "Metadata updated")?;
            tx.commit()?;
            Ok(true)
        })
    }

    fn list_documents(&self, limit: u64, offset: u64) -> Result<Vec<DocumentRecord>, DatabaseError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM documents ORDER BY uploaded_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map(params![limit as i64, offset as i64], record_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn audit_trail(&self, id: DocumentId) -> Result<Vec<AuditEntry>, DatabaseError> {
        audit_repo::for_document(self, id)
    }
}
