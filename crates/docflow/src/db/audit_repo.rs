//! Audit repository: append-only log of mutations on `documents`.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

use super::{Database, DatabaseError};
use crate::document::DocumentId;

/// Actor recorded for mutations performed by the workflow engine.
pub const SYSTEM_ACTOR: &str = "system";

/// One audit row. Written once, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub document_id: DocumentId,
    pub action: String,
    pub actor: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let created_at: String = row.get("created_at")?;
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            action: row.get("action")?,
            actor: row.get("actor")?,
            note: row.get("note")?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

/// Appends an entry using the caller's connection so it lands in the same
/// transaction as the mutation it describes.
pub(crate) fn append(
    conn: &Connection,
    document_id: DocumentId,
    action: &str,
    actor: &str,
    note: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit (document_id, action, actor, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![document_id, action, actor, note, now_timestamp()],
    )?;
    Ok(())
}

/// Returns the audit trail of a document, oldest first.
pub fn for_document(db: &Database, document_id: DocumentId) -> Result<Vec<AuditEntry>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM audit WHERE document_id = ?1 ORDER BY id ASC")?;
        let entries = stmt
            .query_map(params![document_id], AuditEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    })
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_document() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (filename, uploaded_at) VALUES ('a.pdf', ?1)",
                params![now_timestamp()],
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    #[test]
    fn test_append_and_read_in_order() {
        let db = db_with_document();
        db.with_conn(|conn| {
            append(conn, 1, "insert", SYSTEM_ACTOR, "first")?;
            append(conn, 1, "update", SYSTEM_ACTOR, "second")
        })
        .unwrap();

        let trail = for_document(&db, 1).unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].note, "first");
        assert_eq!(trail[1].action, "update");
        assert_eq!(trail[1].actor, "system");
        assert!(trail[0].created_at <= trail[1].created_at);
    }

    #[test]
    fn test_trail_of_unknown_document_is_empty() {
        let db = db_with_document();
        assert!(for_document(&db, 42).unwrap().is_empty());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp(&now_timestamp()).is_ok());
    }
}
