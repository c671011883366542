use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::action::Action;
use super::status::DocumentStatus;

pub type DocumentId = i64;

/// Persisted state of one document's progress through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub filename: String,
    pub status: DocumentStatus,
    pub extracted_text: Option<String>,
    pub summary: Option<String>,
    pub tts_path: Option<PathBuf>,
    pub image_path: Option<PathBuf>,
    /// Opaque structured blob (intake details).
    pub metadata: Option<serde_json::Value>,
    /// Bumped on every mutation. Not used for locking.
    pub version: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn presence(&self) -> Presence {
        Presence {
            text: non_empty(self.extracted_text.as_deref()),
            summary: non_empty(self.summary.as_deref()),
            audio: self
                .tts_path
                .as_ref()
                .is_some_and(|p| !p.as_os_str().is_empty()),
            image: self
                .image_path
                .as_ref()
                .is_some_and(|p| !p.as_os_str().is_empty()),
        }
    }

    /// Extracted text, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.extracted_text.as_deref().filter(|t| !t.is_empty())
    }

    /// Summary, if non-empty.
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.is_empty())
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Which pipeline outputs a document currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Presence {
    pub text: bool,
    pub summary: bool,
    pub audio: bool,
    pub image: bool,
}

impl Presence {
    /// Whether the output produced by `action` is present. `Complete`
    /// produces nothing and counts as present once every output exists.
    pub fn has(&self, action: Action) -> bool {
        match action {
            Action::ExtractText => self.text,
            Action::Summarize => self.summary,
            Action::Tts => self.audio,
            Action::GenerateImage => self.image,
            Action::Complete => self.all(),
        }
    }

    pub fn all(&self) -> bool {
        self.text && self.summary && self.audio && self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DocumentRecord {
        DocumentRecord {
            id: 1,
            filename: "report.pdf".to_string(),
            status: DocumentStatus::Uploaded,
            extracted_text: None,
            summary: None,
            tts_path: None,
            image_path: None,
            metadata: None,
            version: 1,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_fresh_record_has_nothing() {
        assert_eq!(record().presence(), Presence::default());
    }

    #[test]
    fn test_empty_strings_count_as_missing() {
        let mut doc = record();
        doc.extracted_text = Some(String::new());
        doc.tts_path = Some(PathBuf::new());
        let presence = doc.presence();
        assert!(!presence.text);
        assert!(!presence.audio);
        assert_eq!(doc.text(), None);
    }

    #[test]
    fn test_presence_reflects_fields() {
        let mut doc = record();
        doc.extracted_text = Some("hello".to_string());
        doc.summary = Some("- hi".to_string());
        doc.image_path = Some(PathBuf::from("output/images/doc_1.png"));
        let presence = doc.presence();
        assert!(presence.has(Action::ExtractText));
        assert!(presence.has(Action::Summarize));
        assert!(!presence.has(Action::Tts));
        assert!(presence.has(Action::GenerateImage));
        assert!(!presence.has(Action::Complete));
    }
}
