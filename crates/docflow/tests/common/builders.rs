//! Builders for seeding documents in a given pipeline state.

#![allow(dead_code)]

use std::path::PathBuf;

use docflow::{Database, DocumentId, DocumentStore};

/// Inserts a document and then applies field updates through the store, so
/// the seeded record carries the same audit trail and status a real run
/// would leave behind.
pub struct DocumentBuilder {
    filename: String,
    text: Option<String>,
    summary: Option<String>,
    tts_path: Option<PathBuf>,
    image_path: Option<PathBuf>,
}

impl DocumentBuilder {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            text: None,
            summary: None,
            tts_path: None,
            image_path: None,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn tts_path(mut self, path: &str) -> Self {
        self.tts_path = Some(PathBuf::from(path));
        self
    }

    pub fn image_path(mut self, path: &str) -> Self {
        self.image_path = Some(PathBuf::from(path));
        self
    }

    /// Every output present; only the terminal action remains.
    pub fn fully_processed(self) -> Self {
        self.text("hello")
            .summary("- hello")
            .tts_path("output/audio/seed.mp3")
            .image_path("output/images/seed.png")
    }

    pub fn insert(self, db: &Database) -> DocumentId {
        let id = db
            .insert_document(&self.filename, self.text.as_deref())
            .expect("Failed to insert document");
        if let Some(summary) = &self.summary {
            assert!(db.update_summary(id, summary).unwrap());
        }
        if let Some(path) = &self.tts_path {
            assert!(db.update_tts_path(id, path).unwrap());
        }
        if let Some(path) = &self.image_path {
            assert!(db.update_image_path(id, path).unwrap());
        }
        id
    }
}
