//! External collaborators the workflow calls out to.
//!
//! Every capability is a synchronous call with its failure contract at the
//! boundary: an `Err` is caught by the executor, reported as a failed step
//! and never persisted. Implementations must be shareable across worker
//! threads.

pub mod openai;

use std::path::Path;
use std::sync::Arc;

use crate::error::CapabilityError;
use crate::processor::ProcessorRegistry;

pub use openai::OpenAiClient;

/// `extract_text(file) -> text`. Unsupported formats yield empty text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, CapabilityError>;
}

pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String, CapabilityError>;
}

/// Returns encoded audio (MP3).
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, CapabilityError>;
}

/// Returns encoded image bytes (PNG).
pub trait ImageGenerator: Send + Sync {
    fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, CapabilityError>;
}

/// Free-text decision maker consulted by the agentic planner. Its output is
/// untrusted and always goes through the decision parser.
pub trait DecisionOracle: Send + Sync {
    fn decide(&self, status_summary: &str) -> Result<String, CapabilityError>;
}

/// The executor's capability handles.
#[derive(Clone)]
pub struct Capabilities {
    pub extractor: Arc<dyn TextExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub images: Arc<dyn ImageGenerator>,
}

impl Capabilities {
    /// Local extraction plus one OpenAI client serving every generative call.
    pub fn with_openai(extractor: ProcessorRegistry, client: Arc<OpenAiClient>) -> Self {
        Self {
            extractor: Arc::new(extractor),
            summarizer: client.clone(),
            speech: client.clone(),
            images: client,
        }
    }
}

/// Prompt handed to the image generator for a document summary.
pub fn illustration_prompt(summary: &str) -> String {
    format!("Create a simple illustration representing: {}", summary)
}

impl TextExtractor for ProcessorRegistry {
    fn extract_text(&self, path: &Path) -> Result<String, CapabilityError> {
        Ok(self.extract(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OcrConfig;

    #[test]
    fn test_illustration_prompt() {
        assert_eq!(
            illustration_prompt("- a cat"),
            "Create a simple illustration representing: - a cat"
        );
    }

    #[test]
    fn test_registry_as_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "  body  ").unwrap();

        let registry = ProcessorRegistry::new(&OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        });
        let extractor: &dyn TextExtractor = &registry;
        assert_eq!(extractor.extract_text(&path).unwrap(), "body");

        let missing = extractor.extract_text(&dir.path().join("gone.txt"));
        assert!(matches!(missing, Err(CapabilityError::Extraction(_))));
    }
}
