//! Text extraction from uploaded files.
//!
//! Dispatch is by file extension. Formats without a processor are not an
//! error: they extract to empty text and the document simply stays at
//! `uploaded` until text arrives some other way.

pub mod image;
pub mod ocr;
pub mod pdf;
pub mod text;

use std::path::Path;

use crate::config::OcrConfig;
use crate::error::ProcessError;
use crate::sanitize::redact_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
    Image,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" | "md" => Some(Self::Text),
            "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" | "gif" | "webp" => Some(Self::Image),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

pub trait DocumentProcessor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ProcessError>;
    fn supports(&self, format: DocumentFormat) -> bool;
}

pub struct ProcessorRegistry {
    processors: Vec<Box<dyn DocumentProcessor>>,
}

impl ProcessorRegistry {
    pub fn new(ocr: &OcrConfig) -> Self {
        let engine = ocr
            .enabled
            .then(|| ocr::OcrEngine::new(&ocr.languages, ocr.dpi));

        let processors: Vec<Box<dyn DocumentProcessor>> = vec![
            Box::new(text::TextProcessor),
            Box::new(pdf::PdfProcessor::new(engine.clone())),
            Box::new(image::ImageProcessor::new(engine)),
        ];

        Self { processors }
    }

    /// Extracts trimmed text. Unsupported formats yield an empty string.
    pub fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let Some(format) = DocumentFormat::from_path(path) else {
            tracing::debug!(file = %redact_path(path), "No processor for file, extracting nothing");
            return Ok(String::new());
        };

        let _span = tracing::info_span!("processor.extract", file = %redact_path(path), ?format)
            .entered();

        match self.processors.iter().find(|p| p.supports(format)) {
            Some(processor) => Ok(processor.extract(path)?.trim().to_string()),
            None => Ok(String::new()),
        }
    }
}
