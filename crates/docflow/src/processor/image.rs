use std::path::Path;

use crate::error::ProcessError;
use crate::processor::ocr::OcrEngine;
use crate::processor::{DocumentFormat, DocumentProcessor};

/// Scanned pages and photos. Without an OCR engine images carry no text.
pub struct ImageProcessor {
    ocr: Option<OcrEngine>,
}

impl ImageProcessor {
    pub fn new(ocr: Option<OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl DocumentProcessor for ImageProcessor {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let Some(ocr) = &self.ocr else {
            tracing::debug!("OCR disabled, image yields no text");
            return Ok(String::new());
        };

        let _span = tracing::info_span!("processor.image").entered();
        ocr.recognize_file(path)
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Image)
    }
}
