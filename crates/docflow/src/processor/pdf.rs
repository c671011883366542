use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ProcessError;
use crate::processor::ocr::OcrEngine;
use crate::processor::{DocumentFormat, DocumentProcessor};

/// PDFs with an embedded text layer are read directly through lopdf.
/// Scans (no usable text layer) are rendered page by page with `pdftoppm`
/// and sent through OCR when an engine is configured.
pub struct PdfProcessor {
    ocr: Option<OcrEngine>,
}

impl PdfProcessor {
    pub fn new(ocr: Option<OcrEngine>) -> Self {
        Self { ocr }
    }
}

impl DocumentProcessor for PdfProcessor {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let doc = lopdf::Document::load_mem(&bytes)
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        let text = text_layer(&doc);
        if !needs_ocr(&text) {
            return Ok(text);
        }

        match &self.ocr {
            Some(ocr) => {
                tracing::info!("PDF has no usable text layer, falling back to OCR");
                Ok(ocr_pages(&bytes, doc.get_pages().len(), ocr))
            }
            None => Ok(text),
        }
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Pdf)
    }
}

fn text_layer(doc: &lopdf::Document) -> String {
    let mut text = String::new();
    for page_num in doc.get_pages().keys() {
        if let Ok(page_text) = doc.extract_text(&[*page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    text
}

/// lopdf emits this marker for CID fonts it cannot decode.
const IDENTITY_H_MARKER: &str = "?Identity-H Unimplemented?";

/// Below this length the alphanumeric ratio check is skipped.
const MIN_TOTAL_CHARS: usize = 50;

const MIN_ALPHANUMERIC_PERCENT: usize = 10;

/// True when the text layer is empty, only undecodable-font markers, or
/// mostly punctuation noise.
fn needs_ocr(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }

    let without_markers = trimmed
        .replace(IDENTITY_H_MARKER, "")
        .replace(['\n', ' '], "");
    if without_markers.is_empty() {
        return true;
    }

    let total = trimmed.chars().count();
    let alphanumeric = trimmed.chars().filter(|c| c.is_alphanumeric()).count();
    total > MIN_TOTAL_CHARS && alphanumeric * 100 < total * MIN_ALPHANUMERIC_PERCENT
}

/// Pages that fail to render or recognize are skipped.
fn ocr_pages(pdf_bytes: &[u8], page_count: usize, ocr: &OcrEngine) -> String {
    let mut all_text = String::new();
    for page_num in 1..=page_count {
        let rendered = render_page(pdf_bytes, page_num as u32, ocr.dpi());
        match rendered.and_then(|png| ocr.recognize(&png)) {
            Ok(page_text) => {
                all_text.push_str(&page_text);
                all_text.push('\n');
            }
            Err(e) => tracing::warn!(page = page_num, error = %e, "Skipping page during OCR"),
        }
    }
    all_text
}

fn render_page(pdf_bytes: &[u8], page_num: u32, dpi: u32) -> Result<Vec<u8>, ProcessError> {
    let temp_dir = std::env::temp_dir();
    let run_id = uuid::Uuid::new_v4();
    let pdf_path = temp_dir.join(format!("docflow_{}.pdf", run_id));
    let prefix = temp_dir.join(format!("docflow_page_{}", run_id));

    std::fs::write(&pdf_path, pdf_bytes)
        .map_err(|e| ProcessError::PdfProcessing(format!("Failed to write temp PDF: {}", e)))?;

    let page = page_num.to_string();
    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string(), "-f", &page, "-l", &page])
        .arg(&pdf_path)
        .arg(&prefix)
        .output();
    let _ = std::fs::remove_file(&pdf_path);

    let output = output.map_err(|e| {
        ProcessError::PdfProcessing(format!(
            "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
            e
        ))
    })?;
    if !output.status.success() {
        return Err(ProcessError::PdfProcessing(format!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    // pdftoppm pads the page suffix depending on the document's page count.
    let image_path = [
        format!("{}-{}.png", prefix.display(), page_num),
        format!("{}-{:02}.png", prefix.display(), page_num),
        format!("{}-{:03}.png", prefix.display(), page_num),
    ]
    .into_iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
    .ok_or_else(|| ProcessError::PdfProcessing("Failed to find rendered page image".to_string()))?;

    let data = std::fs::read(&image_path).map_err(|e| {
        ProcessError::PdfProcessing(format!("Failed to read rendered image: {}", e))
    })?;
    let _ = std::fs::remove_file(&image_path);

    Ok(data)
}
