use std::path::Path;

use crate::error::ProcessError;
use crate::processor::{DocumentFormat, DocumentProcessor};

/// Plain text and markdown. Invalid UTF-8 is replaced rather than rejected.
pub struct TextProcessor;

impl DocumentProcessor for TextProcessor {
    fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn supports(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_extract_text_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Hello, World!").unwrap();
        writeln!(temp_file, "This is a test document.").unwrap();

        let text = TextProcessor.extract(temp_file.path()).unwrap();
        assert!(text.contains("Hello, World!"));
        assert!(text.contains("This is a test document."));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), [b'o', b'k', 0xFF]).unwrap();

        let text = TextProcessor.extract(temp_file.path()).unwrap();
        assert!(text.starts_with("ok"));
    }

    #[test]
    fn test_supports_text_format() {
        assert!(TextProcessor.supports(DocumentFormat::Text));
        assert!(!TextProcessor.supports(DocumentFormat::Pdf));
        assert!(!TextProcessor.supports(DocumentFormat::Image));
    }
}
