//! Document text extraction
//!
//! PDFs are read with lopdf page by page; plain-text formats are read as
//! UTF-8. Extraction sits behind [`TextExtractor`] so the corpus loader can
//! be driven by other backends in tests.

use crate::errors::IngestionError;
use std::path::Path;
use tracing::{debug, warn};

/// Turns a document on disk into plain text
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, IngestionError>;
}

/// Dispatches on file extension: `pdf` via lopdf, `txt`/`md` read directly
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestionError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => extract_text_from_pdf(path),
            "txt" | "md" => {
                let raw = std::fs::read_to_string(path)?;
                let cleaned = clean_text(&raw);
                if cleaned.is_empty() {
                    return Err(IngestionError::EmptyDocument(path.display().to_string()));
                }
                Ok(cleaned)
            }
            other => Err(IngestionError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Extract text content from a PDF file
pub fn extract_text_from_pdf(path: &Path) -> Result<String, IngestionError> {
    let doc = lopdf::Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let mut text = String::new();
    let pages = doc.get_pages();

    debug!(page_count = pages.len(), "Extracting text from PDF");

    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    let cleaned = clean_text(&text);

    if cleaned.is_empty() {
        return Err(IngestionError::PdfParseError {
            path: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    debug!(
        original_len = text.len(),
        cleaned_len = cleaned.len(),
        "Text extraction complete"
    );

    Ok(cleaned)
}

/// Clean extracted text
fn clean_text(text: &str) -> String {
    text
        // Remove BOM
        .replace('\u{FEFF}', "")
        // Normalize quotes
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        // Replace runs of whitespace with a single space
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_clean_text() {
        let input = "\u{FEFF}Hello   World\n\n\u{201C}Test\u{201D} it\u{2019}s";
        let cleaned = clean_text(input);
        assert_eq!(cleaned, "Hello World \"Test\" it's");
    }

    #[test]
    fn test_plain_text_extraction() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "line one\nline two\n").unwrap();

        let text = FileExtractor.extract_text(file.path()).unwrap();
        assert_eq!(text, "line one line two");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let err = FileExtractor.extract_text(file.path()).unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_pdf_is_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(file, "definitely not a pdf").unwrap();

        let err = FileExtractor.extract_text(file.path()).unwrap_err();
        assert!(matches!(err, IngestionError::PdfParseError { .. }));
    }
}
