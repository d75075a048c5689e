//! Ingestion error types

use researchforge_common::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("Unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("No text content in {0}")]
    EmptyDocument(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::PdfParseError { path, message } => AppError::Extraction { path, message },
            other => AppError::Extraction {
                path: String::new(),
                message: other.to_string(),
            },
        }
    }
}
