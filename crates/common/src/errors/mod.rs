//! Error types for ResearchForge
//!
//! Provides a single error taxonomy shared by ingestion, retrieval and
//! the research pipeline:
//! - Distinct error types for configuration, fetch, and generation failures
//! - Stage attribution for pipeline failures
//! - Error codes for machine-readable identification

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors (1xxx)
    InvalidTopic,

    // Corpus errors (4xxx)
    EmptyCorpus,
    ExtractionError,

    // Pipeline errors (5xxx)
    StageFailed,
    StateViolation,

    // External collaborator errors (8xxx)
    FetchError,
    GenerationError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidTopic => 1001,

            ErrorCode::EmptyCorpus => 4001,
            ErrorCode::ExtractionError => 4002,

            ErrorCode::StageFailed => 5001,
            ErrorCode::StateViolation => 5002,

            ErrorCode::FetchError => 8001,
            ErrorCode::GenerationError => 8002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Research topic must not be blank")]
    InvalidTopic,

    // Corpus errors
    #[error("No chunks were produced from corpus at {dir}")]
    EmptyCorpus { dir: String },

    #[error("Text extraction failed for {path}: {message}")]
    Extraction { path: String, message: String },

    // Pipeline errors
    #[error("Stage {stage} failed: {source}")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("Pipeline state field `{field}` written out of order")]
    StateViolation { field: &'static str },

    // External collaborator errors
    #[error("Snippet fetch failed: {message}")]
    Fetch { message: String },

    #[error("Generation failed: {message}")]
    Generation { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AppError {
    /// Shorthand for a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        AppError::Configuration {
            message: message.into(),
        }
    }

    /// Attach the failing stage name to a collaborator error
    pub fn stage_failed(stage: &'static str, source: AppError) -> Self {
        AppError::StageFailed {
            stage,
            source: Box::new(source),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidTopic => ErrorCode::InvalidTopic,
            AppError::EmptyCorpus { .. } => ErrorCode::EmptyCorpus,
            AppError::Extraction { .. } => ErrorCode::ExtractionError,
            AppError::StageFailed { .. } => ErrorCode::StageFailed,
            AppError::StateViolation { .. } => ErrorCode::StateViolation,
            AppError::Fetch { .. } => ErrorCode::FetchError,
            AppError::Generation { .. } => ErrorCode::GenerationError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
        }
    }

    /// Name of the pipeline stage that failed, if any
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            AppError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Errors that degrade a run instead of failing it
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Fetch { .. } | AppError::EmptyCorpus { .. })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::Fetch { message: "offline".into() };
        assert_eq!(err.code(), ErrorCode::FetchError);
        assert_eq!(err.code().as_code(), 8001);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_stage_failed_keeps_stage_and_source() {
        let err = AppError::stage_failed(
            "REVIEW_B",
            AppError::Generation { message: "quota exceeded".into() },
        );

        assert_eq!(err.stage(), Some("REVIEW_B"));
        assert_eq!(err.code(), ErrorCode::StageFailed);
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("REVIEW_B"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_io_error_is_internal() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.code().as_code(), 9001);
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            AppError::InvalidTopic,
            AppError::EmptyCorpus { dir: "./data".into() },
            AppError::Extraction { path: "a.pdf".into(), message: "bad".into() },
            AppError::stage_failed("RESEARCH", AppError::InvalidTopic),
            AppError::StateViolation { field: "summary" },
            AppError::Fetch { message: "offline".into() },
            AppError::Generation { message: "quota".into() },
            AppError::Internal { message: "io".into() },
            AppError::configuration("bad"),
        ];
        let mut codes: Vec<u16> = errors.iter().map(|e| e.code().as_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_configuration_error() {
        let err = AppError::configuration("overlap too large");
        assert_eq!(err.code(), ErrorCode::ConfigurationError);
        assert_eq!(err.to_string(), "Configuration error: overlap too large");
    }
}
