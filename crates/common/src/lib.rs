//! ResearchForge Common Library
//!
//! Shared code for all ResearchForge crates including:
//! - Configuration management
//! - Error types and handling
//! - Retrieval data model (chunks and snippets)
//! - Text normalization and truncation
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod text;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, ErrorCode, Result};
pub use models::{Chunk, Snippet};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
