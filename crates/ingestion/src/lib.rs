//! ResearchForge Ingestion
//!
//! Turns a directory of source documents into retrieval chunks:
//! 1. Extracts text (PDF via lopdf, plain text directly)
//! 2. Splits it into overlapping character windows
//! 3. Assigns global chunk ids in load order

pub mod chunker;
pub mod errors;
pub mod loader;
pub mod pdf;

pub use chunker::{chunk_text, Chunker, ChunkingConfig};
pub use errors::IngestionError;
pub use loader::{CorpusLoader, LoadReport, SkippedDocument};
pub use pdf::{extract_text_from_pdf, FileExtractor, TextExtractor};
