//! Corpus loader
//!
//! Core logic for turning a directory of documents into chunks: text
//! extraction, chunking, and global id assignment. A document that fails
//! to extract is logged and skipped; it never aborts the load.

use crate::chunker::Chunker;
use crate::errors::IngestionError;
use crate::pdf::{FileExtractor, TextExtractor};
use researchforge_common::config::CorpusConfig;
use researchforge_common::models::Chunk;
use researchforge_common::{metrics, AppError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A document left out of the corpus
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a corpus load
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Chunks in insertion order; `id` is the position in this vector
    pub chunks: Vec<Chunk>,
    /// Source ids of documents that produced chunks
    pub documents: Vec<String>,
    /// Documents that failed extraction
    pub skipped: Vec<SkippedDocument>,
}

impl LoadReport {
    /// `EmptyCorpus` when nothing was chunked
    pub fn require_chunks(&self, dir: &Path) -> Result<(), AppError> {
        if self.chunks.is_empty() {
            return Err(AppError::EmptyCorpus {
                dir: dir.display().to_string(),
            });
        }
        Ok(())
    }

    fn push_document(&mut self, source: String, chunks: Vec<Chunk>) {
        let base = self.chunks.len();
        self.chunks.extend(chunks.into_iter().enumerate().map(|(i, mut chunk)| {
            chunk.id = base + i;
            chunk
        }));
        self.documents.push(source);
    }
}

/// Loads and chunks a document corpus
pub struct CorpusLoader {
    chunker: Chunker,
    extractor: Arc<dyn TextExtractor>,
    extensions: Vec<String>,
}

impl CorpusLoader {
    pub fn new(chunker: Chunker, config: &CorpusConfig) -> Self {
        Self::with_extractor(chunker, config, Arc::new(FileExtractor))
    }

    pub fn with_extractor(chunker: Chunker, config: &CorpusConfig, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            chunker,
            extractor,
            extensions: config.extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Load every matching document in `dir`, sorted by file name
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn load(&self, dir: &Path) -> LoadReport {
        let mut report = LoadReport::default();
        let chunking = self.chunker.config();
        info!(
            chunk_size = chunking.chunk_size(),
            chunk_overlap = chunking.chunk_overlap(),
            "Loading corpus"
        );

        let paths = match self.list_documents(dir) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(error = %e, "Corpus directory unreadable, continuing with an empty corpus");
                return report;
            }
        };

        if paths.is_empty() {
            warn!("No documents found in corpus directory");
        }

        for path in paths {
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            match self.extractor.extract_text(&path) {
                Ok(text) => {
                    let chunks = self.chunker.chunk(&text, &source);
                    info!(source = %source, chunk_count = chunks.len(), "Document chunked");
                    report.push_document(source, chunks);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load document, skipping");
                    report.skipped.push(SkippedDocument {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        metrics::record_corpus_load(report.documents.len(), report.skipped.len(), report.chunks.len());

        info!(
            documents = report.documents.len(),
            skipped = report.skipped.len(),
            chunks = report.chunks.len(),
            "Corpus load complete"
        );

        report
    }

    /// Chunk in-memory documents given as `(source_id, text)` pairs
    pub fn load_texts<I, S, T>(&self, documents: I) -> LoadReport
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: AsRef<str>,
    {
        let mut report = LoadReport::default();
        for (source, text) in documents {
            let source = source.into();
            let chunks = self.chunker.chunk(text.as_ref(), &source);
            report.push_document(source, chunks);
        }
        report
    }

    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>, IngestionError> {
        if !dir.is_dir() {
            return Err(IngestionError::FileNotFound(dir.display().to_string()));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let accepted = path.is_file()
                && path
                    .extension()
                    .map(|e| self.extensions.contains(&e.to_string_lossy().to_lowercase()))
                    .unwrap_or(false);
            if accepted {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }
}
