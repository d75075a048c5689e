//! Text chunking module
//!
//! Splits document text into overlapping fixed-size windows measured in
//! characters (Unicode scalar values). Window `n` starts at character
//! `n * (chunk_size - chunk_overlap)`; the last window may be shorter and
//! is always emitted.

use researchforge_common::config::RetrievalConfig;
use researchforge_common::models::{Chunk, META_CHUNK_ID, META_SOURCE};
use researchforge_common::{AppError, Result};
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Window size in characters
    chunk_size: usize,
    /// Characters shared by adjacent windows
    chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Validate and build a chunking configuration
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::configuration("chunk size must be greater than zero"));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::configuration(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_retrieval(config: &RetrievalConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance between consecutive window starts
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Splits documents into provenance-tagged chunks
#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split `text` into windows tagged with `source_id`.
    ///
    /// Chunk ids are local to the document (0-based). An empty document
    /// yields no chunks.
    pub fn chunk(&self, text: &str, source_id: &str) -> Vec<Chunk> {
        // Byte position of every character plus the end of the text
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = bounds.len() - 1;

        let mut chunks = Vec::new();
        if total_chars == 0 {
            return chunks;
        }

        let stride = self.config.stride();
        let mut start = 0;

        loop {
            let end = (start + self.config.chunk_size).min(total_chars);
            let index = chunks.len();

            let chunk = Chunk::new(index, &text[bounds[start]..bounds[end]], source_id, start)
                .with_meta(META_SOURCE, source_id)
                .with_meta(META_CHUNK_ID, format!("{source_id}__chunk{index}"))
                .with_meta("char_start", start.to_string())
                .with_meta("char_end", end.to_string());
            chunks.push(chunk);

            if end == total_chars {
                break;
            }
            start += stride;
        }

        debug!(
            source = source_id,
            char_len = total_chars,
            chunk_count = chunks.len(),
            chunk_size = self.config.chunk_size,
            chunk_overlap = self.config.chunk_overlap,
            "Text chunked"
        );

        chunks
    }
}

/// Chunk a single document, validating the window parameters first
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize, source_id: &str) -> Result<Vec<Chunk>> {
    let config = ChunkingConfig::new(chunk_size, chunk_overlap)?;
    Ok(Chunker::new(config).chunk(text, source_id))
}
