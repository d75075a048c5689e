//! Retrieval units shared across crates

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding the stable chunk identifier
pub const META_CHUNK_ID: &str = "chunk_id";

/// Metadata key holding the originating document
pub const META_SOURCE: &str = "source";

/// A provenance-tagged window of a source document.
///
/// Chunks are created in bulk during corpus load and never mutated
/// afterwards; the ranking index that indexed them owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the indexed collection (insertion order)
    pub id: usize,

    /// Window content
    pub text: String,

    /// Document identifier (file name for local documents)
    pub source: String,

    /// Start of the window in the source, in characters
    pub offset: usize,

    /// Free-form provenance
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    pub fn new(id: usize, text: impl Into<String>, source: impl Into<String>, offset: usize) -> Self {
        Self {
            id,
            text: text.into(),
            source: source.into(),
            offset,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Length of the window in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// One past the last character covered by this window
    pub fn end(&self) -> usize {
        self.offset + self.char_len()
    }

    /// Stable identifier, falling back to `{source}#{id}`
    pub fn chunk_id(&self) -> String {
        self.metadata
            .get(META_CHUNK_ID)
            .cloned()
            .unwrap_or_else(|| format!("{}#{}", self.source, self.id))
    }
}

/// A short externally fetched text unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub content: String,
    pub source_url: String,
}

impl Snippet {
    pub fn new(title: impl Into<String>, content: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source_url: source_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_bounds_use_characters() {
        let chunk = Chunk::new(0, "héllo", "doc.txt", 3);
        assert_eq!(chunk.char_len(), 5);
        assert_eq!(chunk.end(), 8);
    }

    #[test]
    fn test_chunk_id_prefers_metadata() {
        let plain = Chunk::new(2, "x", "a.pdf", 0);
        assert_eq!(plain.chunk_id(), "a.pdf#2");

        let tagged = plain.with_meta(META_CHUNK_ID, "a.pdf__chunk0");
        assert_eq!(tagged.chunk_id(), "a.pdf__chunk0");
    }
}
