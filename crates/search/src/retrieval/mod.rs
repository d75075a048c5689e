//! Lexical retrieval over the local corpus
//!
//! Provides:
//! - BM25 ranking index built once over a frozen chunk collection
//! - A `Retriever` seam the research pipeline queries through

mod bm25;

pub use bm25::{Bm25Index, Bm25Params, ScoredChunk, DEFAULT_B, DEFAULT_K1};

use researchforge_common::errors::Result;
use researchforge_common::models::Chunk;
use serde::{Deserialize, Serialize};

/// Retrieved chunk with relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Owned copy of the indexed chunk
    pub chunk: Chunk,

    /// Raw BM25 score (unbounded, non-negative)
    pub score: f64,
}

/// Common trait for all retrievers
///
/// Implementations are read-only after construction and safe to query
/// from concurrent research runs.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve at most `limit` chunks for `query`, best first
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedChunk>>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
