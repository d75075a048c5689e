//! ResearchForge Search
//!
//! Statistical relevance ranking over the local document corpus.

pub mod retrieval;

pub use retrieval::{Bm25Index, Bm25Params, RetrievedChunk, Retriever, ScoredChunk};
