//! In-memory BM25 ranking over a frozen chunk collection
//!
//! For query terms `Q` (deduplicated) and chunk `d`:
//!
//! ```text
//! score(d, Q) = Σ IDF(t) · f(t,d)·(k1+1) / (f(t,d) + k1·(1 − b + b·|d|/avgdl))
//! IDF(t)      = ln((N − df(t) + 0.5) / (df(t) + 0.5) + 1)
//! ```
//!
//! with `k1 = 1.5`, `b = 0.75` by default. Document length `|d|` is the
//! token count of the chunk. Equal scores rank by insertion order.
//!
//! The index is immutable once built. Any corpus change means building a
//! new index.

use super::{RetrievedChunk, Retriever};
use researchforge_common::config::RetrievalConfig;
use researchforge_common::errors::Result;
use researchforge_common::metrics;
use researchforge_common::models::Chunk;
use researchforge_common::text::tokenize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info};

/// Default term-frequency saturation
pub const DEFAULT_K1: f64 = 1.5;

/// Default length normalization
pub const DEFAULT_B: f64 = 0.75;

/// BM25 scoring constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
        }
    }
}

impl From<&RetrievalConfig> for Bm25Params {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
        }
    }
}

/// Occurrence of a term in one chunk
#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: usize,
    tf: u32,
}

/// A chunk paired with its relevance score
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f64,
}

/// BM25 index over a fixed chunk collection
#[derive(Debug)]
pub struct Bm25Index {
    chunks: Vec<Chunk>,
    doc_lens: Vec<usize>,
    postings: HashMap<String, Vec<Posting>>,
    avg_len: f64,
    params: Bm25Params,
}

impl Bm25Index {
    /// Build with the default constants
    pub fn build(chunks: Vec<Chunk>) -> Self {
        Self::with_params(chunks, Bm25Params::default())
    }

    /// Build the index in one pass over all terms
    pub fn with_params(chunks: Vec<Chunk>, params: Bm25Params) -> Self {
        let started = Instant::now();
        let mut doc_lens = Vec::with_capacity(chunks.len());
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut total_len = 0usize;

        for (doc, chunk) in chunks.iter().enumerate() {
            let tokens = tokenize(&chunk.text);
            doc_lens.push(tokens.len());
            total_len += tokens.len();

            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_insert(0) += 1;
            }
            for (term, count) in tf {
                postings.entry(term).or_default().push(Posting { doc, tf: count });
            }
        }

        let avg_len = if chunks.is_empty() {
            0.0
        } else {
            total_len as f64 / chunks.len() as f64
        };

        info!(
            chunks = chunks.len(),
            terms = postings.len(),
            avg_len,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "BM25 index built"
        );

        Self {
            chunks,
            doc_lens,
            postings,
            avg_len,
            params,
        }
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Average chunk length in tokens
    pub fn avg_len(&self) -> f64 {
        self.avg_len
    }

    /// Indexed chunks in insertion order
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of chunks containing `term` (already normalized)
    pub fn doc_freq(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    /// Inverse document frequency of a normalized term
    pub fn idf(&self, term: &str) -> f64 {
        let n = self.chunks.len() as f64;
        let df = self.doc_freq(term) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Top `k` chunks for `text`, best first
    pub fn query(&self, text: &str, k: usize) -> Vec<&Chunk> {
        self.search(text, k).into_iter().map(|s| s.chunk).collect()
    }

    /// Top `k` chunks with their scores, best first.
    ///
    /// Every chunk takes part in the ranking, so when `k` exceeds the
    /// collection size all chunks come back. A query without index terms
    /// returns nothing.
    pub fn search(&self, text: &str, k: usize) -> Vec<ScoredChunk<'_>> {
        if self.chunks.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let terms: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let scores = self.score_all(&terms);

        let mut ranked: Vec<usize> = (0..self.chunks.len()).collect();
        ranked.sort_by(|&a, &b| match scores[b].total_cmp(&scores[a]) {
            Ordering::Equal => a.cmp(&b),
            other => other,
        });
        ranked.truncate(k);

        debug!(terms = terms.len(), returned = ranked.len(), "BM25 query scored");

        ranked
            .into_iter()
            .map(|doc| ScoredChunk {
                chunk: &self.chunks[doc],
                score: scores[doc],
            })
            .collect()
    }

    /// Accumulate per-chunk scores over the postings of `terms`
    fn score_all(&self, terms: &[String]) -> Vec<f64> {
        let Bm25Params { k1, b } = self.params;
        let mut scores = vec![0.0; self.chunks.len()];

        for term in terms {
            // Terms absent from the corpus contribute nothing
            let Some(postings) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(term);

            for posting in postings {
                let tf = posting.tf as f64;
                let len_ratio = if self.avg_len > 0.0 {
                    self.doc_lens[posting.doc] as f64 / self.avg_len
                } else {
                    1.0
                };
                let norm = k1 * (1.0 - b + b * len_ratio);
                scores[posting.doc] += idf * (tf * (k1 + 1.0)) / (tf + norm);
            }
        }

        scores
    }
}

#[async_trait::async_trait]
impl Retriever for Bm25Index {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedChunk>> {
        let started = Instant::now();

        let results: Vec<RetrievedChunk> = self
            .search(query, limit)
            .into_iter()
            .map(|s| RetrievedChunk {
                chunk: s.chunk.clone(),
                score: s.score,
            })
            .collect();

        metrics::record_retrieval(started.elapsed().as_secs_f64(), results.len());
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "bm25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> Bm25Index {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, *t, format!("doc{i}"), 0))
            .collect();
        Bm25Index::build(chunks)
    }

    #[test]
    fn test_cat_mat_scenario() {
        let index = corpus(&["the cat sat on the mat", "dogs bark at the moon"]);
        let hits = index.query("cat mat", 1);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "the cat sat on the mat");
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = Bm25Index::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.query("anything", 5).is_empty());
    }

    #[test]
    fn test_at_most_k_and_non_increasing() {
        let index = corpus(&[
            "rust ownership and borrowing",
            "borrowing rules in rust",
            "python garbage collection",
            "rust rust rust",
            "memory safety without garbage collection",
        ]);

        let hits = index.search("rust borrowing", 3);
        assert_eq!(hits.len(), 3);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_k_larger_than_corpus_returns_all() {
        let index = corpus(&["alpha beta", "gamma", "delta alpha"]);
        let hits = index.query("alpha", 10);
        assert_eq!(hits.len(), 3);
        // zero-scored chunk ranks last
        assert_eq!(hits[2].text, "gamma");
    }

    #[test]
    fn test_unknown_term_contributes_zero() {
        let index = corpus(&["the cat sat on the mat", "dogs bark at the moon", "a cat and a dog"]);

        let base = index.search("cat", 3);
        let padded = index.search("cat zyzzyva", 3);

        assert_eq!(base.len(), padded.len());
        for (a, b) in base.iter().zip(&padded) {
            assert_eq!(a.chunk.id, b.chunk.id);
            assert_eq!(a.score, b.score);
        }

        let only_unknown = index.search("zyzzyva", 3);
        assert!(only_unknown.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let index = corpus(&["same words here", "other text", "same words here", "same words here"]);
        let ids: Vec<usize> = index.query("same words", 4).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_repeated_queries_are_identical() {
        let index = corpus(&["a b c", "b c d", "c d e", "d e f", "b b b"]);
        let first: Vec<(usize, f64)> = index.search("b d", 5).iter().map(|s| (s.chunk.id, s.score)).collect();
        for _ in 0..10 {
            let again: Vec<(usize, f64)> = index.search("b d", 5).iter().map(|s| (s.chunk.id, s.score)).collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_duplicate_query_terms_count_once() {
        let index = corpus(&["cat", "dog"]);
        let once = index.search("cat", 1)[0].score;
        let twice = index.search("cat cat CAT", 1)[0].score;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_score_matches_formula() {
        // doc0: "cat cat dog" (len 3), doc1: "dog" (len 1); avgdl = 2
        let index = corpus(&["cat cat dog", "dog"]);
        let hit = index.search("cat", 1)[0];

        let (n, df, tf, len, avgdl) = (2.0_f64, 1.0_f64, 2.0_f64, 3.0_f64, 2.0_f64);
        let (k1, b) = (DEFAULT_K1, DEFAULT_B);
        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
        let expected = idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * len / avgdl));

        assert_eq!(hit.chunk.id, 0);
        assert!((hit.score - expected).abs() < 1e-12);
        assert!((index.idf("cat") - idf).abs() < 1e-12);
    }

    #[test]
    fn test_query_without_terms() {
        let index = corpus(&["some text"]);
        assert!(index.query("   ?! ", 3).is_empty());
    }

    #[test]
    fn test_retriever_trait_clones_results() {
        let index = corpus(&["the cat sat on the mat", "dogs bark at the moon"]);
        let results = tokio_test::block_on(index.retrieve("moon", 1)).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source, "doc1");
        assert!(results[0].score > 0.0);
        assert_eq!(index.name(), "bm25");
    }
}
