//! External snippet sources
//!
//! The RESEARCH stage enriches local chunks with short texts from an
//! external reference. A failing source never fails the run; the stage
//! continues with whatever it has.

mod wikipedia;

pub use wikipedia::WikipediaClient;

use async_trait::async_trait;
use researchforge_common::errors::Result;
use researchforge_common::models::Snippet;

/// Fetches up to `max_results` snippets relevant to a query
#[async_trait]
pub trait SnippetSource: Send + Sync {
    async fn fetch_snippets(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>>;

    /// Source name for logs and metrics
    fn name(&self) -> &'static str;
}

/// Serves a fixed list of snippets regardless of the query
#[derive(Debug, Clone, Default)]
pub struct StaticSnippetSource {
    snippets: Vec<Snippet>,
}

impl StaticSnippetSource {
    pub fn new(snippets: Vec<Snippet>) -> Self {
        Self { snippets }
    }

    /// A source that never returns anything
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnippetSource for StaticSnippetSource {
    async fn fetch_snippets(&self, _query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        Ok(self.snippets.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
