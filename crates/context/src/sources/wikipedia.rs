//! Wikipedia snippet source
//!
//! Two MediaWiki calls per run: `opensearch` resolves the cleaned topic to
//! article titles and URLs, then `prop=extracts` fetches each article's
//! plain-text introduction. Articles are fetched one at a time with a short
//! pause in between; one article failing only drops that article.

use super::SnippetSource;
use crate::retry::{is_transient_status, with_retry, Attempt};
use async_trait::async_trait;
use researchforge_common::config::WikipediaConfig;
use researchforge_common::errors::{AppError, Result};
use researchforge_common::models::Snippet;
use researchforge_common::text::clean_query_for_wiki;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// `opensearch` answers `[query, titles, descriptions, urls]`
#[derive(Debug, Deserialize)]
struct OpenSearchResponse(String, Vec<String>, Vec<String>, Vec<String>);

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
}

/// Client for the MediaWiki action API
pub struct WikipediaClient {
    config: WikipediaConfig,
    client: reqwest::Client,
}

impl WikipediaClient {
    pub fn new(config: WikipediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }

    /// Article `(title, url)` pairs for a cleaned query
    async fn search(&self, query: &str) -> Result<Vec<(String, String)>> {
        let limit = self.config.search_limit.to_string();
        let params = [
            ("action", "opensearch"),
            ("search", query),
            ("limit", limit.as_str()),
            ("namespace", "0"),
            ("format", "json"),
        ];

        let response: OpenSearchResponse = self.get_json(&params).await?;
        Ok(pair_titles(response))
    }

    /// Plain-text introduction of one article, `None` when it has none
    async fn fetch_extract(&self, title: &str) -> Result<Option<String>> {
        let params = [
            ("action", "query"),
            ("prop", "extracts"),
            ("explaintext", "1"),
            ("exintro", "1"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
            ("formatversion", "2"),
        ];

        let response: ExtractResponse = self.get_json(&params).await?;
        Ok(first_extract(response))
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        with_retry(self.config.retry_budget_ms, || self.get_json_once(params)).await
    }

    async fn get_json_once<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Attempt<T> {
        let response = self
            .client
            .get(&self.config.api_url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                let err = AppError::Fetch {
                    message: format!("Wikipedia request failed: {}", e),
                };
                if e.is_timeout() || e.is_connect() {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = AppError::Fetch {
                message: format!("Wikipedia API error {}", status),
            };
            return Err(if is_transient_status(status) {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            });
        }

        response.json::<T>().await.map_err(|e| {
            backoff::Error::permanent(AppError::Fetch {
                message: format!("Unexpected Wikipedia response: {}", e),
            })
        })
    }
}

fn pair_titles(response: OpenSearchResponse) -> Vec<(String, String)> {
    let OpenSearchResponse(_, titles, _, urls) = response;
    titles.into_iter().zip(urls).collect()
}

fn first_extract(response: ExtractResponse) -> Option<String> {
    response
        .query?
        .pages
        .into_iter()
        .filter(|p| !p.missing)
        .find_map(|p| p.extract)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

#[async_trait]
impl SnippetSource for WikipediaClient {
    #[instrument(skip(self), fields(source = "wikipedia"))]
    async fn fetch_snippets(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>> {
        let cleaned = clean_query_for_wiki(query);
        if cleaned.is_empty() || max_results == 0 {
            debug!("Nothing to search for");
            return Ok(Vec::new());
        }

        let articles = self.search(&cleaned).await?;
        let delay = Duration::from_millis(self.config.request_delay_ms);
        let mut snippets = Vec::new();

        for (title, url) in articles.into_iter().take(max_results) {
            if !snippets.is_empty() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.fetch_extract(&title).await {
                Ok(Some(text)) => snippets.push(Snippet::new(title, text, url)),
                Ok(None) => debug!(title = %title, "Article has no extract, skipping"),
                Err(e) => warn!(title = %title, error = %e, "Failed to fetch article, skipping"),
            }
        }

        info!(query = %cleaned, snippets = snippets.len(), "Wikipedia snippets fetched");
        Ok(snippets)
    }

    fn name(&self) -> &'static str {
        "wikipedia"
    }
}
