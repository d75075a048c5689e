//! Configuration management for ResearchForge
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values
//!
//! The resulting [`AppConfig`] is passed explicitly to the chunker, the
//! ranking index builder and the pipeline; nothing reads it from a global.

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Local document corpus
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Chunking and BM25 ranking
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Research stage settings
    #[serde(default)]
    pub research: ResearchConfig,

    /// Text generation collaborator
    #[serde(default)]
    pub llm: LlmConfig,

    /// Encyclopedia snippet source
    #[serde(default)]
    pub wikipedia: WikipediaConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    /// Directory scanned for source documents
    #[serde(default = "default_corpus_dir")]
    pub dir: PathBuf,

    /// File extensions accepted by the loader (lowercase, no dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by adjacent windows
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Local chunks fed into each research run
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// BM25 term-frequency saturation
    #[serde(default = "default_k1")]
    pub k1: f64,

    /// BM25 length normalization
    #[serde(default = "default_b")]
    pub b: f64,
}

/// Execution order of the two review stages
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOrder {
    /// Both reviews in flight at once, joined before synthesis
    #[default]
    Concurrent,
    /// Review A, then review B
    AThenB,
    /// Review B, then review A
    BThenA,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchConfig {
    /// Per-source truncation limit in characters
    #[serde(default = "default_max_snippet_chars")]
    pub max_snippet_chars: usize,

    /// Encyclopedia articles requested per run
    #[serde(default = "default_max_external_results")]
    pub max_external_results: usize,

    /// How REVIEW_A and REVIEW_B are scheduled
    #[serde(default)]
    pub review_order: ReviewOrder,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Generation provider: openai (any OpenAI-compatible endpoint), echo
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Chat completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// API key (falls back to GROQ_API_KEY / OPENAI_API_KEY)
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Total time spent retrying transport failures (0 disables retries)
    #[serde(default)]
    pub retry_budget_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WikipediaConfig {
    /// MediaWiki API URL
    #[serde(default = "default_wikipedia_api")]
    pub api_url: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_wikipedia_timeout")]
    pub timeout_secs: u64,

    /// Titles requested from the search endpoint
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Pause between article requests
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Total time spent retrying transient failures (0 disables retries)
    #[serde(default = "default_wikipedia_retry_budget")]
    pub retry_budget_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Prometheus listener port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,
}

// Default value functions
fn default_corpus_dir() -> PathBuf { PathBuf::from("files") }
fn default_extensions() -> Vec<String> { vec!["pdf".into(), "txt".into(), "md".into()] }
fn default_chunk_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 200 }
fn default_top_k() -> usize { 4 }
fn default_k1() -> f64 { 1.5 }
fn default_b() -> f64 { 0.75 }
fn default_max_snippet_chars() -> usize { 800 }
fn default_max_external_results() -> usize { 3 }
fn default_llm_provider() -> String { "openai".to_string() }
fn default_llm_endpoint() -> String { "https://api.groq.com/openai/v1/chat/completions".to_string() }
fn default_llm_model() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_llm_max_tokens() -> usize { 1024 }
fn default_llm_timeout() -> u64 { 60 }
fn default_wikipedia_api() -> String { "https://en.wikipedia.org/w/api.php".to_string() }
fn default_user_agent() -> String { format!("ResearchForge/{}", crate::VERSION) }
fn default_wikipedia_timeout() -> u64 { 10 }
fn default_search_limit() -> usize { 10 }
fn default_request_delay() -> u64 { 250 }
fn default_wikipedia_retry_budget() -> u64 { 2000 }
fn default_log_level() -> String { "info".to_string() }

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: default_corpus_dir(),
            extensions: default_extensions(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            k1: default_k1(),
            b: default_b(),
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_snippet_chars: default_max_snippet_chars(),
            max_external_results: default_max_external_results(),
            review_order: ReviewOrder::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_llm_timeout(),
            retry_budget_ms: 0,
        }
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: default_wikipedia_api(),
            user_agent: default_user_agent(),
            timeout_secs: default_wikipedia_timeout(),
            search_limit: default_search_limit(),
            request_delay_ms: default_request_delay(),
            retry_budget_ms: default_wikipedia_retry_budget(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            metrics_port: 0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            retrieval: RetrievalConfig::default(),
            research: ResearchConfig::default(),
            llm: LlmConfig::default(),
            wikipedia: WikipediaConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__RETRIEVAL__TOP_K=6
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        Self::finish(config)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let mut app: AppConfig = config.try_deserialize()?;
        if app.llm.api_key.is_none() {
            app.llm.api_key = std::env::var("GROQ_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        app.validate()?;
        Ok(app)
    }

    /// Reject settings that would make chunking or ranking ill-defined
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.chunk_size == 0 {
            return Err(AppError::configuration("retrieval.chunk_size must be greater than zero"));
        }
        if r.chunk_overlap >= r.chunk_size {
            return Err(AppError::configuration(format!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_size ({})",
                r.chunk_overlap, r.chunk_size
            )));
        }
        if r.top_k == 0 {
            return Err(AppError::configuration("retrieval.top_k must be greater than zero"));
        }
        if !r.k1.is_finite() || r.k1 < 0.0 {
            return Err(AppError::configuration("retrieval.k1 must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&r.b) {
            return Err(AppError::configuration("retrieval.b must lie in [0, 1]"));
        }
        if self.research.max_snippet_chars == 0 {
            return Err(AppError::configuration("research.max_snippet_chars must be greater than zero"));
        }
        Ok(())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
