//! Text generation collaborators
//!
//! Every stage talks to a [`Generator`]: one prompt in, one completion out.
//! [`OpenAiGenerator`] speaks the OpenAI chat-completions protocol, which
//! Groq and most hosted model APIs also accept. [`EchoGenerator`] answers
//! offline and deterministically.

use crate::retry::{is_transient_status, with_retry, Attempt};
use async_trait::async_trait;
use researchforge_common::config::LlmConfig;
use researchforge_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Produces a completion for a prompt
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier for logs
    fn model_name(&self) -> &str;
}

const SYSTEM_PROMPT: &str = "You are a helpful research assistant.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Client for OpenAI-compatible chat-completions endpoints
pub struct OpenAiGenerator {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::configuration(
                    "llm.api_key is required for the openai provider (or set GROQ_API_KEY / OPENAI_API_KEY)",
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { config, api_key, client })
    }

    async fn complete_once(&self, prompt: &str) -> Attempt<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            backoff::Error::permanent(AppError::Generation {
                message: format!("Failed to parse completion: {}", e),
            })
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                backoff::Error::permanent(AppError::Generation {
                    message: "Empty completion".to_string(),
                })
            })
    }

    fn transport_error(&self, e: reqwest::Error) -> backoff::Error<AppError> {
        if e.is_timeout() {
            return backoff::Error::transient(AppError::Generation {
                message: format!("Request timed out after {}s", self.config.timeout_secs),
            });
        }
        if e.is_connect() {
            return backoff::Error::transient(AppError::Generation {
                message: format!("Connection failed: {}", e),
            });
        }
        backoff::Error::permanent(AppError::Generation {
            message: format!("Request failed: {}", e),
        })
    }
}

/// Map a non-success response onto a typed generation error
fn status_error(status: reqwest::StatusCode, body: &str) -> backoff::Error<AppError> {
    let code = status.as_u16();
    let message = match code {
        401 | 403 => format!("Authentication rejected ({})", code),
        429 => format!("Quota exceeded (429): {}", body.trim()),
        _ => format!("API error {}: {}", status, body.trim()),
    };
    let err = AppError::Generation { message };

    if is_transient_status(status) {
        backoff::Error::transient(err)
    } else {
        backoff::Error::permanent(err)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let result = with_retry(self.config.retry_budget_ms, || self.complete_once(prompt)).await;

        match &result {
            Ok(text) => debug!(completion_chars = text.len(), "Completion received"),
            Err(e) => warn!(error = %e, "Completion failed"),
        }
        result
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Offline generator: answers with the first non-blank line of the prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let instruction = prompt
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("empty prompt");
        Ok(format!("[echo] {}", instruction))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Build the generator named by `llm.provider`
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.to_lowercase().as_str() {
        "openai" | "groq" => Ok(Arc::new(OpenAiGenerator::new(config.clone())?)),
        "echo" => Ok(Arc::new(EchoGenerator)),
        other => Err(AppError::configuration(format!(
            "Unknown llm.provider '{}' (expected openai or echo)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn message_of(err: backoff::Error<AppError>) -> (bool, String) {
        match err {
            backoff::Error::Permanent(e) => (false, e.to_string()),
            backoff::Error::Transient { err, .. } => (true, err.to_string()),
        }
    }

    #[tokio::test]
    async fn test_echo_returns_instruction_line() {
        let out = EchoGenerator
            .generate("\n  You are Reviewer A.\nSummary: ...")
            .await
            .unwrap();
        assert_eq!(out, "[echo] You are Reviewer A.");
        assert_eq!(EchoGenerator.model_name(), "echo");
    }

    #[tokio::test]
    async fn test_echo_on_blank_prompt() {
        let out = EchoGenerator.generate("   ").await.unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn test_auth_errors_are_permanent() {
        let (transient, msg) = message_of(status_error(StatusCode::UNAUTHORIZED, "bad key"));
        assert!(!transient);
        assert!(msg.contains("Authentication rejected (401)"));

        let (transient, _) = message_of(status_error(StatusCode::FORBIDDEN, ""));
        assert!(!transient);
    }

    #[test]
    fn test_quota_error_is_transient() {
        let (transient, msg) = message_of(status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"));
        assert!(transient);
        assert!(msg.contains("Quota exceeded"));
        assert!(msg.contains("slow down"));
    }

    #[tokio::test]
    async fn test_malformed_request_is_generation_error() {
        let config = LlmConfig {
            api_key: Some("test-key".into()),
            endpoint: "not a url".into(),
            retry_budget_ms: 0,
            ..LlmConfig::default()
        };
        let generator = OpenAiGenerator::new(config).unwrap();

        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, AppError::Generation { .. }));
        assert!(err.to_string().contains("Request failed"));
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = LlmConfig {
            api_key: None,
            ..LlmConfig::default()
        };
        let err = OpenAiGenerator::new(config).err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_create_generator_by_provider() {
        let echo = LlmConfig {
            provider: "echo".into(),
            ..LlmConfig::default()
        };
        assert_eq!(create_generator(&echo).unwrap().model_name(), "echo");

        let keyed = LlmConfig {
            api_key: Some("test-key".into()),
            ..LlmConfig::default()
        };
        assert_eq!(create_generator(&keyed).unwrap().model_name(), "llama-3.3-70b-versatile");

        let unknown = LlmConfig {
            provider: "carrier-pigeon".into(),
            ..LlmConfig::default()
        };
        assert!(create_generator(&unknown).is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 16,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 16);
    }
}
