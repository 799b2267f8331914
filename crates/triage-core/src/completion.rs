//! Completion service client
//!
//! The classifier, guardrails, and agent handlers reach the language model
//! through the [`CompletionClient`] trait. [`OpenAiCompletionClient`] speaks
//! the OpenAI chat completions format, which most hosted providers (including
//! Gemini's OpenAI-compatible endpoint) accept:
//! ```text
//! POST {api_base}/chat/completions
//! {"model": "...", "messages": [{"role": "system", "content": "..."}, ...]}
//! ```

use crate::error::{Error, Result};
use crate::types::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Text-completion capability consumed by the pipeline
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a conversation and return the assistant's text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Convenience for a single system + user exchange
    async fn complete_with_instructions(&self, instructions: &str, input: &str) -> Result<String> {
        let messages = [ChatMessage::system(instructions), ChatMessage::user(input)];
        self.complete(&messages).await
    }
}

/// Process-wide completion settings, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key, if one is configured
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CompletionConfig {
    /// Build settings from environment variables
    ///
    /// `TRIAGE_*` variables take precedence over the `OPENAI_*` ones.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        };

        Self {
            api_base: first(&["TRIAGE_API_BASE", "OPENAI_API_BASE"])
                .unwrap_or_else(default_api_base),
            api_key: first(&["TRIAGE_API_KEY", "OPENAI_API_KEY"]),
            model: first(&["TRIAGE_MODEL"]).unwrap_or_else(default_model),
            timeout_secs: first(&["TRIAGE_TIMEOUT_SECS"])
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout_secs),
        }
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// HTTP client for OpenAI-compatible chat completion endpoints
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiCompletionClient {
    /// Create a client from the process configuration
    ///
    /// Fails with a configuration error when no API key is set.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("API key not set (TRIAGE_API_KEY or OPENAI_API_KEY)"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
        };

        debug!(model = %self.model, messages = messages.len(), "Calling completion service");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!(
                "completion API error {}: {}",
                status, error_text
            )));
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::upstream("completion response contained no content"))
    }
}

/// Extract the JSON object embedded in a model answer
///
/// Models often wrap structured output in markdown code fences or add a
/// sentence around it. Returns the outermost `{...}` span, or the trimmed
/// input when no braces are present.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

// =============================================================================
// Wire structures
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_prefers_triage_vars() {
        let env: HashMap<&str, &str> = [
            ("TRIAGE_API_KEY", "triage-key"),
            ("OPENAI_API_KEY", "openai-key"),
            ("OPENAI_API_BASE", "https://generativelanguage.googleapis.com/v1beta/openai"),
        ]
        .into_iter()
        .collect();

        let config = CompletionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("triage-key"));
        assert_eq!(
            config.api_base,
            "https://generativelanguage.googleapis.com/v1beta/openai"
        );
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = CompletionConfig::from_lookup(|k| {
            (k == "OPENAI_API_KEY").then(|| "   ".to_string())
        });
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_client_requires_key() {
        let err = OpenAiCompletionClient::new(&CompletionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = CompletionConfig::default()
            .with_api_base("http://localhost:8080/v1/")
            .with_api_key("k");
        let client = OpenAiCompletionClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_parse_completion_response() {
        let json = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"George Washington"},"finish_reason":"stop"}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("George Washington")
        );
    }

    #[test]
    fn test_extract_json_from_fence() {
        let answer = "```json\n{\"label\": \"math\"}\n```";
        assert_eq!(extract_json(answer), "{\"label\": \"math\"}");
        assert_eq!(extract_json("  plain  "), "plain");
    }
}
