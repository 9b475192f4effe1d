/// LLM Client is the single point of entry for all completion calls in the service.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Handlers go through the `CompletionProvider` trait held in `AppState`.
///
/// Model: claude-sonnet-4-5 (hardcoded; do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
pub const MODEL: &str = "claude-sonnet-4-5";

/// Sampling parameters for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("ANTHROPIC_API_KEY is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a failed completion should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credentials missing or rejected.
    Auth,
    /// Provider quota or rate limit hit.
    Quota,
    Other,
}

impl LlmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::MissingApiKey => FailureKind::Auth,
            LlmError::Api { status: 401 | 403, .. } => FailureKind::Auth,
            LlmError::Api { status: 429, .. } => FailureKind::Quota,
            LlmError::Api { message, .. } => classify_message(message),
            LlmError::Http(_) | LlmError::Parse(_) => FailureKind::Other,
        }
    }
}

fn classify_message(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if lower.contains("api key")
        || lower.contains("api-key")
        || lower.contains("api_key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        FailureKind::Auth
    } else if lower.contains("quota") || lower.contains("rate limit") {
        FailureKind::Quota
    } else {
        FailureKind::Other
    }
}

/// A language-model completion capability.
///
/// Carried in `AppState` as `Arc<dyn CompletionProvider>` so the HTTP layer
/// never depends on a concrete vendor.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the text of the first completion, or an empty string when the
    /// provider produced no text content.
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API. One attempt per call: failures are
/// classified and returned, never retried.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        params: SamplingParams,
    ) -> Result<LlmResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let llm_response: LlmResponse = serde_json::from_str(&body)?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        params: SamplingParams,
    ) -> Result<String, LlmError> {
        let response = self.call(prompt, system, params).await?;
        Ok(response.text().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: u16, message: &str) -> LlmError {
        LlmError::Api {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_missing_key_is_auth_failure() {
        assert_eq!(LlmError::MissingApiKey.kind(), FailureKind::Auth);
    }

    #[test]
    fn test_status_codes_classify() {
        assert_eq!(api_error(401, "nope").kind(), FailureKind::Auth);
        assert_eq!(api_error(403, "nope").kind(), FailureKind::Auth);
        assert_eq!(api_error(429, "slow down").kind(), FailureKind::Quota);
        assert_eq!(api_error(500, "boom").kind(), FailureKind::Other);
        assert_eq!(api_error(529, "Overloaded").kind(), FailureKind::Other);
    }

    #[test]
    fn test_messages_classify_when_status_is_ambiguous() {
        assert_eq!(
            api_error(400, "invalid x-api-key").kind(),
            FailureKind::Auth
        );
        assert_eq!(
            api_error(400, "Your credit quota is exhausted").kind(),
            FailureKind::Quota
        );
        assert_eq!(
            api_error(400, "max_tokens: must be positive").kind(),
            FailureKind::Other
        );
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let json = r#"{
            "content": [
                {"type": "thinking", "text": null},
                {"type": "text", "text": "{\"overallScore\": 80}"},
                {"type": "text", "text": "second"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("{\"overallScore\": 80}"));
    }

    #[test]
    fn test_response_without_text_block_is_none() {
        let json = r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), None);
    }

    #[tokio::test]
    async fn test_complete_without_key_fails_before_network() {
        let client = LlmClient::new(None, Duration::from_secs(1)).unwrap();
        let params = SamplingParams {
            temperature: 0.7,
            max_tokens: 10,
        };
        let err = client.complete("system", "prompt", params).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }
}
