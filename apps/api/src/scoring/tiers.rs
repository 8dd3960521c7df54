//! Inference tier clients — the ordered fallback chain's individual rungs.
//!
//! ARCHITECTURAL RULE: no other module may call an inference provider
//! directly. Tiers only transport prompts and raw text; retry and fallback
//! policy live in the orchestrator.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::scoring::prompts::StructuredPrompt;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Error)]
pub enum TierError {
    /// Timeout, connection failure, 429 or 5xx — worth retrying on the
    /// same tier.
    #[error("transient provider error (status {status:?}): {message}")]
    Transient { status: Option<u16>, message: String },

    /// Definitive provider rejection (4xx other than 429) — fails the tier
    /// without retry.
    #[error("provider error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The tier has no credentials; skipped without consuming retry budget.
    #[error("provider is not configured")]
    Unconfigured,
}

/// One rung of the fallback chain: cheap/fast tiers first, premium last.
/// Injected into the orchestrator at construction so tiers can be added,
/// removed, or reordered without touching its logic.
#[async_trait]
pub trait InferenceTier: Send + Sync {
    /// Stable identifier recorded in `producedBy`.
    fn id(&self) -> &str;

    /// False when credentials are absent; the orchestrator skips the tier
    /// outright.
    fn configured(&self) -> bool;

    async fn invoke(&self, prompt: &StructuredPrompt) -> Result<String, TierError>;
}

fn classify_status(status: u16, message: String) -> TierError {
    if status == 429 || status >= 500 {
        TierError::Transient {
            status: Some(status),
            message,
        }
    } else {
        TierError::Api { status, message }
    }
}

fn transport_error(e: reqwest::Error) -> TierError {
    TierError::Transient {
        status: None,
        message: e.to_string(),
    }
}

fn build_http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

// ── Anthropic (messages API) ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Premium tier talking to the Anthropic messages API.
pub struct AnthropicTier {
    id: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    limiter: Arc<Semaphore>,
}

impl AnthropicTier {
    pub fn new(id: &str, model: &str, api_key: Option<String>, limiter: Arc<Semaphore>) -> Self {
        Self {
            id: id.to_string(),
            model: model.to_string(),
            api_key,
            client: build_http_client(),
            limiter,
        }
    }
}

#[async_trait]
impl InferenceTier for AnthropicTier {
    fn id(&self) -> &str {
        &self.id
    }

    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(&self, prompt: &StructuredPrompt) -> Result<String, TierError> {
        let api_key = self.api_key.as_deref().ok_or(TierError::Unconfigured)?;
        let _permit = self.limiter.acquire().await.map_err(|e| TierError::Transient {
            status: None,
            message: e.to_string(),
        })?;

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: &prompt.system,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt.user,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), message));
        }

        let parsed: AnthropicResponse = response.json().await.map_err(transport_error)?;
        parsed
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.clone())
            .ok_or(TierError::Api {
                status: status.as_u16(),
                message: "response contained no text block".to_string(),
            })
    }
}

// ── OpenAI (chat completions API) ───────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

/// Cheap first tier talking to the OpenAI chat-completions API.
pub struct OpenAiTier {
    id: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    limiter: Arc<Semaphore>,
}

impl OpenAiTier {
    pub fn new(id: &str, model: &str, api_key: Option<String>, limiter: Arc<Semaphore>) -> Self {
        Self {
            id: id.to_string(),
            model: model.to_string(),
            api_key,
            client: build_http_client(),
            limiter,
        }
    }
}

#[async_trait]
impl InferenceTier for OpenAiTier {
    fn id(&self) -> &str {
        &self.id
    }

    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(&self, prompt: &StructuredPrompt) -> Result<String, TierError> {
        let api_key = self.api_key.as_deref().ok_or(TierError::Unconfigured)?;
        let _permit = self.limiter.acquire().await.map_err(|e| TierError::Transient {
            status: None,
            message: e.to_string(),
        })?;

        let body = OpenAiRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), message));
        }

        let parsed: OpenAiResponse = response.json().await.map_err(transport_error)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(TierError::Api {
                status: status.as_u16(),
                message: "response contained no choices".to_string(),
            })
    }
}

// ── Test support ────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_transient() {
        assert!(matches!(
            classify_status(429, String::new()),
            TierError::Transient {
                status: Some(429),
                ..
            }
        ));
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(matches!(
            classify_status(503, String::new()),
            TierError::Transient { .. }
        ));
    }

    #[test]
    fn test_client_errors_are_definitive() {
        assert!(matches!(
            classify_status(400, String::new()),
            TierError::Api { status: 400, .. }
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_tier_refuses_invoke() {
        let tier = AnthropicTier::new(
            "anthropic",
            "claude-sonnet-4-5",
            None,
            Arc::new(Semaphore::new(1)),
        );
        assert!(!tier.configured());
        let prompt = StructuredPrompt {
            system: String::new(),
            user: String::new(),
        };
        assert!(matches!(
            tier.invoke(&prompt).await,
            Err(TierError::Unconfigured)
        ));
    }
}
