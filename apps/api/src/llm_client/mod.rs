/// LLM Client — the single point of entry for chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// Callers depend on the `CompletionProvider` trait; `LlmClient` is the
/// production implementation.
///
/// One attempt per call. There is no retry or backoff: the insights gateway
/// degrades to prompt mode on any failure instead.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Fixed model for all insight calls.
pub const MODEL: &str = "gpt-3.5-turbo";
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Short reason suitable for showing to an end user, e.g. `insufficient_quota`.
    pub fn short_reason(&self) -> String {
        match self {
            LlmError::Http(e) if e.is_timeout() => "request timed out".to_string(),
            LlmError::Http(_) => "network error".to_string(),
            LlmError::Api {
                code: Some(code), ..
            } => code.clone(),
            LlmError::Api { status: 429, .. } => "quota exceeded".to_string(),
            LlmError::Api { status, .. } => format!("HTTP {status}"),
            LlmError::Parse(_) => "malformed response".to_string(),
            LlmError::EmptyContent => "empty response".to_string(),
        }
    }
}

/// Generated text plus the provider-reported token count, when present.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: Option<u32>,
}

/// The completion trait. Implement this to swap providers (or inject a fake
/// in tests) without touching the gateway or handlers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// `max_tokens` caps the generated text; callers pick it per prompt kind.
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Completion, LlmError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl ChatResponse {
    fn into_completion(self) -> Result<Completion, LlmError> {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(LlmError::EmptyContent)?;

        Ok(Completion {
            text,
            tokens_used: self.usage.map(|u| u.total_tokens),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    code: Option<String>,
}

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_url,
        })
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Completion, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), body));
        }

        let completion = serde_json::from_str::<ChatResponse>(&body)?.into_completion()?;

        debug!(
            "LLM call succeeded: model={}, tokens_used={:?}",
            MODEL, completion.tokens_used
        );

        Ok(completion)
    }

    fn model(&self) -> &str {
        MODEL
    }
}

fn api_error(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<ApiErrorEnvelope>(&body) {
        Ok(envelope) => LlmError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => LlmError::Api {
            status,
            code: None,
            message: body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_from_response_with_usage() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"  Follow up Friday. "}}],
                      "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#;
        let completion = serde_json::from_str::<ChatResponse>(raw)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.text, "Follow up Friday.");
        assert_eq!(completion.tokens_used, Some(15));
    }

    #[test]
    fn test_completion_without_usage() {
        let raw = r#"{"choices":[{"message":{"content":"ok"}}]}"#;
        let completion = serde_json::from_str::<ChatResponse>(raw)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.tokens_used, None);
    }

    #[test]
    fn test_empty_choices_is_empty_content() {
        let raw = r#"{"choices":[]}"#;
        let err = serde_json::from_str::<ChatResponse>(raw)
            .unwrap()
            .into_completion()
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_api_error_extracts_code() {
        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        let err = api_error(429, body.to_string());
        assert_eq!(err.short_reason(), "insufficient_quota");
    }

    #[test]
    fn test_api_error_unparseable_body() {
        let err = api_error(502, "Bad Gateway".to_string());
        match &err {
            LlmError::Api { message, code, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert!(code.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.short_reason(), "HTTP 502");
    }

    #[test]
    fn test_rate_limit_without_code() {
        let err = api_error(429, "{}".to_string());
        assert_eq!(err.short_reason(), "quota exceeded");
    }
}
