#![doc = "Provider integration: bridges the core `Generator` trait to an OpenAI-compatible chat-completions endpoint (Fireworks by default)."]
//
//! # Provider Integration (server/CLI <-> Core)
//!
//! This module wires the [`Generator`] trait from `polyglot-forge-core` to a real network
//! provider. [`FireworksClient`] posts one chat-completion per generation request, asks for a
//! JSON object constrained by the request's schema, and returns the parsed object.
//!
//! - Construct [`FireworksClient`] from the loaded [`ProviderSection`] (`FIREWORKS_API_KEY`).
//! - The client is immutable after construction; share it behind an `Arc`.
//! - Bounded retry lives here: transport errors, 408/409/429 and 5xx are retried up to
//!   `max_retries` times with exponential backoff; everything else fails at once.
//!
//! Schema gating of the returned object happens in core, not here.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use polyglot_forge_core::contract::{GenerationError, GenerationRequest, Generator};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::load_config::ProviderSection;

const MAX_ERROR_BODY_CHARS: usize = 500;

pub struct FireworksClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    retry_initial_delay: Duration,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl FireworksClient {
    pub fn from_config(config: &ProviderSection) -> anyhow::Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => {
                tracing::error!("FIREWORKS_API_KEY missing in environment");
                anyhow::bail!("FIREWORKS_API_KEY environment variable not set");
            }
        };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                anyhow::anyhow!("Failed to build HTTP client: {e}")
            })?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        tracing::info!(
            api_key_set = !api_key.is_empty(),
            endpoint = %endpoint,
            "Initialized FireworksClient from config"
        );
        Ok(FireworksClient {
            http,
            endpoint,
            api_key,
            retry_initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
        })
    }

    fn request_body(request: &GenerationRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
            "response_format": {
                "type": "json_object",
                "schema": request.schema
            },
            "temperature": 0
        })
    }

    async fn send_once(&self, body: &Value) -> Result<Value, GenerationError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), truncate(&body)));
        }

        let completion: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::InvalidOutput(format!("unreadable completion: {e}")))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::InvalidOutput("completion has no message content".into())
            })?;

        parse_json_object(&content)
    }
}

#[async_trait]
impl Generator for FireworksClient {
    async fn generate(&self, request: GenerationRequest) -> Result<Value, GenerationError> {
        let body = Self::request_body(&request);
        let mut attempt: u32 = 0;

        loop {
            tracing::debug!(model = %request.model, attempt, "[PROVIDER] Sending chat completion");
            match self.send_once(&body).await {
                Ok(value) => {
                    tracing::info!(model = %request.model, attempt, "[PROVIDER] Completion received");
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < request.max_retries => {
                    let delay = self
                        .retry_initial_delay
                        .saturating_mul(2u32.saturating_pow(attempt));
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "[PROVIDER] Retryable failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if attempt > 0 => {
                    tracing::error!(error = %e, attempts = attempt + 1, "[PROVIDER][ERROR] Giving up after retries");
                    return Err(GenerationError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "[PROVIDER][ERROR] Generation failed");
                    return Err(e);
                }
            }
        }
    }
}

fn classify_status(status: u16, message: String) -> GenerationError {
    match status {
        401 | 403 => GenerationError::Unauthorized { status, message },
        429 => GenerationError::RateLimited(message),
        _ => GenerationError::Http { status, message },
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$")
            .expect("fence regex is valid")
    })
}

/// Parse model text as a JSON object, tolerating a surrounding markdown fence.
pub fn parse_json_object(text: &str) -> Result<Value, GenerationError> {
    let unfenced = match fence_regex().captures(text) {
        Some(caps) => caps.get(1).map_or(text, |m| m.as_str()),
        None => text,
    };
    serde_json::from_str::<Value>(unfenced.trim())
        .map_err(|e| GenerationError::InvalidOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let v = parse_json_object(r#"{"path":"a.py","content":"x"}"#).unwrap();
        assert_eq!(v["path"], "a.py");
    }

    #[test]
    fn strips_markdown_fence() {
        let text = "```json\n{\"path\":\"a.py\",\"content\":\"print(1)\"}\n```\n";
        let v = parse_json_object(text).unwrap();
        assert_eq!(v["content"], "print(1)");
    }

    #[test]
    fn rejects_prose() {
        let err = parse_json_object("Sure! Here is your file.").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidOutput(_)));
    }

    #[test]
    fn classifies_statuses() {
        assert!(matches!(classify_status(401, String::new()), GenerationError::Unauthorized { .. }));
        assert!(matches!(classify_status(429, String::new()), GenerationError::RateLimited(_)));
        assert!(matches!(classify_status(502, String::new()), GenerationError::Http { status: 502, .. }));
    }

    #[test]
    fn truncates_long_error_bodies() {
        let long = "é".repeat(MAX_ERROR_BODY_CHARS + 10);
        let short = truncate(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), MAX_ERROR_BODY_CHARS + 3);
    }
}
