// src/services/ai.rs

//! Minimal text-generation client used for progress narratives.
//!
//! Only the Messages endpoint is called, with plain-text output. Calls log the
//! model, latency and token usage; the API key and prompt contents are never
//! logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Config;

const API_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 600;

#[derive(Debug)]
pub enum AiError {
    Transport(String),
    Upstream { status: u16, message: String },
    EmptyResponse,
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::Transport(e) => write!(f, "transport error: {}", e),
            AiError::Upstream { status, message } => write!(f, "upstream HTTP {}: {}", status, message),
            AiError::EmptyResponse => write!(f, "upstream returned no text"),
        }
    }
}

impl std::error::Error for AiError {}

/// Turns a prompt into prose. The text is opaque to callers.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, system: &str, prompt: &str) -> Result<String, AiError>;
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<MessageReq<'a>>,
}

#[derive(Serialize)]
struct MessageReq<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl AnthropicClient {
    /// Builds the client when an API key is configured; otherwise `None`.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.ai_api_key.clone()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| tracing::error!(error = %e, "Failed to build HTTP client for summaries"))
            .ok()?;

        Some(Self {
            client,
            api_key,
            base_url: config.ai_base_url.trim_end_matches('/').to_string(),
            model: config.ai_model.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for AnthropicClient {
    #[instrument(level = "info", skip(self, system, prompt), fields(model = %self.model))]
    async fn summarize(&self, system: &str, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/v1/messages", self.base_url);
        let req = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            system,
            messages: vec![MessageReq {
                role: "user",
                content: prompt,
            }],
        };

        let started = Instant::now();
        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "vocab-progress/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&req)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AiError::Upstream { status, message });
        }

        let body: MessagesResponse = res
            .json()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        if let Some(usage) = &body.usage {
            info!(
                input_tokens = ?usage.input_tokens,
                output_tokens = ?usage.output_tokens,
                latency_ms = started.elapsed().as_millis() as u64,
                "Summary generated"
            );
        }

        let text = collect_text(&body.content);
        if text.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(text)
    }
}

fn collect_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: Option<&str>) -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: String::new(),
            jwt_expiration: 60,
            rust_log: "error".into(),
            bind_addr: "127.0.0.1:0".into(),
            otp_ttl_seconds: 600,
            otp_cooldown_seconds: 60,
            otp_delivery: crate::config::OtpDelivery::Disabled,
            ai_api_key: key.map(str::to_string),
            ai_base_url: "https://api.example.test/".into(),
            ai_model: "test-model".into(),
        }
    }

    #[test]
    fn client_requires_key() {
        assert!(AnthropicClient::from_config(&config(None)).is_none());

        let client = AnthropicClient::from_config(&config(Some("k"))).unwrap();
        assert_eq!(client.base_url, "https://api.example.test");
    }

    #[test]
    fn only_text_blocks_are_collected() {
        let body: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "Siti is doing well."},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "Keep practising food words. "}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 12}
        }))
        .unwrap();

        assert_eq!(
            collect_text(&body.content),
            "Siti is doing well.\nKeep practising food words."
        );
    }
}
