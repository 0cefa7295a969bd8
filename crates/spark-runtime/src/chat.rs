use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error};

use crate::client::ClientError;
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL_ID: &str = "claude-3-5-haiku-20241022";
const API_VERSION: &str = "2023-06-01";

/// Direct model-invocation client for the non-streaming intake endpoints
/// (goal classification, intro message, goal rewriting).
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model_id: String,
}

/// Per-call generation options.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub system: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            system: None,
            max_tokens: 256,
            temperature: None,
        }
    }
}

impl ChatClient {
    /// Build from `ANTHROPIC_API_KEY` (required) and `CHAT_MODEL_ID`
    /// (optional override).
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| Error::Config("ANTHROPIC_API_KEY environment variable not set".to_string()))?;
        let model_id = env::var("CHAT_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string());
        Ok(Self::with_api_key(api_key, model_id))
    }

    pub fn with_api_key(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_id: model_id.into(),
        }
    }

    /// Point at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Single-turn completion; returns the first text block.
    pub async fn complete(
        &self,
        prompt: &str,
        options: &ChatOptions,
    ) -> std::result::Result<String, ClientError> {
        let request = MessagesRequest {
            model: &self.model_id,
            max_tokens: options.max_tokens,
            system: options.system.as_deref(),
            temperature: options.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model_id = %self.model_id, prompt_len = prompt.len(), "sending chat completion");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, message = %message, "chat completion failed");
            if status.as_u16() == 429 {
                return Err(ClientError::Throttled(message));
            }
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Transport(format!("invalid response body: {}", err)))?;

        body.content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| ClientError::Transport("no text content in response".to_string()))
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_omits_absent_options() {
        let request = MessagesRequest {
            model: "claude-3-5-haiku-20241022",
            max_tokens: 60,
            system: None,
            temperature: None,
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_picks_first_text_block() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"tool_use","text":""},{"type":"text","text":"ALLOW: ok"}]}"#,
        )
        .unwrap();

        let text = body
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .map(|block| block.text);
        assert_eq!(text.as_deref(), Some("ALLOW: ok"));
    }
}
