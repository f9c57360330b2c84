//! Hugging Face Inference client implementation
//!
//! This module implements the LlmClient trait against the Hugging Face
//! inference router, which speaks the OpenAI-compatible chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};

use crate::llm::client::{LlmClient, LlmError};
use crate::llm::types::{Message, Usage};

/// Hugging Face inference router base URL
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Default model to use
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3-8B-Instruct";

/// Environment variable holding the access token
pub const DEFAULT_API_KEY_ENV: &str = "HUGGINGFACEHUB_API_TOKEN";

/// Configuration for the Hugging Face client
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout: Duration,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HuggingFaceConfig {
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Hugging Face chat-completions client
pub struct HuggingFaceClient {
    client: Client,
    api_key: String,
    config: HuggingFaceConfig,
}

impl HuggingFaceClient {
    /// Create a new client, reading the token from `config.api_key_env`
    pub fn new(config: HuggingFaceConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey {
                env_var: config.api_key_env.clone(),
            })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>, config: HuggingFaceConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Build the request body for the chat-completions endpoint
    fn build_request(&self, messages: &[Message], max_tokens: u32) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": m.role.as_str(),
                    "content": m.content
                })
            })
            .collect();

        json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": max_tokens
        })
    }

    /// Extract the assistant text from a chat-completions response
    fn parse_response(body: &Value) -> Result<(String, Usage), LlmError> {
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::InvalidResponse(format!("no choices[0].message.content in {}", body)))?;

        let usage = body
            .get("usage")
            .map(|u| {
                Usage::new(
                    u["prompt_tokens"].as_u64().unwrap_or(0),
                    u["completion_tokens"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        Ok((content.to_string(), usage))
    }

    /// Send a request to the chat-completions endpoint
    async fn send_request(&self, body: Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LlmClient for HuggingFaceClient {
    async fn chat(&self, messages: &[Message], max_tokens: u32) -> Result<String, LlmError> {
        let body = self.build_request(messages, max_tokens);
        debug!("Sending {} messages to {}", messages.len(), self.config.model);

        let response = self.send_request(body).await?;
        let (content, usage) = Self::parse_response(&response)?;

        debug!(
            "Model replied with {} chars ({} tokens)",
            content.len(),
            usage.total()
        );
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for HuggingFaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}
