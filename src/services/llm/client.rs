use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("completion provider returned no content")]
    Empty,
}

/// The single operation the voice core needs from a language model.
/// Callers on voice paths must convert failures to a soft `unknown` result.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 300,
            temperature: 0.3,
        }
    }
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10)) // Hard timeout enforcement (network level)
                .build()
                .unwrap_or_default(),
            config,
        }
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_message },
            ],
        };

        let mut request = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(LlmError::Status(response.status()));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        content.ok_or(LlmError::Empty)
    }
}
