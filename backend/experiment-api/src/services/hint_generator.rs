use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::HintsConfig;
use crate::utils::retry::{retry_async_if, RetryConfig};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("service is not configured")]
    Disabled,
}

impl ServiceError {
    /// Network failures, rate limiting and 5xx are worth another try.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Transport(_) => true,
            ServiceError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            ServiceError::Malformed(_) | ServiceError::Disabled => false,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Malformed(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// A composed prompt plus optional sampling overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = Some(max_tokens);
        self.temperature = Some(temperature);
        self
    }
}

/// Turns a prompt into hint text. The result is opaque to the caller.
#[async_trait]
pub trait HintGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client. The prompt is sent as the
/// single system message.
pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryConfig,
}

impl ChatCompletionClient {
    pub fn new(config: &HintsConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry: RetryConfig::with_attempts(config.retry_attempts),
        })
    }

    async fn call_once(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or(ServiceError::Disabled)?;
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: &prompt.text,
            }],
            max_tokens: prompt.max_tokens.unwrap_or(self.max_tokens),
            temperature: prompt.temperature.unwrap_or(self.temperature),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ServiceError::Malformed("response has no message content".into()))
    }
}

#[async_trait]
impl HintGenerator for ChatCompletionClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ServiceError> {
        retry_async_if(
            self.retry.clone(),
            || self.call_once(prompt),
            ServiceError::is_transient,
        )
        .await
    }
}
