use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat message for the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and return the first completion's text.
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError>;
}

/// Upstream failures. Transport failures keep their cause apart
/// (connect / timeout / protocol) so logs can tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("could not connect to upstream: {0}")]
    Connect(reqwest::Error),
    #[error("upstream request timed out: {0}")]
    Timeout(reqwest::Error),
    #[error("HTTP request failed: {0}")]
    Protocol(reqwest::Error),
    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e)
        } else if e.is_connect() {
            LlmError::Connect(e)
        } else {
            LlmError::Protocol(e)
        }
    }
}

impl LlmError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Connect(_) => "connect",
            LlmError::Timeout(_) => "timeout",
            LlmError::Protocol(_) => "protocol",
            LlmError::ApiError { .. } => "api_status",
            LlmError::MalformedResponse(_) => "malformed_response",
            LlmError::NotConfigured(_) => "not_configured",
        }
    }
}
