//! Completion provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction for chat completion
//! backends, allowing easy swapping between Groq and a mock.

pub mod groq;
pub mod mock;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Result of a completion call.
pub struct Completion {
    /// Generated text; `None` when the backend returned an empty choice.
    pub text: Option<String>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,
}

/// Trait for chat completion providers (e.g. Groq).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for the given message list.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, ProviderError>;

    /// Whether the provider has credentials and can be called at all.
    fn is_configured(&self) -> bool;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
