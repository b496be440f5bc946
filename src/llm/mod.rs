//! LLM completion client traits and implementations.
//!
//! This module provides the abstraction the chat gateway uses to talk to an
//! external text-completion service: hand over a list of role-tagged
//! messages, get a generated reply back.
//!
//! # Overview
//!
//! The [`CompletionProvider`] trait is the single seam between the gateway and
//! the remote model. Production code uses [`ChatCompletionsDriver`]; tests plug
//! in stubs.
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: `OpenAI` Chat Completions API (`/v1/chat/completions`)
//!
//! # Example
//!
//! ```rust,ignore
//! use medchat_gateway::llm::{ChatCompletionsDriver, LlmSettings, Provider, SamplingParams};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: "sk-...".to_string(),
//!     model: "gpt-4".to_string(),
//!     provider: Provider::OpenAI,
//! };
//! let driver = ChatCompletionsDriver::new(settings);
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use provider::Provider;

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g., `gpt-4`).
    pub model: String,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SamplingParams {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Penalty for introducing already-present topics.
    pub presence_penalty: f32,
    /// Penalty for repeating tokens.
    pub frequency_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.5,
            presence_penalty: 0.6,
            frequency_penalty: 0.2,
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content of the message.
    pub content: String,
}

impl Message {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// Request to a completion provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation messages, system prompt first.
    pub messages: Vec<Message>,
    /// Sampling parameters.
    pub params: SamplingParams,
}

/// Errors raised by a completion provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response carried no assistant text.
    #[error("Completion response contained no message content")]
    EmptyResponse,

    /// The call did not finish in time.
    #[error("Completion timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Trait for text-completion backends.
///
/// Implementations take a fully assembled message list and return the
/// generated reply text.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a reply for the given conversation.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the request fails or the response
    /// cannot be interpreted.
    async fn complete(&self, req: CompletionRequest) -> Result<String, ProviderError>;
}
