//! Session chat gateway.
//!
//! The gateway owns the session table and sits between the HTTP handlers and
//! the completion provider. Each chat turn:
//! 1. Appends the user message to the session history
//! 2. Sends the system prompt plus the tail of the history to the provider
//! 3. Replaces the reply with the intake questionnaire on a session's first turn
//! 4. Appends the final reply to the history
//!
//! Provider failures never reach the caller. They are logged and answered with
//! [`FALLBACK_REPLY`].

pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::llm::{CompletionProvider, CompletionRequest, Message, ProviderError, SamplingParams};
use crate::session::SessionStore;

pub use prompts::{FALLBACK_REPLY, INTAKE_QUESTIONS, SYSTEM_PROMPT, intake_message};

/// Session id used when the client does not send one.
pub const DEFAULT_SESSION_ID: &str = "unknown";

/// Language assumed when the client does not send one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Tunables for the gateway.
#[derive(Debug, Clone, Copy)]
pub struct GatewayOptions {
    /// Number of history turns sent to the provider.
    pub history_window: usize,
    /// Upper bound on a single provider call.
    pub provider_timeout: Duration,
    /// Sampling parameters for every completion.
    pub sampling: SamplingParams,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            history_window: 10,
            provider_timeout: Duration::from_secs(30),
            sampling: SamplingParams::default(),
        }
    }
}

/// Body of a chat request.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// User message content.
    #[serde(default)]
    pub message: Option<String>,
    /// Session to continue (defaults to [`DEFAULT_SESSION_ID`]).
    #[serde(default)]
    pub session_id: Option<String>,
    /// Client language tag.
    #[serde(default)]
    pub language: Option<String>,
}

/// Reply to a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text.
    pub response: String,
    /// Session the reply belongs to.
    pub session_id: String,
    /// Whether the client may read the reply aloud. Always `true`.
    pub has_audio: bool,
}

/// Body of a clear request.
#[derive(Debug, Default, Deserialize)]
pub struct ClearRequest {
    /// Session to clear.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Reply to a clear request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReply {
    /// Always `"success"`.
    pub status: String,
    /// Human readable confirmation.
    pub message: String,
}

/// Chat gateway over a completion provider.
#[derive(Clone)]
pub struct ChatGateway {
    provider: Arc<dyn CompletionProvider>,
    sessions: SessionStore,
    options: GatewayOptions,
}

impl std::fmt::Debug for ChatGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatGateway")
            .field("provider", &"CompletionProvider")
            .field("sessions", &self.sessions.len())
            .field("options", &self.options)
            .finish()
    }
}

impl ChatGateway {
    /// Create a gateway with an empty session table.
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>, options: GatewayOptions) -> Self {
        Self {
            provider,
            sessions: SessionStore::new(),
            options,
        }
    }

    /// Session table owned by this gateway.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Gateway options.
    #[must_use]
    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Handle one chat turn.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when `message` is missing. The
    /// session table is not touched in that case.
    pub async fn handle_chat(&self, req: ChatRequest) -> Result<ChatReply, ApiError> {
        let Some(message) = req.message else {
            return Err(ApiError::InvalidRequest("message"));
        };
        let session_id = req
            .session_id
            .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());
        let language = req
            .language
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let request_id = Uuid::new_v4().to_string();

        tracing::info!(
            request_id = %request_id,
            session_id = %session_id,
            language = %language,
            message_length = message.len(),
            "Received chat request"
        );

        let session = self.sessions.get_or_create(&session_id);
        let mut history = session.lock().await;

        history.push_user(message);
        let is_first_message = history.len() <= 1;

        let window = history.window(self.options.history_window);
        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.extend_from_slice(window);

        tracing::debug!(
            request_id = %request_id,
            session_id = %session_id,
            history_len = history.len(),
            window_len = window.len(),
            is_first_message,
            "Sending request to completion provider"
        );

        let candidate = self
            .complete_with_timeout(CompletionRequest {
                messages,
                params: self.options.sampling,
            })
            .await;

        let response = match candidate {
            Ok(_) if is_first_message => intake_message(),
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    session_id = %session_id,
                    error = %e,
                    "Completion provider failed, returning fallback reply"
                );
                return Ok(ChatReply {
                    response: FALLBACK_REPLY.to_string(),
                    session_id,
                    has_audio: true,
                });
            }
        };

        history.push_assistant(response.clone());
        drop(history);

        tracing::info!(
            request_id = %request_id,
            session_id = %session_id,
            response_length = response.len(),
            "Chat request completed"
        );

        Ok(ChatReply {
            response,
            session_id,
            has_audio: true,
        })
    }

    /// Clear a session's history.
    ///
    /// Unknown sessions are a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when `session_id` is missing.
    pub async fn clear_session(&self, req: ClearRequest) -> Result<ClearReply, ApiError> {
        let Some(session_id) = req.session_id else {
            return Err(ApiError::InvalidRequest("session_id"));
        };

        let existed = self.sessions.clear(&session_id).await;
        tracing::info!(session_id = %session_id, existed, "Conversation cleared");

        Ok(ClearReply {
            status: "success".to_string(),
            message: "Conversation cleared".to_string(),
        })
    }

    async fn complete_with_timeout(&self, req: CompletionRequest) -> Result<String, ProviderError> {
        let limit = self.options.provider_timeout;
        tokio::time::timeout(limit, self.provider.complete(req))
            .await
            .unwrap_or(Err(ProviderError::Timeout(limit)))
    }
}
