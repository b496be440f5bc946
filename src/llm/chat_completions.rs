//! OpenAI Chat Completions API driver.
//!
//! This module implements the [`CompletionProvider`] trait for the OpenAI Chat
//! Completions API (`/v1/chat/completions`) in non-streaming mode.

use serde::Deserialize;

use super::provider::AuthScheme;
use super::{CompletionProvider, CompletionRequest, LlmSettings, ProviderError};

/// Subset of the Chat Completions response the driver reads.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Driver for the OpenAI Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Endpoint the driver posts to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.settings
            .provider
            .build_chat_url(&self.settings.base_url)
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ChatCompletionsDriver {
    async fn complete(&self, req: CompletionRequest) -> Result<String, ProviderError> {
        let url = self.endpoint();

        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": req.messages,
            "max_tokens": req.params.max_tokens,
            "temperature": req.params.temperature,
            "presence_penalty": req.params.presence_penalty,
            "frequency_penalty": req.params.frequency_penalty,
        });

        let mut rb = self.http.post(&url).json(&body);
        rb = match self.settings.provider.auth_scheme() {
            AuthScheme::Bearer => rb.bearer_auth(&self.settings.api_key),
            AuthScheme::ApiKeyHeader => rb.header("api-key", &self.settings.api_key),
        };

        tracing::debug!(
            url = %url,
            model = %self.settings.model,
            message_count = req.messages.len(),
            "Sending completion request"
        );

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let parsed: CompletionResponse = serde_json::from_slice(&bytes)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ProviderError::EmptyResponse)
    }
}
