//! Medical chat gateway
//!
//! A small HTTP service that keeps per-session conversation history and
//! forwards each turn to an OpenAI-compatible completion API.
//!
//! # Architecture
//!
//! - **Server**: Axum-based JSON API with CORS and request tracing
//! - **Gateway**: Session lookup, history windowing, intake questionnaire and
//!   fallback handling around the completion call
//! - **LLM Client**: Provider-agnostic driver for the Chat Completions API
//!
//! # Modules
//!
//! - [`config`]: Layered configuration (defaults, file, env, CLI)
//! - [`gateway`]: Chat and clear operations
//! - [`llm`]: Completion provider trait and drivers
//! - [`session`]: Conversation history storage

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod server;
pub mod session;
pub mod telemetry;

use gateway::ChatGateway;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Chat gateway owning the session table.
    pub gateway: ChatGateway,
}
