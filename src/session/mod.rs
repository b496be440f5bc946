//! Session and conversation history management.
//!
//! This module provides in-memory session storage for conversation state
//! across requests. Sessions are keyed by a client-chosen string and hold the
//! ordered message history.
//!
//! # Architecture
//!
//! - [`Session`]: A single conversation, guarded by its own async lock
//! - [`SessionStore`]: Thread-safe table of all sessions
//!
//! # Example
//!
//! ```rust
//! use medchat_gateway::session::SessionStore;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store = SessionStore::new();
//!     let session = store.get_or_create("abc");
//!     session.lock().await.push_user("Hello!");
//!
//!     assert_eq!(session.lock().await.len(), 1);
//! });
//! ```

mod thread;

pub use thread::{History, Session, SessionStore};
