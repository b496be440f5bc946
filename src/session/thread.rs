//! Conversation history and session storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};

use crate::llm::Message;

/// Ordered message history of one session.
///
/// Grows without bound; readers take a bounded tail via [`History::window`].
#[derive(Debug, Default, Clone)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// The last `size` messages, oldest first.
    #[must_use]
    pub fn window(&self, size: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(size);
        &self.messages[start..]
    }

    /// All messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of recorded turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if no turns are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every recorded turn.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// A single conversation session.
///
/// The history sits behind an async mutex so a request can hold it across
/// the completion call. Requests for the same session therefore run one at
/// a time; other sessions are unaffected.
#[derive(Debug)]
pub struct Session {
    id: String,
    history: Mutex<History>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            history: Mutex::new(History::default()),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Acquire exclusive access to the history.
    pub async fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().await
    }
}

/// Thread-safe store for sessions.
///
/// The table lock is only held for lookup and insertion, never across an
/// await point.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Arc<Session>>>>,
}

impl SessionStore {
    /// Create an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(id).cloned()
    }

    /// Get a session by ID, creating an empty one if it doesn't exist.
    #[must_use]
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        if let Some(session) = self.get(id) {
            return session;
        }

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let session = guard
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id = %id, "Created new session");
                Arc::new(Session::new(id.to_string()))
            });
        Arc::clone(session)
    }

    /// Empty the history of a session.
    ///
    /// Returns `false` when the session does not exist, in which case
    /// nothing is created.
    pub async fn clear(&self, id: &str) -> bool {
        let Some(session) = self.get(id) else {
            return false;
        };
        session.lock().await.clear();
        true
    }

    /// Copy of a session's history, if the session exists.
    pub async fn history(&self, id: &str) -> Option<Vec<Message>> {
        let session = self.get(id)?;
        let history = session.lock().await;
        Some(history.messages().to_vec())
    }

    /// Get the number of known sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
