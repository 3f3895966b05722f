//! Conversation session state and storage.
//!
//! A session records whether a chat is allowed to talk to the assistant.
//! Absence of a session entry means the chat has never started one; entries
//! are created on first contact, marked ended on `/end`, and never removed.
//! Storage is in-memory only: a process restart resets every chat.

use crate::error::SessionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finsight_core::ChatId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The state of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session is active and accepting messages.
    Active,
    /// Session has been ended with `/end`.
    Ended,
}

impl SessionState {
    /// Returns true if the session can accept messages.
    #[must_use]
    pub fn can_accept_messages(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the session has ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

/// A conversation session for a single chat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Session {
    /// The chat this session belongs to.
    pub chat_id: ChatId,
    /// Session state.
    pub state: SessionState,
    /// When the session was (re)started.
    pub started_at: DateTime<Utc>,
    /// When a message was last routed through this session.
    pub last_routed_at: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh active session for a chat.
    #[must_use]
    pub fn start(chat_id: ChatId) -> Self {
        let now = Utc::now();
        Self {
            chat_id,
            state: SessionState::Active,
            started_at: now,
            last_routed_at: now,
        }
    }

    /// Ends the session. The entry stays in the store; only the state flips.
    pub fn end(&mut self) {
        self.state = SessionState::Ended;
        self.last_routed_at = Utc::now();
    }

    /// Records that a message was routed through this session.
    pub fn touch(&mut self) {
        self.last_routed_at = Utc::now();
    }
}

/// Storage capability for sessions.
///
/// Injected into the router so the in-memory map can be swapped for a
/// process-external store or a test double without touching routing logic.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Looks up the session for a chat, if one exists.
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, SessionError>;

    /// Inserts or replaces the session for its chat.
    async fn put(&self, session: Session) -> Result<(), SessionError>;
}

/// In-memory session store.
///
/// Lives for the process lifetime; there is no eviction. Individual reads
/// and writes are serialized by the lock, but a read-modify-write spanning
/// both calls is not atomic.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<ChatId, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sessions ever started.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns whether any session has been started.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.read().await.get(&chat_id).copied())
    }

    async fn put(&self, session: Session) -> Result<(), SessionError> {
        self.sessions.write().await.insert(session.chat_id, session);
        Ok(())
    }
}
