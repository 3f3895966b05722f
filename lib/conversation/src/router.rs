//! Message routing against per-chat session state.
//!
//! The router decides what a message means given the chat's session:
//! a fresh start, a termination, a rejection, or a live query to forward.
//! It inspects no content beyond the two literal commands.

use crate::error::SessionError;
use crate::session::{Session, SessionStore};
use finsight_core::ChatId;
use std::sync::Arc;

/// Literal command that (re)starts a session.
pub const START_COMMAND: &str = "/start";

/// Literal command that ends a session.
pub const END_COMMAND: &str = "/end";

/// The action the caller should take for an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Greet the chat; a fresh session is now active.
    ShowWelcome,
    /// Say goodbye; the session is now ended.
    ShowFarewell,
    /// Ask the chat to start a session first.
    RejectNotStarted,
    /// Hand the message text to the mediator unchanged.
    Forward(String),
}

/// Classifies incoming messages against session state.
#[derive(Clone)]
pub struct Router {
    store: Arc<dyn SessionStore>,
}

impl Router {
    /// Creates a router over the given session store.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Classifies one message, mutating session state as a side effect.
    ///
    /// Precedence, first match wins:
    ///
    /// 1. `/start`, or no session yet: reinitialize to active, welcome.
    ///    A restart mid-session discards the prior state.
    /// 2. `/end`: mark the session ended (the entry is kept), farewell.
    /// 3. Session not active: reject without mutating anything.
    /// 4. Otherwise: forward the text byte-for-byte.
    ///
    /// Classification is total; the only error channel is the store.
    /// Concurrent calls for the same chat are not serialized: the get/put
    /// pair is not transactional, and interleaving is unspecified.
    pub async fn route(&self, chat_id: ChatId, text: &str) -> Result<RouteAction, SessionError> {
        let existing = self.store.get(chat_id).await?;

        let mut session = match existing {
            Some(session) if text != START_COMMAND => session,
            _ => {
                self.store.put(Session::start(chat_id)).await?;
                return Ok(RouteAction::ShowWelcome);
            }
        };

        if text == END_COMMAND {
            session.end();
            self.store.put(session).await?;
            return Ok(RouteAction::ShowFarewell);
        }

        if !session.state.can_accept_messages() {
            return Ok(RouteAction::RejectNotStarted);
        }

        session.touch();
        self.store.put(session).await?;
        Ok(RouteAction::Forward(text.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SessionState};

    fn router_with_store() -> (Router, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (Router::new(store.clone()), store)
    }

    async fn state_of(store: &MemorySessionStore, chat_id: ChatId) -> Option<SessionState> {
        store.get(chat_id).await.expect("get").map(|s| s.state)
    }

    #[tokio::test]
    async fn first_contact_welcomes_and_activates() {
        let (router, store) = router_with_store();
        let chat = ChatId::new(1);

        let action = router.route(chat, "hello").await.expect("route");

        assert_eq!(action, RouteAction::ShowWelcome);
        assert_eq!(state_of(&store, chat).await, Some(SessionState::Active));
    }

    #[tokio::test]
    async fn start_command_restarts_regardless_of_state() {
        let (router, store) = router_with_store();
        let chat = ChatId::new(2);

        router.route(chat, "hello").await.expect("route");
        router.route(chat, END_COMMAND).await.expect("route");
        assert_eq!(state_of(&store, chat).await, Some(SessionState::Ended));

        let action = router.route(chat, START_COMMAND).await.expect("route");
        assert_eq!(action, RouteAction::ShowWelcome);
        assert_eq!(state_of(&store, chat).await, Some(SessionState::Active));

        // Restarting an already-active session is just as welcome.
        let action = router.route(chat, START_COMMAND).await.expect("route");
        assert_eq!(action, RouteAction::ShowWelcome);
        assert_eq!(state_of(&store, chat).await, Some(SessionState::Active));
    }

    #[tokio::test]
    async fn end_command_ends_and_keeps_the_entry() {
        let (router, store) = router_with_store();
        let chat = ChatId::new(3);

        router.route(chat, "hello").await.expect("route");
        let action = router.route(chat, END_COMMAND).await.expect("route");

        assert_eq!(action, RouteAction::ShowFarewell);
        assert_eq!(state_of(&store, chat).await, Some(SessionState::Ended));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn message_after_end_is_rejected_without_mutation() {
        let (router, store) = router_with_store();
        let chat = ChatId::new(4);

        router.route(chat, "hello").await.expect("route");
        router.route(chat, END_COMMAND).await.expect("route");

        let action = router.route(chat, "AAPL price?").await.expect("route");
        assert_eq!(action, RouteAction::RejectNotStarted);
        assert_eq!(state_of(&store, chat).await, Some(SessionState::Ended));
    }

    #[tokio::test]
    async fn active_session_forwards_text_unchanged() {
        let (router, _store) = router_with_store();
        let chat = ChatId::new(5);

        router.route(chat, "hello").await.expect("route");

        let text = "What is Apple's current stock price over the last month?";
        let action = router.route(chat, text).await.expect("route");
        assert_eq!(action, RouteAction::Forward(text.to_owned()));
    }

    #[tokio::test]
    async fn end_without_session_falls_into_welcome_branch() {
        // Rule 1 (no session) wins over the end command by precedence.
        let (router, store) = router_with_store();
        let chat = ChatId::new(6);

        let action = router.route(chat, END_COMMAND).await.expect("route");
        assert_eq!(action, RouteAction::ShowWelcome);
        assert_eq!(state_of(&store, chat).await, Some(SessionState::Active));
    }

    #[tokio::test]
    async fn chats_are_independent() {
        let (router, store) = router_with_store();

        router.route(ChatId::new(7), "hi").await.expect("route");
        router.route(ChatId::new(8), "hi").await.expect("route");
        router.route(ChatId::new(7), END_COMMAND).await.expect("route");

        assert_eq!(
            state_of(&store, ChatId::new(7)).await,
            Some(SessionState::Ended)
        );
        assert_eq!(
            state_of(&store, ChatId::new(8)).await,
            Some(SessionState::Active)
        );
    }
}
