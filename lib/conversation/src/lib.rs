//! Session lifecycle and message routing for FinSight.
//!
//! This crate provides:
//!
//! - **Session**: per-chat conversational state tracking whether interaction
//!   is permitted
//! - **Session Store**: the storage capability behind sessions, with an
//!   in-memory implementation
//! - **Router**: classification of incoming messages into actions

pub mod error;
pub mod router;
pub mod session;

pub use error::SessionError;
pub use router::{END_COMMAND, RouteAction, Router, START_COMMAND};
pub use session::{MemorySessionStore, Session, SessionState, SessionStore};
