//! Core domain types for the FinSight assistant.
//!
//! This crate provides the strongly-typed identifiers shared by every other
//! crate in the workspace: the platform-assigned chat identifier that keys
//! conversation sessions, and the ULID-backed query identifier that tags a
//! single user query through the logs.

pub mod id;

pub use id::{ChatId, ParseIdError, QueryId};
