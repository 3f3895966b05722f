//! Generative-model primitives for FinSight.
//!
//! This crate provides:
//!
//! - **Exchange**: the immutable turn sequence for one query
//! - **Tool Declaration**: named, schema-typed capabilities offered to the
//!   model
//! - **Chat Model**: the backend trait, with a Gemini REST implementation

pub mod backend;
pub mod error;
pub mod exchange;
pub mod gemini;
pub mod tool;

pub use backend::{ChatModel, ChatRequest, ChatResponse, TokenUsage, ToolChoice};
pub use error::LlmError;
pub use exchange::{Exchange, FunctionCall, FunctionResponse, Part, Role, Turn};
pub use gemini::GeminiModel;
pub use tool::{ParameterType, ToolDeclaration, ToolParameter};
