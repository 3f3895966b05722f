//! Chat model backend abstraction.
//!
//! The mediator talks to generative models only through [`ChatModel`], so a
//! test double or a different provider can stand in for the real API.

use crate::error::LlmError;
use crate::exchange::{Exchange, Turn};
use crate::tool::ToolDeclaration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Constraint on the model's use of declared tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// No tools are offered; the model answers in prose.
    #[default]
    None,
    /// The model must select exactly one declared tool; a prose-only
    /// response is not permitted.
    Required,
}

/// A request for one model turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The accumulated exchange for this query.
    pub exchange: Exchange,
    /// Tools offered for selection, empty unless tool choice requires one.
    pub tools: Vec<ToolDeclaration>,
    /// Tool-choice constraint for this round.
    pub tool_choice: ToolChoice,
    /// Fixed system instruction, if any.
    pub system_instruction: Option<String>,
}

impl ChatRequest {
    /// Creates an unconstrained request over an exchange.
    #[must_use]
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            tools: Vec::new(),
            tool_choice: ToolChoice::None,
            system_instruction: None,
        }
    }

    /// Offers tools under the given constraint.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>, tool_choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = tool_choice;
        self
    }

    /// Sets the system instruction.
    #[must_use]
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Token usage reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens.
    pub input_tokens: u32,
    /// Number of output tokens.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Returns the total number of tokens.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// One model turn, as returned by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The model's turn, to be appended to the exchange verbatim.
    pub turn: Turn,
    /// Token usage for this call.
    pub usage: TokenUsage,
    /// The model that produced the turn.
    pub model: String,
}

/// Trait for chat model backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generates the next model turn for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails or the response cannot be
    /// interpreted as a turn.
    async fn generate(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Returns the model identifier.
    fn model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_defaults_to_no_tools() {
        let request = ChatRequest::new(Exchange::opening("hello"));
        assert!(request.tools.is_empty());
        assert_eq!(request.tool_choice, ToolChoice::None);
        assert!(request.system_instruction.is_none());
    }

    #[test]
    fn request_builder_sets_constraint_and_instruction() {
        let tools = vec![ToolDeclaration::new("get_stock_price", "Prices.")];
        let request = ChatRequest::new(Exchange::opening("hello"))
            .with_tools(tools, ToolChoice::Required)
            .with_system_instruction("You are a financial assistant.");

        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tool_choice, ToolChoice::Required);
        assert!(request.system_instruction.is_some());
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 120,
            output_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }
}
