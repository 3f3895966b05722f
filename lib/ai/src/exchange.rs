//! The conversation exchange for a single query.
//!
//! An [`Exchange`] is an append-only sequence of turns. Appending returns a
//! new value, so each protocol round is a pure step from one exchange to the
//! next and an earlier state can never be mutated behind the caller's back.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The originator of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user side, including tool results fed back on the user's behalf.
    User,
    /// The generative model.
    Model,
}

/// A tool selection made by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The declared tool name the model selected.
    pub name: String,
    /// Concrete arguments for that tool.
    pub args: JsonValue,
}

/// The result of executing a tool, addressed to the call it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// The tool name the result belongs to.
    pub name: String,
    /// The structured result payload.
    pub response: JsonValue,
}

/// One piece of a turn's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Part {
    /// Plain text.
    Text(String),
    /// A tool selection by the model.
    FunctionCall(FunctionCall),
    /// A tool result supplied back to the model.
    FunctionResponse(FunctionResponse),
}

/// A single turn in an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// The turn's content parts.
    pub parts: Vec<Part>,
}

impl Turn {
    /// Creates a user turn carrying plain text.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Creates a model turn carrying plain text.
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Creates the turn that feeds a tool result back to the model.
    ///
    /// The result rides on the user side of the conversation, wrapped as the
    /// response to the named call.
    #[must_use]
    pub fn function_response(name: impl Into<String>, response: JsonValue) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::FunctionResponse(FunctionResponse {
                name: name.into(),
                response,
            })],
        }
    }

    /// Returns the first function call in this turn, if any.
    #[must_use]
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.parts.iter().find_map(|part| match part {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    /// Returns the concatenated text parts of this turn, if any exist.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let chunks: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if chunks.is_empty() {
            None
        } else {
            Some(chunks.join(""))
        }
    }
}

/// The ordered turn sequence for one user query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    turns: Vec<Turn>,
}

impl Exchange {
    /// Creates an empty exchange.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an exchange opened by a user prompt.
    #[must_use]
    pub fn opening(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(prompt)],
        }
    }

    /// Returns a new exchange with the turn appended; `self` is untouched.
    #[must_use]
    pub fn push(&self, turn: Turn) -> Self {
        let mut turns = self.turns.clone();
        turns.push(turn);
        Self { turns }
    }

    /// The turns in order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the exchange has no turns yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_leaves_the_original_untouched() {
        let opened = Exchange::opening("What is NVDA trading at?");
        let extended = opened.push(Turn::model("Let me look that up."));

        assert_eq!(opened.len(), 1);
        assert_eq!(extended.len(), 2);
    }

    #[test]
    fn turn_text_concatenates_text_parts_only() {
        let turn = Turn {
            role: Role::Model,
            parts: vec![
                Part::Text("Apple is ".to_string()),
                Part::FunctionCall(FunctionCall {
                    name: "get_stock_price".to_string(),
                    args: json!({"ticker": "AAPL"}),
                }),
                Part::Text("trading higher.".to_string()),
            ],
        };

        assert_eq!(turn.text().as_deref(), Some("Apple is trading higher."));
    }

    #[test]
    fn turn_text_is_none_without_text_parts() {
        let turn = Turn::function_response("get_stock_price", json!({"price": 1.0}));
        assert!(turn.text().is_none());
    }

    #[test]
    fn function_call_accessor_finds_the_call() {
        let turn = Turn {
            role: Role::Model,
            parts: vec![Part::FunctionCall(FunctionCall {
                name: "get_financial_info".to_string(),
                args: json!({"ticker": "MSFT"}),
            })],
        };

        let call = turn.function_call().expect("should find call");
        assert_eq!(call.name, "get_financial_info");
        assert_eq!(call.args["ticker"], "MSFT");
    }

    #[test]
    fn function_response_rides_on_the_user_side() {
        let turn = Turn::function_response("get_stock_price", json!({"price": 212.5}));
        assert_eq!(turn.role, Role::User);
        assert!(turn.function_call().is_none());
    }
}
