//! Error types for the advisor crate.
//!
//! Every failure is a distinct typed outcome so the outer handler can pick
//! an appropriate user-facing message per category. Nothing here is retried.

use finsight_ai::LlmError;
use finsight_market::MarketError;
use std::fmt;

/// The model broke the tool-selection contract.
///
/// These are unrecoverable for the query: the model is contractually
/// restricted to the two declared tools, so a violation is a provider bug,
/// not a user error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// The model answered without selecting a tool despite the constraint.
    MissingToolCall,
    /// The model named a tool outside the declared two.
    UndeclaredTool { name: String },
    /// The model selected a declared tool with arguments that do not
    /// satisfy its schema.
    MalformedArguments { tool: &'static str, reason: String },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToolCall => {
                write!(f, "model returned no tool selection despite the constraint")
            }
            Self::UndeclaredTool { name } => {
                write!(f, "model selected undeclared tool '{name}'")
            }
            Self::MalformedArguments { tool, reason } => {
                write!(f, "model passed malformed arguments to '{tool}': {reason}")
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

/// Errors from answering one query.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisorError {
    /// The model violated the tool-selection contract.
    Contract(ContractViolation),
    /// A model round failed.
    Model(LlmError),
    /// Executing the selected retrieval failed.
    Retrieval(MarketError),
    /// The retrieved payload could not be encoded for the model.
    ResultEncoding { reason: String },
    /// The synthesis round produced no prose.
    EmptyAnswer,
}

impl fmt::Display for AdvisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contract(violation) => write!(f, "tool contract violation: {violation}"),
            Self::Model(err) => write!(f, "model round failed: {err}"),
            Self::Retrieval(err) => write!(f, "retrieval failed: {err}"),
            Self::ResultEncoding { reason } => {
                write!(f, "failed to encode tool result: {reason}")
            }
            Self::EmptyAnswer => write!(f, "synthesis round produced no answer text"),
        }
    }
}

impl std::error::Error for AdvisorError {}

impl From<ContractViolation> for AdvisorError {
    fn from(violation: ContractViolation) -> Self {
        Self::Contract(violation)
    }
}

impl From<LlmError> for AdvisorError {
    fn from(err: LlmError) -> Self {
        Self::Model(err)
    }
}

impl From<MarketError> for AdvisorError {
    fn from(err: MarketError) -> Self {
        Self::Retrieval(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violation_display() {
        let err = ContractViolation::UndeclaredTool {
            name: "get_weather".to_string(),
        };
        assert!(err.to_string().contains("get_weather"));
    }

    #[test]
    fn advisor_error_wraps_categories_distinctly() {
        let contract: AdvisorError = ContractViolation::MissingToolCall.into();
        let retrieval: AdvisorError = MarketError::UnknownTicker {
            ticker: "NOPE".to_string(),
        }
        .into();

        assert!(matches!(contract, AdvisorError::Contract(_)));
        assert!(matches!(retrieval, AdvisorError::Retrieval(_)));
    }
}
