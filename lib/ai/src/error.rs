//! Error types for the AI crate.

use std::fmt;

/// Errors from chat model backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The request never produced a response.
    RequestFailed { reason: String },
    /// The provider answered with a non-success status.
    UpstreamRejected { status: u16, message: String },
    /// The response body could not be interpreted.
    ResponseParseFailed { reason: String },
    /// The provider returned no candidate turn.
    EmptyResponse,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "model request failed: {reason}")
            }
            Self::UpstreamRejected { status, message } => {
                write!(f, "model provider rejected the request ({status}): {message}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse model response: {reason}")
            }
            Self::EmptyResponse => write!(f, "model returned no candidates"),
        }
    }
}

impl std::error::Error for LlmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_display() {
        let err = LlmError::UpstreamRejected {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("quota exceeded"));
    }
}
