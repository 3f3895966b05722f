//! Error types for the server binary.

use std::fmt;

/// Errors from Telegram Bot API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramError {
    /// The request never produced a response.
    RequestFailed { reason: String },
    /// The Bot API answered `ok: false`.
    ApiRejected { description: String },
    /// The API response was missing an expected field.
    MalformedResponse { reason: String },
}

impl fmt::Display for TelegramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "telegram request failed: {reason}")
            }
            Self::ApiRejected { description } => {
                write!(f, "telegram API rejected the call: {description}")
            }
            Self::MalformedResponse { reason } => {
                write!(f, "malformed telegram API response: {reason}")
            }
        }
    }
}

impl std::error::Error for TelegramError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telegram_error_display() {
        let err = TelegramError::ApiRejected {
            description: "chat not found".to_string(),
        };
        assert!(err.to_string().contains("chat not found"));
    }
}
