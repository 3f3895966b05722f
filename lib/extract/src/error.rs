//! Error types for the extract crate.

use std::fmt;

/// Errors from turning an uploaded document into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The bytes are not valid UTF-8 where text was expected.
    InvalidEncoding { reason: String },
    /// The document is structurally broken for its declared format.
    MalformedDocument {
        format: &'static str,
        reason: String,
    },
    /// The document carries no rows or pages at all.
    EmptyDocument,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncoding { reason } => {
                write!(f, "document is not valid text: {reason}")
            }
            Self::MalformedDocument { format, reason } => {
                write!(f, "malformed {format} document: {reason}")
            }
            Self::EmptyDocument => write!(f, "document contains no data"),
        }
    }
}

impl std::error::Error for ExtractError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_error_display() {
        let err = ExtractError::MalformedDocument {
            format: "pdf",
            reason: "bad xref".to_string(),
        };
        assert!(err.to_string().contains("pdf"));
        assert!(err.to_string().contains("bad xref"));
    }
}
