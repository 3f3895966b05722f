//! Accepted document kinds and extraction dispatch.

use crate::error::ExtractError;
use crate::{pdf, sheet, table};

/// The document kinds the assistant accepts, by declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `text/csv`: a delimited-text table.
    DelimitedText,
    /// `application/vnd.ms-excel`: a spreadsheet.
    Spreadsheet,
    /// `application/pdf`: a portable document.
    Pdf,
}

impl DocumentKind {
    /// Maps a declared media type onto a kind; anything outside the
    /// allow-list is `None` and must be rejected before routing.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "text/csv" => Some(Self::DelimitedText),
            "application/vnd.ms-excel" => Some(Self::Spreadsheet),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Extracts plain text from an uploaded document.
///
/// # Errors
///
/// Returns an error when the bytes do not match the declared kind or the
/// document carries no data.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::DelimitedText => table::render_delimited(as_utf8(bytes)?),
        DocumentKind::Spreadsheet => sheet::extract(bytes),
        DocumentKind::Pdf => pdf::extract(bytes),
    }
}

pub(crate) fn as_utf8(bytes: &[u8]) -> Result<&str, ExtractError> {
    std::str::from_utf8(bytes).map_err(|e| ExtractError::InvalidEncoding {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_exactly_three_types() {
        assert_eq!(
            DocumentKind::from_mime("text/csv"),
            Some(DocumentKind::DelimitedText)
        );
        assert_eq!(
            DocumentKind::from_mime("application/vnd.ms-excel"),
            Some(DocumentKind::Spreadsheet)
        );
        assert_eq!(
            DocumentKind::from_mime("application/pdf"),
            Some(DocumentKind::Pdf)
        );
    }

    #[test]
    fn other_media_types_are_rejected() {
        assert_eq!(DocumentKind::from_mime("image/png"), None);
        assert_eq!(DocumentKind::from_mime("text/plain"), None);
        assert_eq!(
            DocumentKind::from_mime(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            None
        );
    }

    #[test]
    fn delimited_extraction_rejects_binary_garbage() {
        let err = extract_text(DocumentKind::DelimitedText, &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidEncoding { .. }));
    }
}
