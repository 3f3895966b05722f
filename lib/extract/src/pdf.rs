//! PDF text extraction.

use crate::error::ExtractError;
use lopdf::Document;

/// Extracts text from a PDF, page by page.
///
/// Pages without extractable text are skipped; a scanned-image PDF can
/// legitimately yield an empty string.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractError::MalformedDocument {
        format: "pdf",
        reason: e.to_string(),
    })?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        if let Ok(page_text) = document.extract_text(&[*page_number]) {
            let trimmed = page_text.trim_end();
            if !trimmed.is_empty() {
                text.push_str(trimmed);
                text.push('\n');
            }
        }
    }

    Ok(text)
}
