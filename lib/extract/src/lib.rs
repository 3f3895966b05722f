//! Document-to-text extraction for FinSight uploads.
//!
//! Uploads arrive as raw bytes with a declared media type; only delimited
//! text tables, legacy spreadsheets, and PDFs are accepted. Extraction
//! turns each into plain text suitable for prefixing a user's question.

pub mod document;
pub mod error;
mod pdf;
mod sheet;
mod table;

pub use document::{DocumentKind, extract_text};
pub use error::ExtractError;
