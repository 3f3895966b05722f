//! Spreadsheet text extraction.
//!
//! OOXML workbooks are zip archives; worksheet cell values and the shared
//! string table are pulled out of their XML entries. Uploads declared with
//! the legacy spreadsheet type are frequently plain delimited text, so
//! non-archive bytes fall back to the delimited-table path.

use crate::document::as_utf8;
use crate::error::ExtractError;
use crate::table;
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use zip::ZipArchive;

static SHARED_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<t[^>]*>([^<]*)</t>").expect("static regex"));

static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<row[^>]*>(.*?)</row>").expect("static regex"));

static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<c([^>]*?)(?:/>|>(.*?)</c>)").expect("static regex"));

static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<v>([^<]*)</v>").expect("static regex"));

/// Extracts text from spreadsheet bytes.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.starts_with(b"PK\x03\x04") {
        extract_archive(bytes)
    } else {
        table::render_delimited(as_utf8(bytes)?)
    }
}

fn extract_archive(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::MalformedDocument {
            format: "spreadsheet",
            reason: e.to_string(),
        })?;

    let shared_strings = read_entry(&mut archive, "xl/sharedStrings.xml")?
        .map(|xml| parse_shared_strings(&xml))
        .unwrap_or_default();

    let mut sheet_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("xl/worksheets/sheet") && name.ends_with(".xml"))
        .map(str::to_owned)
        .collect();
    sheet_names.sort();

    let mut lines = Vec::new();
    for name in sheet_names {
        if let Some(xml) = read_entry(&mut archive, &name)? {
            lines.extend(parse_sheet(&xml, &shared_strings));
        }
    }

    if lines.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    Ok(lines.join("\n"))
}

fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    let Ok(mut entry) = archive.by_name(name) else {
        return Ok(None);
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| ExtractError::MalformedDocument {
            format: "spreadsheet",
            reason: format!("unreadable archive entry '{name}': {e}"),
        })?;
    Ok(Some(content))
}

fn parse_shared_strings(xml: &str) -> Vec<String> {
    SHARED_STRING_RE
        .captures_iter(xml)
        .map(|captures| unescape_xml(&captures[1]))
        .collect()
}

fn parse_sheet(xml: &str, shared_strings: &[String]) -> Vec<String> {
    ROW_RE
        .captures_iter(xml)
        .filter_map(|row| {
            let cells: Vec<String> = CELL_RE
                .captures_iter(&row[1])
                .map(|cell| {
                    let attrs = &cell[1];
                    let value = cell
                        .get(2)
                        .and_then(|inner| VALUE_RE.captures(inner.as_str()))
                        .map(|v| v[1].to_string())
                        .unwrap_or_default();

                    if attrs.contains(r#"t="s""#) {
                        value
                            .parse::<usize>()
                            .ok()
                            .and_then(|index| shared_strings.get(index))
                            .cloned()
                            .unwrap_or_default()
                    } else {
                        unescape_xml(&value)
                    }
                })
                .collect();

            if cells.iter().all(String::is_empty) {
                None
            } else {
                Some(cells.join("  ").trim_end().to_string())
            }
        })
        .collect()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
