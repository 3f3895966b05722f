//! Delimited-text tables rendered as aligned plain text.
//!
//! The model reads the upload as part of the prompt, so the table is laid
//! out in aligned columns rather than passed through as raw comma soup.

use crate::error::ExtractError;

/// Parses comma-delimited text and renders it column-aligned.
pub fn render_delimited(content: &str) -> Result<String, ExtractError> {
    let rows: Vec<Vec<String>> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(split_row)
        .collect();

    if rows.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; column_count];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let padded: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
                .collect();
            padded.join("  ").trim_end().to_string()
        })
        .collect();

    Ok(lines.join("\n"))
}

/// Splits one line on commas, honoring double-quoted cells.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                // Escaped quote inside a quoted cell.
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());

    cells
}
