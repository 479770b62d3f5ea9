//! Minimal CSV reading and writing for exports and registry imports.
//!
//! Fields are comma separated. Quoted fields may contain commas and doubled
//! quotes, but not line breaks.

use std::collections::HashMap;

/// Quotes `value` when it contains a comma, quote or line break.
pub fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One output line, newline included.
pub fn row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = fields
        .into_iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// A data row keyed by lower-cased header name.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based line number in the source, header included.
    pub line: usize,
    fields: HashMap<String, String>,
}

impl Record {
    /// Trimmed value of `column`, or `None` when missing or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Parses `text` with the first non-empty line as the header. Blank lines are
/// skipped. A leading byte-order mark is ignored.
pub fn parse(text: &str) -> Result<Vec<Record>, String> {
    let text = text.trim_start_matches('\u{feff}');
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (_, header_line) = lines.next().ok_or("CSV is empty")?;
    let headers: Vec<String> = split_line(header_line)
        .into_iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err("CSV header row is empty".into());
    }

    Ok(lines
        .map(|(idx, line)| {
            let values = split_line(line);
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
                .collect();
            Record { line: idx + 1, fields }
        })
        .collect())
}

fn split_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => result.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    result.push(current);
    result
}
