//! Line-level parser for app export files.
//!
//! Exports are comma-delimited with optional double-quoted fields. Quotes
//! only toggle the "inside quotes" state; doubled quotes are not treated as
//! escapes, and an unclosed quote runs to the end of the line.

/// Split one line into trimmed fields
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Parsed header line with column lookup by name
#[derive(Clone, Debug)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn parse(line: &str) -> Self {
        Header {
            columns: parse_line(line),
        }
    }

    /// Index of the first column with exactly this name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.is_empty())
    }
}

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Split file content into header and data lines
///
/// A leading byte-order mark and surrounding whitespace are trimmed first,
/// blank lines are dropped. Returns None for an empty file.
pub fn split_lines(text: &str) -> Option<(Header, Vec<&str>)> {
    let mut lines = text.trim_start_matches(BYTE_ORDER_MARK).trim().lines();
    let header = Header::parse(lines.next()?);
    if header.is_empty() {
        return None;
    }

    let rows = lines.filter(|l| !l.trim().is_empty()).collect();
    Some((header, rows))
}
