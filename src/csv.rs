//! CSV codec
//!
//! Comma-separated, double-quote-delimited, one header row, `\n` line
//! separators. Export quotes every field and doubles internal quotes.
//! The parser is forgiving about what it accepts (bare unquoted fields,
//! CRLF endings) but reports malformed lines instead of guessing, so the
//! import boundary can skip them.

/// Quote a field for output, doubling any internal quotes.
pub fn escape_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render one CSV line (no trailing newline).
pub fn to_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse one CSV line into fields. Returns `None` for malformed lines
/// (an unterminated quote, or stray text after a closing quote).
pub fn parse_line(line: &str) -> Option<Vec<String>> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    // true once the current field closed its quotes; only a comma may follow
    let mut field_closed = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                    field_closed = true;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                ',' => {
                    fields.push(std::mem::take(&mut current));
                    field_closed = false;
                }
                '"' => {
                    if field_closed || !current.is_empty() {
                        return None;
                    }
                    in_quotes = true;
                }
                _ => {
                    if field_closed {
                        return None;
                    }
                    current.push(c);
                }
            }
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}

/// A parsed CSV document: header row, data rows, and how many lines were
/// skipped as malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub skipped: usize,
}

/// Parse a whole document. Line 0 is the header; blank lines are ignored;
/// malformed data lines are counted and skipped rather than failing the
/// whole parse.
pub fn parse_document(text: &str) -> Result<Document, String> {
    let mut lines = text.split('\n').filter(|l| !l.trim().is_empty());

    let header_line = lines.next().ok_or("CSV file is empty")?;
    let header =
        parse_line(header_line).ok_or_else(|| "CSV header row is malformed".to_string())?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    for line in lines {
        match parse_line(line) {
            Some(fields) => rows.push(fields),
            None => skipped += 1,
        }
    }

    Ok(Document { header, rows, skipped })
}
