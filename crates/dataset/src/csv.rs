//! Minimal CSV codec: comma-separated, double-quote quoting with doubled
//! quotes as escapes, quoted fields may contain commas and newlines.

use insights_core::{InsightsError, InsightsResult};

/// A parsed record plus the 1-based line it started on, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Parse a whole CSV document into a header row and data records.
/// Blank lines between records are skipped.
pub fn parse(text: &str) -> InsightsResult<(Vec<String>, Vec<Record>)> {
    let mut records = parse_records(text)?;
    if records.is_empty() {
        return Err(InsightsError::Parse("empty CSV document".into()));
    }
    let header = records.remove(0).fields;
    Ok((header, records))
}

fn parse_records(text: &str) -> InsightsResult<Vec<Record>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut record_started = false;
    let mut line = 1usize;
    let mut record_line = 1usize;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                record_started = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                record_started = true;
            }
            '\r' => {
                // Swallowed; the following '\n' terminates the record.
            }
            '\n' => {
                line += 1;
                if record_started || !field.is_empty() || !fields.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    records.push(Record {
                        line: record_line,
                        fields: std::mem::take(&mut fields),
                    });
                }
                record_started = false;
                record_line = line;
            }
            _ => {
                field.push(c);
                record_started = true;
            }
        }
    }

    if in_quotes {
        return Err(InsightsError::Parse(format!(
            "unterminated quoted field starting near line {record_line}"
        )));
    }
    if record_started || !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(Record {
            line: record_line,
            fields,
        });
    }

    Ok(records)
}

/// Quote a single field if it contains a comma, quote, or newline.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format one row, without a trailing newline.
pub fn format_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a header plus rows into a full document.
pub fn format_document<S: AsRef<str>>(header: &[&str], rows: &[Vec<S>]) -> String {
    let mut out = format_row(header);
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out
}
