use std::path::Path;

use serde_json::Value;

use crate::core::error::DocumentError;

pub const DEFAULT_PREVIEW_CHARS: usize = 500;

const MISSING_CELL: &str = "NaN";
const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Delimited { delimiter: char },
    Json,
}

impl DocumentKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "txt" | "text" | "md" => Some(Self::PlainText),
            "csv" => Some(Self::Delimited { delimiter: ',' }),
            "tsv" => Some(Self::Delimited { delimiter: '\t' }),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "text/plain" | "text/markdown" => Some(Self::PlainText),
            "text/csv" => Some(Self::Delimited { delimiter: ',' }),
            "text/tab-separated-values" => Some(Self::Delimited { delimiter: '\t' }),
            "application/json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    text: String,
    source: Option<String>,
}

impl DocumentContext {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    pub fn from_bytes(kind: DocumentKind, bytes: &[u8]) -> Result<Self, DocumentError> {
        let raw = std::str::from_utf8(bytes).map_err(|error| DocumentError::Utf8 {
            message: error.to_string(),
        })?;

        let text = match kind {
            DocumentKind::PlainText => raw.to_string(),
            DocumentKind::Delimited { delimiter } => {
                render_table(&parse_delimited(raw, delimiter)?)?
            }
            DocumentKind::Json => render_json(raw)?,
        };

        Ok(Self::from_text(text))
    }

    /// Reads a file, choosing the rendering from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|value| value.to_str())
            .unwrap_or_default();
        let kind =
            DocumentKind::from_extension(extension).ok_or_else(|| DocumentError::Unsupported {
                extension: extension.to_string(),
            })?;

        let bytes = std::fs::read(path).map_err(|error| DocumentError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;

        let mut document = Self::from_bytes(kind, &bytes)?;
        document.source = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        Ok(document)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// First `max_chars` characters, with `...` appended when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &self.text[..cut]),
            None => self.text.clone(),
        }
    }
}

fn render_json(raw: &str) -> Result<String, DocumentError> {
    let value: Value = serde_json::from_str(raw).map_err(|error| DocumentError::Json {
        message: error.to_string(),
    })?;
    serde_json::to_string_pretty(&value).map_err(|error| DocumentError::Json {
        message: error.to_string(),
    })
}

struct Record {
    line: usize,
    fields: Vec<String>,
}

/// Splits delimited text into records, honouring double-quoted fields.
fn parse_delimited(raw: &str, delimiter: char) -> Result<Vec<Record>, DocumentError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut quote_line = 1;
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut record));
                line += 1;
                record_line = line;
            }
            _ if ch == delimiter => record.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(DocumentError::Delimited {
            line: quote_line,
            message: "unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record_line, record);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Record>, line: usize, fields: Vec<String>) {
    let blank = fields.len() == 1 && fields[0].is_empty();
    if !blank {
        records.push(Record { line, fields });
    }
}

fn render_table(records: &[Record]) -> Result<String, DocumentError> {
    let Some((header, rows)) = records.split_first() else {
        return Ok(String::new());
    };
    let header = &header.fields;

    if let Some(row) = rows.iter().find(|row| row.fields.len() > header.len()) {
        return Err(DocumentError::Delimited {
            line: row.line,
            message: format!(
                "expected at most {} fields, found {}",
                header.len(),
                row.fields.len()
            ),
        });
    }
    let rows: Vec<&[String]> = rows.iter().map(|row| row.fields.as_slice()).collect();

    let index_width = rows.len().saturating_sub(1).to_string().len();
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(column, name)| {
            rows.iter()
                .map(|row| table_cell(row, column).chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut header_line = " ".repeat(index_width);
    for (name, &width) in header.iter().zip(&widths) {
        header_line.push_str(COLUMN_GAP);
        header_line.push_str(&format!("{name:>width$}"));
    }
    lines.push(header_line);

    for (index, row) in rows.iter().enumerate() {
        let mut line = format!("{index:<index_width$}");
        for (column, &width) in widths.iter().enumerate() {
            line.push_str(COLUMN_GAP);
            line.push_str(&format!("{:>width$}", table_cell(row, column)));
        }
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

fn table_cell(row: &[String], column: usize) -> String {
    row.get(column)
        .filter(|value| !value.is_empty())
        .cloned()
        .unwrap_or_else(|| MISSING_CELL.to_string())
}
