//! Worksheet decoding with encoding and field-delimiter auto-detection.
//!
//! Converts delimited-text exports into JSON row objects, one object per
//! data row, keyed by column header. Cells get light typing (integer,
//! float, boolean) so downstream code sees the mixed scalar types a
//! spreadsheet carries; everything else stays a string. No identifier
//! logic lives here.
//!
//! The inverse direction, [`rows_to_delimited`], re-encodes an output row
//! sequence for download. It is an edge concern: the expansion core only
//! ever sees decoded rows.

use serde_json::{Map, Value};
use std::path::Path;

/// Worksheet decoding error with context.
#[derive(Debug, Clone)]
pub struct SheetError {
    pub line: usize,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(
                    f,
                    "Line {}, column '{}' (value '{}'): {}",
                    self.line, col, val, self.message
                )
            }
            (Some(col), None) => {
                write!(f, "Line {}, column '{}': {}", self.line, col, self.message)
            }
            _ => {
                write!(f, "Line {}: {}", self.line, self.message)
            }
        }
    }
}

impl std::error::Error for SheetError {}

impl SheetError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Result of decoding a worksheet, with detection metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Decoded rows as JSON objects, in sheet order.
    pub rows: Vec<Value>,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used field delimiter.
    pub delimiter: char,
    /// Column headers, in sheet order.
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<String, SheetError> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .or_else(|_| Ok(String::from_utf8_lossy(bytes).to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        _ => {
            // Fallback: try UTF-8 with lossy conversion
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
    .map_err(|e: std::string::FromUtf8Error| SheetError::new(0, format!("Encoding error: {}", e)))
}

/// Detect the field delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Give a raw cell its scalar type.
///
/// Integers and decimal floats become numbers, `true`/`false` become
/// booleans, everything else stays a string. Leading-zero digit strings
/// ("007") stay text: they are identifiers, not quantities.
fn type_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }

    let keeps_leading_zero = raw.len() > 1 && raw.starts_with('0') && !raw.contains('.');
    if !keeps_leading_zero {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Number(n.into());
        }
        if raw.contains('.') {
            if let Some(num) = raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(serde_json::Number::from_f64)
            {
                return Value::Number(num);
            }
        }
    }

    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(raw.to_string())
}

/// Parse worksheet content with an explicit delimiter and return metadata.
pub fn parse_content(
    content: &str,
    delimiter: char,
    encoding: String,
) -> Result<ParseResult, SheetError> {
    let mut lines = content.lines();

    // Get headers from first line
    let header_line = lines
        .next()
        .ok_or_else(|| SheetError::new(1, "Empty worksheet"))?;

    let headers: Vec<String> = header_line
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    if headers.is_empty() {
        return Err(SheetError::new(1, "No headers found"));
    }

    // Parse data rows
    let mut rows = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split(delimiter).collect();
        let mut obj = Map::new();

        for (i, header) in headers.iter().enumerate() {
            let raw_value = values
                .get(i)
                .map(|s| s.trim().trim_matches('"'))
                .unwrap_or("");

            obj.insert(header.clone(), type_cell(raw_value));
        }

        rows.push(Value::Object(obj));
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Decode worksheet bytes.
///
/// The encoding is always auto-detected; the field delimiter is
/// auto-detected unless one is given.
///
/// # Example
/// ```ignore
/// let result = parse_bytes(b"name,SERIAL_NUMBER\nwidget,S1", None)?;
/// assert_eq!(result.delimiter, ',');
/// assert_eq!(result.rows.len(), 1);
/// ```
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> Result<ParseResult, SheetError> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    parse_content(&content, delimiter, encoding)
}

/// Decode a worksheet file, auto-detecting what is not specified.
pub fn parse_file<P: AsRef<Path>>(
    path: P,
    delimiter: Option<char>,
) -> Result<ParseResult, SheetError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| SheetError::new(0, format!("Cannot read file: {}", e)))?;

    parse_bytes(&bytes, delimiter)
}

/// Text form of a cell for re-encoding.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Re-encode an output row sequence as delimited text.
///
/// Headers come from the first row's columns, in order. Non-ASCII
/// delimiters fall back to a comma: the output field separator is a file
/// format concern, unrelated to the identifier delimiters inside cells.
pub fn rows_to_delimited(rows: &[Value], delimiter: char) -> Result<String, SheetError> {
    let first = match rows.first().and_then(Value::as_object) {
        Some(obj) => obj,
        None => return Ok(String::new()),
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let sep = if delimiter.is_ascii() { delimiter as u8 } else { b',' };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(sep)
        .from_writer(Vec::new());

    writer
        .write_record(&headers)
        .map_err(|e| SheetError::new(1, format!("Cannot encode headers: {}", e)))?;

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .ok_or_else(|| SheetError::new(i + 2, "Row is not an object"))?;
        let record: Vec<String> = headers.iter().map(|h| cell_text(obj.get(h))).collect();
        writer
            .write_record(&record)
            .map_err(|e| SheetError::new(i + 2, format!("Cannot encode row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SheetError::new(0, format!("Cannot flush output: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| SheetError::new(0, format!("Encoding error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_sheet() {
        let sheet = "name;SERIAL_NUMBER\nwidget;S1\ngadget;S2";
        let result = parse_bytes(sheet.as_bytes(), Some(';')).unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["name"], "widget");
        assert_eq!(result.rows[0]["SERIAL_NUMBER"], "S1");
        assert_eq!(result.rows[1]["SERIAL_NUMBER"], "S2");
    }

    #[test]
    fn test_cell_typing() {
        let sheet = "label;qty;ratio;active\nthing;42;0.5;true";
        let result = parse_bytes(sheet.as_bytes(), Some(';')).unwrap();

        let row = &result.rows[0];
        assert_eq!(row["label"], "thing");
        assert_eq!(row["qty"], 42);
        assert_eq!(row["ratio"], 0.5);
        assert_eq!(row["active"], true);
    }

    #[test]
    fn test_leading_zeros_stay_text() {
        let sheet = "code\n007";
        let result = parse_bytes(sheet.as_bytes(), Some(',')).unwrap();
        assert_eq!(result.rows[0]["code"], "007");
    }

    #[test]
    fn test_quoted_values() {
        let sheet = r#"name;value
"widget";"Hello World""#;
        let result = parse_bytes(sheet.as_bytes(), Some(';')).unwrap();

        assert_eq!(result.rows[0]["name"], "widget");
        assert_eq!(result.rows[0]["value"], "Hello World");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let sheet = "a;b\n1;2\n\n3;4\n";
        let result = parse_bytes(sheet.as_bytes(), Some(';')).unwrap();

        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_missing_values_become_empty_cells() {
        let sheet = "a;b;c\n1;;3";
        let result = parse_bytes(sheet.as_bytes(), Some(';')).unwrap();

        assert_eq!(result.rows[0]["a"], 1);
        assert_eq!(result.rows[0]["b"], "");
        assert_eq!(result.rows[0]["c"], 3);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let sheet = "a;b\n1;2;3;4";
        let result = parse_bytes(sheet.as_bytes(), Some(';')).unwrap();

        assert_eq!(result.rows[0]["a"], 1);
        assert_eq!(result.rows[0]["b"], 2);
    }

    #[test]
    fn test_error_message_format() {
        let err = SheetError::new(5, "Invalid value")
            .with_column("SERIAL_NUMBER")
            .with_value("abc");

        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'SERIAL_NUMBER'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_empty_sheet_error() {
        let result = parse_bytes(b"", Some(';'));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.message.contains("Empty"));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_auto_parse() {
        let sheet = "name;SERIAL_NUMBER\nwidget;S1\ngadget;S2";
        let result = parse_bytes(sheet.as_bytes(), None).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.headers, vec!["name", "SERIAL_NUMBER"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert!(decoded.contains("Soci"));
    }

    #[test]
    fn test_reencode_preserves_column_order() {
        let sheet = "name,SERIAL_NUMBER,site\nwidget,S1,east";
        let result = parse_bytes(sheet.as_bytes(), Some(',')).unwrap();

        let out = rows_to_delimited(&result.rows, ',').unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("name,SERIAL_NUMBER,site"));
        assert_eq!(lines.next(), Some("widget,S1,east"));
    }

    #[test]
    fn test_reencode_empty_rows() {
        assert_eq!(rows_to_delimited(&[], ',').unwrap(), "");
    }

    #[test]
    fn test_reencode_quotes_cells_with_delimiter() {
        let rows = vec![serde_json::json!({ "SERIAL_NUMBER": "A1,A2" })];
        let out = rows_to_delimited(&rows, ',').unwrap();
        assert!(out.contains("\"A1,A2\""));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "SERIAL_NUMBER\nS1").unwrap();

        let result = parse_file(&path, None).unwrap();
        assert_eq!(result.rows.len(), 1);
    }
}
