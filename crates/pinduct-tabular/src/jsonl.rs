//! JSONL ingest: one row per line.
//!
//! Every non-blank line that does not start with `#` must be a JSON object.
//! Errors carry the 1-based line number.

use serde_json::{Map, Value};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One record: column name to cell value.
pub type Row = Map<String, Value>;

/// Read rows from a JSONL reader.
pub fn read_rows(reader: impl BufRead) -> Result<Vec<Row>, JsonlError> {
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| JsonlError::Io(line_no + 1, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| JsonlError::Parse(line_no + 1, e.to_string()))?;
        match value {
            Value::Object(row) => rows.push(row),
            other => {
                return Err(JsonlError::Parse(
                    line_no + 1,
                    format!("expected a JSON object, got {}", kind_name(&other)),
                ));
            }
        }
    }
    Ok(rows)
}

/// Read rows from a JSONL file path.
pub fn read_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<Row>, JsonlError> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).map_err(|e| JsonlError::Io(0, format!("{}: {e}", path.display())))?;
    validate_bytes(path, &bytes)?;
    read_rows(BufReader::new(bytes.as_slice()))
}

fn validate_bytes(path: &Path, bytes: &[u8]) -> Result<(), JsonlError> {
    if bytes.contains(&0) {
        return Err(JsonlError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    if std::str::from_utf8(bytes).is_err() {
        return Err(JsonlError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        )));
    }
    Ok(())
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Errors from JSONL ingest.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("line {0}: I/O error: {1}")]
    Io(usize, String),

    #[error("line {0}: parse error: {1}")]
    Parse(usize, String),

    #[error("corrupted input: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "pinduct-jsonl-{prefix}-{}-{unique}.jsonl",
            std::process::id()
        ))
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let text = "# header\n{\"a\": 1}\n\n   \n{\"a\": 2, \"b\": \"x\"}\n";
        let rows = read_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["b"], Value::from("x"));
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let text = "{\"a\": 1}\n# ok\n{\"a\": \n";
        match read_rows(text.as_bytes()) {
            Err(JsonlError::Parse(line, _)) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn non_object_lines_are_rejected() {
        let err = read_rows("[1, 2]\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, got an array"));
    }

    #[test]
    fn rejects_nul_payload() {
        let path = temp_path("nul");
        fs::write(&path, b"{\"a\": 1}\n\0garbage").expect("fixture should write");
        match read_rows_from_path(&path) {
            Err(JsonlError::Corrupt(message)) => assert!(message.contains("contains NUL")),
            other => panic!("expected corrupt input error, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = temp_path("missing");
        assert!(matches!(
            read_rows_from_path(&path),
            Err(JsonlError::Io(0, _))
        ));
    }
}
