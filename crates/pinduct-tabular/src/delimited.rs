//! CSV ingest: a header line, then one row per record.
//!
//! Cells are typed the way a dataframe reader would: empty cells are
//! missing, integers stay integers, other numbers become floats,
//! `true`/`false` become booleans, and everything else is text.

use crate::error::TabularError;
use crate::jsonl::Row;
use serde_json::{Number, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read rows from CSV text with a header line.
pub fn read_csv_rows(reader: impl Read) -> Result<Vec<Row>, TabularError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.to_string(), parse_cell(cell)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Read rows from a CSV file path.
pub fn read_csv_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<Row>, TabularError> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| TabularError::Csv(0, format!("{}: {e}", path.display())))?;
    read_csv_rows(file)
}

fn parse_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = cell.parse::<f64>() {
        return Number::from_f64(float).map_or(Value::Null, Value::Number);
    }
    match cell {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

fn csv_error(error: csv::Error) -> TabularError {
    let line = error.position().map_or(0, |position| position.line() as usize);
    TabularError::Csv(line, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells_are_typed() {
        let text = "age,rank,color,hit\n31.5,2,red,true\n,3, blue ,False\nnan,1,7th,true\n";
        let rows = read_csv_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["age"], json!(31.5));
        assert_eq!(rows[0]["rank"], json!(2));
        assert_eq!(rows[0]["hit"], json!(true));
        assert_eq!(rows[1]["age"], Value::Null);
        assert_eq!(rows[1]["color"], json!("blue"));
        assert_eq!(rows[1]["hit"], json!(false));
        assert_eq!(rows[2]["age"], Value::Null);
        assert_eq!(rows[2]["color"], json!("7th"));
    }

    #[test]
    fn ragged_records_report_their_line() {
        let text = "a,b\n1,2\n3\n";
        match read_csv_rows(text.as_bytes()) {
            Err(TabularError::Csv(line, _)) => assert_eq!(line, 3),
            other => panic!("expected csv error, got {other:?}"),
        }
    }
}
