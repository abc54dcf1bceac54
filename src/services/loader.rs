use crate::models::{Cell, Column, Table, TableError};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file type {0:?}, only CSV or JSON files are allowed")]
    UnsupportedFormat(String),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON is not a table: {0}")]
    InvalidShape(String),

    #[error("Inconsistent table: {0}")]
    Table(#[from] TableError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Picks the format from the file name suffix. Matching is exact, so
    /// `DATA.CSV` is not a CSV file.
    pub fn from_file_name(name: &str) -> Result<Self, LoadError> {
        match Path::new(name).extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Ok(FileFormat::Csv),
            Some("json") => Ok(FileFormat::Json),
            Some(other) => Err(LoadError::UnsupportedFormat(format!(".{other}"))),
            None => Err(LoadError::UnsupportedFormat(String::new())),
        }
    }
}

pub fn load(bytes: &[u8], format: FileFormat) -> Result<Table, LoadError> {
    match format {
        FileFormat::Csv => load_csv(bytes),
        FileFormat::Json => load_json(bytes),
    }
}

fn load_csv(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Ok(Table::from_rows(header, rows)?)
}

/// Accepts either a records array (`[{"col": v}, ...]`) or a columns object
/// (`{"col": [v, ...]}` or `{"col": {"0": v, ...}}`).
fn load_json(bytes: &[u8]) -> Result<Table, LoadError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(records) => load_records(records),
        Value::Object(columns) => load_columns(columns),
        other => Err(LoadError::InvalidShape(format!(
            "expected an array of records or an object of columns, found {}",
            kind(&other)
        ))),
    }
}

fn load_records(records: Vec<Value>) -> Result<Table, LoadError> {
    let mut objects = Vec::with_capacity(records.len());
    let mut header: Vec<String> = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(object) = record else {
            return Err(LoadError::InvalidShape(format!(
                "record {index} is {}, expected an object",
                kind(&record)
            )));
        };
        for key in object.keys() {
            if !header.iter().any(|h| h == key) {
                header.push(key.clone());
            }
        }
        objects.push(object);
    }

    let rows: Vec<Vec<Cell>> = objects
        .into_iter()
        .map(|mut object| {
            header
                .iter()
                .map(|name| object.remove(name).map_or(Cell::Missing, json_cell))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(header, rows)?)
}

fn load_columns(columns: Map<String, Value>) -> Result<Table, LoadError> {
    let all_arrays = columns.values().all(Value::is_array);
    let all_objects = columns.values().all(Value::is_object);

    if all_arrays {
        let longest = columns
            .values()
            .filter_map(Value::as_array)
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                let mut cells: Vec<Cell> = match values {
                    Value::Array(values) => values.into_iter().map(json_cell).collect(),
                    _ => Vec::new(),
                };
                cells.resize(longest, Cell::Missing);
                Column { name, cells }
            })
            .collect();
        return Ok(Table::new(columns)?);
    }

    if all_objects {
        // Rows are aligned by label across columns.
        let mut labels: Vec<String> = Vec::new();
        for values in columns.values().filter_map(Value::as_object) {
            for label in values.keys() {
                if !labels.iter().any(|l| l == label) {
                    labels.push(label.clone());
                }
            }
        }

        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                let mut values = match values {
                    Value::Object(values) => values,
                    _ => Map::new(),
                };
                let cells = labels
                    .iter()
                    .map(|label| values.remove(label).map_or(Cell::Missing, json_cell))
                    .collect();
                Column { name, cells }
            })
            .collect();
        return Ok(Table::new(columns)?);
    }

    Err(LoadError::InvalidShape(
        "column values must all be arrays or all be objects".to_string(),
    ))
}

fn json_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Missing,
        Value::Bool(v) => Cell::Bool(v),
        Value::Number(n) => match n.as_i64() {
            Some(v) => Cell::Int(v),
            None => n.as_f64().map_or(Cell::Missing, Cell::Float),
        },
        Value::String(s) => Cell::Text(s),
        nested @ (Value::Array(_) | Value::Object(_)) => Cell::Text(nested.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
