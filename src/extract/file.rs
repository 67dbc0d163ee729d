//! File readers
//!
//! JSON, CSV and JSON Lines, plus inline JSON payloads.

use crate::error::{Error, Result};
use crate::types::{FileFormat, JsonObject, JsonValue};
use std::path::Path;
use tracing::debug;

/// Read records from a file.
///
/// JSON files must hold an object or an array of objects. CSV values are
/// kept as strings and blank rows are skipped. When `path` does not exist
/// but parses as a JSON object or array, that payload is used instead.
pub fn extract_file(path: &Path, format: FileFormat) -> Result<JsonValue> {
    if !path.exists() {
        if let Some(inline) = path.to_str().and_then(parse_inline) {
            debug!("Using inline JSON payload instead of a file path");
            return Ok(inline);
        }
        return Err(Error::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let text = std::fs::read_to_string(path)?;
    match format {
        FileFormat::Json => parse_json_records(&text),
        FileFormat::Csv => parse_csv(&text),
        FileFormat::Jsonl => parse_jsonl(&text),
    }
}

/// Load data from a JSON file path or an inline JSON string.
///
/// The root must be an object or an array.
pub fn load_data(source: &str) -> Result<JsonValue> {
    let path = Path::new(source);
    let text = if path.is_file() {
        std::fs::read_to_string(path)?
    } else {
        source.to_string()
    };

    match serde_json::from_str::<JsonValue>(&text) {
        Ok(value @ (JsonValue::Object(_) | JsonValue::Array(_))) => Ok(value),
        Ok(_) => Err(Error::invalid_data(
            "JSON root must be an object or array",
        )),
        Err(e) if path.is_file() => Err(e.into()),
        Err(_) => Err(Error::invalid_data(format!("Invalid data source: {source}"))),
    }
}

fn parse_inline(text: &str) -> Option<JsonValue> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    parse_json_records(text).ok()
}

fn parse_json_records(text: &str) -> Result<JsonValue> {
    match serde_json::from_str::<JsonValue>(text)? {
        value @ JsonValue::Object(_) => Ok(value),
        JsonValue::Array(items) if items.iter().all(JsonValue::is_object) => {
            Ok(JsonValue::Array(items))
        }
        JsonValue::Array(_) => Err(Error::invalid_data(
            "JSON array must contain only objects",
        )),
        _ => Err(Error::invalid_data(
            "JSON root must be an object or an array of objects",
        )),
    }
}

fn parse_csv(text: &str) -> Result<JsonValue> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: JsonObject = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = record
                    .get(i)
                    .map_or(JsonValue::Null, |v| JsonValue::String(v.to_string()));
                (header.to_string(), value)
            })
            .collect();
        rows.push(JsonValue::Object(row));
    }

    Ok(JsonValue::Array(rows))
}

fn parse_jsonl(text: &str) -> Result<JsonValue> {
    let mut records = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: JsonValue = serde_json::from_str(line).map_err(|e| {
            Error::invalid_data(format!("Failed to parse JSONL at line {}: {e}", line_num + 1))
        })?;
        if !value.is_object() {
            return Err(Error::invalid_data(format!(
                "JSONL line {} is not an object",
                line_num + 1
            )));
        }
        records.push(value);
    }

    Ok(JsonValue::Array(records))
}

/// Informational record returned for database sources
pub fn extract_database(connection_string: &str) -> JsonValue {
    serde_json::json!([{
        "message": "Database extraction not yet implemented",
        "connection_string": connection_string,
        "note": "Install database-specific drivers to enable this feature",
    }])
}
