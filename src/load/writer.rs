//! File writers

use super::types::{record_count, LoadResult};
use crate::error::{Result, ResultExt};
use crate::types::{FileFormat, JsonObject, JsonValue};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Write `data` to `path`, creating parent directories as needed
pub fn write_file(data: &JsonValue, path: &Path, format: FileFormat) -> Result<LoadResult> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let written = match format {
        FileFormat::Json => write_json(data, path)?,
        FileFormat::Csv => match write_csv(data, path)? {
            0 => return Ok(LoadResult::success("No data to write", 0)),
            n => n,
        },
        FileFormat::Jsonl => write_jsonl(data, path)?,
    };

    debug!("Wrote {} records to {}", written, path.display());
    Ok(LoadResult::success(
        format!("Data loaded to {}", path.display()),
        written,
    ))
}

fn write_json(data: &JsonValue, path: &Path) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(record_count(data))
}

fn write_jsonl(data: &JsonValue, path: &Path) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    let items: Vec<&JsonValue> = match data {
        JsonValue::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    for item in &items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(items.len())
}

/// CSV output: only object rows, header is the sorted union of keys.
///
/// Returns 0 without touching the file when there are no rows.
fn write_csv(data: &JsonValue, path: &Path) -> Result<usize> {
    let rows: Vec<&JsonObject> = match data {
        JsonValue::Array(items) => items.iter().filter_map(JsonValue::as_object).collect(),
        JsonValue::Object(row) => vec![row],
        _ => Vec::new(),
    };
    if rows.is_empty() {
        return Ok(0);
    }

    let header: Vec<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&header)?;
    for row in &rows {
        writer.write_record(header.iter().map(|key| cell(row.get(*key))))?;
    }
    writer.flush()?;

    Ok(rows.len())
}

/// One CSV cell; strings unquoted, nested values as JSON text
fn cell(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
