//! Response body helpers
//!
//! Dotted-path lookup, record coalescing and cursor extraction.

use crate::types::{JsonObject, JsonValue, Records};

/// Resolve a dotted path (`"data.items"`) inside a JSON value.
///
/// A leading `$.` is accepted and ignored. Returns `None` when a segment is
/// missing or the walk reaches something that is not an object. An empty
/// path resolves to the value itself.
pub fn lookup_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match current {
            JsonValue::Object(map) => current = map.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Turn one page payload into a list of records.
///
/// When `records_path` is set and resolves, that value is used. Otherwise a
/// top-level array is taken as is, and an object contributes its first
/// array-valued field or, failing that, itself as a single record.
/// Non-object array items are wrapped as `{"value": item}`. Scalars and
/// null yield no records.
pub fn coalesce_records(body: &JsonValue, records_path: Option<&str>) -> Records {
    let target = records_path
        .filter(|p| !p.is_empty())
        .and_then(|p| lookup_path(body, p));

    match target {
        Some(value) => records_from_value(value),
        None => fallback_records(body),
    }
}

fn fallback_records(body: &JsonValue) -> Records {
    match body {
        JsonValue::Object(map) => match map.values().find(|v| v.is_array()) {
            Some(array) => records_from_value(array),
            None => vec![map.clone()],
        },
        other => records_from_value(other),
    }
}

fn records_from_value(value: &JsonValue) -> Records {
    match value {
        JsonValue::Array(items) => items.iter().map(wrap_record).collect(),
        JsonValue::Object(map) => vec![map.clone()],
        _ => Vec::new(),
    }
}

fn wrap_record(item: &JsonValue) -> JsonObject {
    match item {
        JsonValue::Object(map) => map.clone(),
        other => {
            let mut map = JsonObject::new();
            map.insert("value".to_string(), other.clone());
            map
        }
    }
}

/// Extract the next cursor from a response body.
///
/// Only strings and integers count as cursors; an empty string, null, or a
/// missing path means there are no more pages.
pub fn next_cursor(body: &JsonValue, cursor_path: Option<&str>) -> Option<String> {
    let path = cursor_path.filter(|p| !p.is_empty())?;
    match lookup_path(body, path)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}
