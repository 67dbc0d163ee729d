//! Load types

use crate::types::{FileFormat, JsonValue, Method, StringMap};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Where to load records into
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSpec {
    File {
        path: PathBuf,
        format: FileFormat,
    },
    /// Database placeholder
    Database {
        connection_string: String,
    },
    Api {
        url: String,
        method: Method,
        headers: StringMap,
        timeout: Option<Duration>,
    },
}

impl LoadSpec {
    /// File target
    pub fn file(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self::File {
            path: path.into(),
            format,
        }
    }

    /// Database target
    pub fn database(connection_string: impl Into<String>) -> Self {
        Self::Database {
            connection_string: connection_string.into(),
        }
    }

    /// API target without extra headers
    pub fn api(url: impl Into<String>, method: Method) -> Self {
        Self::Api {
            url: url.into(),
            method,
            headers: StringMap::new(),
            timeout: None,
        }
    }
}

/// Outcome status of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Success,
    NotImplemented,
}

/// Summary of a load, printed as JSON by the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadResult {
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    /// Number of records written or sent
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LoadResult {
    /// Successful load of `records` records
    pub fn success(message: impl Into<String>, records: usize) -> Self {
        Self {
            status: LoadStatus::Success,
            status_code: None,
            message: message.into(),
            response: None,
            connection_string: None,
            records,
            note: None,
        }
    }

    /// Render as a JSON object
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

/// Records counted for a payload: list length, or 1 for anything else
pub fn record_count(data: &JsonValue) -> usize {
    match data {
        JsonValue::Array(items) => items.len(),
        _ => 1,
    }
}
