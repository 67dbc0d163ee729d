//! Common types used throughout Solidafy ETL
//!
//! This module contains shared type definitions, type aliases,
//! and utility helpers used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// One record: an insertion-ordered mapping of field name to JSON value
pub type Record = JsonObject;

/// An ordered record set
pub type Records = Vec<Record>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method used when loading into an API target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    GET,
    #[default]
    POST,
    PUT,
    PATCH,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(Self::GET),
            "POST" => Ok(Self::POST),
            "PUT" => Ok(Self::PUT),
            "PATCH" => Ok(Self::PATCH),
            other => Err(Error::invalid_value(
                "method",
                format!("Unsupported HTTP method: {other}"),
            )),
        }
    }
}

// ============================================================================
// Source / Target Kinds
// ============================================================================

/// Where records are extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Local file (or inline JSON payload)
    File,
    /// Database (placeholder)
    Database,
    /// REST API
    Api,
}

impl SourceKind {
    /// Name used on the wire and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Database => "database",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "database" => Ok(Self::Database),
            "api" => Ok(Self::Api),
            other => Err(Error::invalid_value(
                "type",
                format!("Invalid source type: {other}"),
            )),
        }
    }
}

/// Where records are loaded to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Local file
    File,
    /// Database (placeholder)
    Database,
    /// REST API
    Api,
}

impl FromStr for TargetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "database" => Ok(Self::Database),
            "api" => Ok(Self::Api),
            other => Err(Error::invalid_value(
                "type",
                format!("Invalid target type: {other}"),
            )),
        }
    }
}

// ============================================================================
// File Format
// ============================================================================

/// Supported file formats for extraction and loading
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// A JSON object or array of objects
    #[default]
    Json,
    /// Comma-separated values with a header row
    Csv,
    /// JSON Lines (one object per line)
    #[serde(alias = "ndjson")]
    Jsonl,
}

impl FileFormat {
    /// Lowercase name of the format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            other => Err(Error::invalid_value(
                "format",
                format!("Unsupported format: {other}"),
            )),
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Leniently coerce a JSON value to an integer.
///
/// Accepts integers, floats with no fractional part, and numeric strings
/// (surrounding whitespace ignored, `"2.0"` allowed). Booleans, null,
/// arrays, objects and anything unparsable yield `None`.
pub fn try_parse_int(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral_f64)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

/// Leniently coerce a JSON value to a float (numbers and numeric strings)
pub fn try_parse_float(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Render a scalar JSON value as a query-string value
pub fn param_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Convert a JSON object into string query parameters
pub fn object_to_params(obj: &JsonObject) -> StringMap {
    obj.iter()
        .map(|(k, v)| (k.clone(), param_value(v)))
        .collect()
}

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
