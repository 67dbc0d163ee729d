//! Pipeline configuration types
//!
//! Declarative pipeline definition types for YAML parsing. Pagination and
//! rate-limit blocks stay raw mappings here; they are coerced leniently
//! when a job is resolved.

use crate::types::{FileFormat, JsonObject, JsonValue};
use serde::Deserialize;
use std::collections::BTreeMap;

// ============================================================================
// Pipeline
// ============================================================================

/// Top-level pipeline definition
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Pipeline name
    #[serde(default)]
    pub name: Option<String>,
    /// Values for `${NAME}` substitution
    #[serde(default)]
    pub vars: JsonObject,
    /// Named REST APIs with their endpoints
    #[serde(default)]
    pub apis: BTreeMap<String, ApiConfig>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    /// Named rule sets for the validation step
    #[serde(default)]
    pub validations: BTreeMap<String, JsonValue>,
    /// Named transform pipelines
    #[serde(default)]
    pub transforms: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

// ============================================================================
// APIs
// ============================================================================

/// A REST API shared by several sources
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    pub base_url: String,
    /// Headers sent to every endpoint
    #[serde(default)]
    pub headers: JsonObject,
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointConfig>,
}

/// One endpoint of an [`ApiConfig`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointConfig {
    /// Path relative to the API base URL
    pub path: String,
    #[serde(default)]
    pub params: JsonObject,
    #[serde(default)]
    pub pagination: Option<JsonValue>,
    #[serde(default)]
    pub rate_limit: Option<JsonValue>,
}

// ============================================================================
// Sources and Targets
// ============================================================================

/// Source definition
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    File {
        name: String,
        path: String,
        #[serde(default)]
        format: FileFormat,
    },
    Database {
        name: String,
        #[serde(default)]
        connection_string: String,
    },
    /// Either a direct `url`, or an `api` + `endpoint` reference
    Api {
        name: String,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        api: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        params: JsonObject,
        #[serde(default)]
        headers: JsonObject,
        #[serde(default)]
        pagination: Option<JsonValue>,
        #[serde(default)]
        rate_limit: Option<JsonValue>,
    },
}

impl SourceConfig {
    /// Source name
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Database { name, .. } | Self::Api { name, .. } => name,
        }
    }
}

/// Target definition
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetConfig {
    File {
        name: String,
        path: String,
        #[serde(default)]
        format: FileFormat,
    },
    Database {
        name: String,
        #[serde(default)]
        connection_string: String,
    },
    Api {
        name: String,
        url: String,
        /// POST when unset
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        headers: JsonObject,
    },
}

impl TargetConfig {
    /// Target name
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Database { name, .. } | Self::Api { name, .. } => name,
        }
    }
}

// ============================================================================
// Jobs
// ============================================================================

/// A named extract → validate → transform → load job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extract: Option<ExtractRef>,
    #[serde(default)]
    pub validate: Option<ValidationRef>,
    #[serde(default)]
    pub transform: Option<TransformRef>,
    #[serde(default)]
    pub load: Option<LoadRef>,
}

/// Extract step of a job
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRef {
    /// Source name
    pub source: String,
    #[serde(default)]
    pub options: ExtractOptions,
}

/// Per-job overrides applied on top of the source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractOptions {
    /// Merged over the source params
    #[serde(default)]
    pub params: JsonObject,
    /// Merged over the source headers
    #[serde(default)]
    pub headers: JsonObject,
    /// Overlaid key by key on the source pagination mapping
    #[serde(default)]
    pub pagination: Option<JsonValue>,
    #[serde(default)]
    pub rate_limit: Option<JsonValue>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<f64>,
    /// File format override
    #[serde(default)]
    pub format: Option<FileFormat>,
}

/// Validation step of a job
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationRef {
    /// Name under `validations`
    pub ruleset: String,
    /// `error` (default) or `warn`
    #[serde(default)]
    pub severity: Option<String>,
    /// `before_transform` (default), `after_transform` or `both`
    #[serde(default)]
    pub phase: Option<String>,
}

/// Transform step of a job
#[derive(Debug, Clone, Deserialize)]
pub struct TransformRef {
    /// Name under `transforms`
    pub pipeline: String,
}

/// Load step of a job
#[derive(Debug, Clone, Deserialize)]
pub struct LoadRef {
    /// Target name
    pub target: String,
    #[serde(default)]
    pub overrides: LoadOverrides,
}

/// Per-job overrides applied on top of the target
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadOverrides {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub format: Option<FileFormat>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    /// Merged over the target headers
    #[serde(default)]
    pub headers: JsonObject,
    #[serde(default)]
    pub connection_string: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<f64>,
}
