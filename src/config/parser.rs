//! YAML parser for pipeline definitions
//!
//! Parses, substitutes and validates pipeline YAML files.

use super::template::Variables;
use super::types::{PipelineConfig, SourceConfig};
use crate::error::{Error, Result};
use crate::types::JsonValue;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default pipeline file looked up by the CLI
pub const DEFAULT_CONFIG_PATH: &str = "pipeline.yml";

/// Load a pipeline from `path`, substituting variables from `vars` and
/// the process environment
pub fn load_pipeline(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    load_pipeline_with_env(path, std::env::vars())
}

/// Load a pipeline from `path` with an explicit environment
pub fn load_pipeline_with_env<I>(path: impl AsRef<Path>, env: I) -> Result<PipelineConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read pipeline file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;

    debug!("Loaded pipeline file {}", path.display());
    parse_pipeline(&content, env)
}

/// Parse a pipeline from a YAML string.
///
/// `${NAME}` tokens in string values are replaced from the `vars`
/// mapping, with `env` taking precedence.
pub fn parse_pipeline<I>(yaml: &str, env: I) -> Result<PipelineConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    let raw: JsonValue = serde_yaml::from_str(yaml)?;
    let JsonValue::Object(root) = raw else {
        return Err(Error::config("Pipeline YAML must have a mapping root"));
    };

    let vars = root
        .get("vars")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default();
    let variables = Variables::from_vars(&vars).with_env(env);
    let resolved = variables.render_value(&JsonValue::Object(root));

    let config: PipelineConfig = serde_json::from_value(resolved)
        .map_err(|e| Error::config(format!("Invalid pipeline config: {e}")))?;

    validate_pipeline(&config)?;
    Ok(config)
}

/// Structural checks that make a pipeline unusable
fn validate_pipeline(config: &PipelineConfig) -> Result<()> {
    unique_names("source", config.sources.iter().map(SourceConfig::name))?;
    unique_names("target", config.targets.iter().map(|t| t.name()))?;
    unique_names("job", config.jobs.iter().map(|j| j.name.as_str()))?;

    for source in &config.sources {
        if let SourceConfig::Api {
            name,
            url,
            api,
            endpoint,
            ..
        } = source
        {
            let by_reference = api.is_some() && endpoint.is_some();
            if url.is_none() && !by_reference {
                return Err(Error::config(format!(
                    "API source '{name}' needs either 'url' or both 'api' and 'endpoint'"
                )));
            }
        }
    }

    for (name, api) in &config.apis {
        if api.base_url.is_empty() {
            return Err(Error::config(format!("API '{name}' base_url cannot be empty")));
        }
    }

    Ok(())
}

fn unique_names<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(Error::config(format!("{kind} name cannot be empty")));
        }
        if !seen.insert(name) {
            return Err(Error::config(format!("Duplicate {kind} name: {name}")));
        }
    }
    Ok(())
}
