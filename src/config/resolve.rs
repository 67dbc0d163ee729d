//! Job resolution
//!
//! Turns named sources, targets, rule sets and transforms into the specs
//! consumed by the extract, validation, transform and load modules.

use super::types::{
    ExtractOptions, ExtractRef, JobConfig, LoadRef, PipelineConfig, SourceConfig, TargetConfig,
    ValidationRef,
};
use crate::error::{Error, Result};
use crate::extract::{ApiSource, ExtractSpec};
use crate::http::RateLimitConfig;
use crate::load::LoadSpec;
use crate::pagination::PaginationConfig;
use crate::transform::TransformOperations;
use crate::types::{object_to_params, JsonObject, JsonValue, Method};
use crate::validation::{Phase, RuleSet, Severity};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Validation settings of a job, ready to apply
#[derive(Debug, Clone)]
pub struct ResolvedValidation {
    pub rules: RuleSet,
    pub severity: Severity,
    pub phase: Phase,
}

impl PipelineConfig {
    /// Look up a job by name
    pub fn job(&self, name: &str) -> Result<&JobConfig> {
        self.jobs
            .iter()
            .find(|j| j.name == name)
            .ok_or_else(|| Error::JobNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a source by name
    pub fn source(&self, name: &str) -> Result<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| Error::UnknownSource {
                name: name.to_string(),
            })
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Result<&TargetConfig> {
        self.targets
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::UnknownTarget {
                name: name.to_string(),
            })
    }

    /// Names of all jobs, in file order
    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }

    /// Resolve a job's extract step into an [`ExtractSpec`].
    ///
    /// Endpoint sources compose `base_url` and `path`, place endpoint
    /// params under source params and API headers under source headers,
    /// and inherit the endpoint's pagination and rate limit when the
    /// source has none. Job options are applied last.
    pub fn extract_spec(&self, extract: &ExtractRef) -> Result<ExtractSpec> {
        let options = &extract.options;
        match self.source(&extract.source)? {
            SourceConfig::File { path, format, .. } => {
                Ok(ExtractSpec::file(path, options.format.unwrap_or(*format)))
            }
            SourceConfig::Database {
                connection_string, ..
            } => Ok(ExtractSpec::database(connection_string)),
            SourceConfig::Api {
                name,
                url,
                api,
                endpoint,
                params,
                headers,
                pagination,
                rate_limit,
            } => {
                let mut layers = ApiLayers {
                    url: url.clone(),
                    params: params.clone(),
                    headers: headers.clone(),
                    pagination: pagination.clone(),
                    rate_limit: rate_limit.clone(),
                };

                if let (Some(api_name), Some(endpoint_name)) = (api, endpoint) {
                    self.inherit_endpoint(&mut layers, api_name, endpoint_name)?;
                }

                let url = layers
                    .url
                    .ok_or_else(|| Error::config(format!("API source '{name}' missing URL")))?;
                Url::parse(&url)?;

                Ok(ExtractSpec::Api(api_source(
                    url,
                    &layers.params,
                    &layers.headers,
                    layers.pagination.as_ref(),
                    layers.rate_limit.as_ref(),
                    options,
                )))
            }
        }
    }

    fn inherit_endpoint(
        &self,
        layers: &mut ApiLayers,
        api_name: &str,
        endpoint_name: &str,
    ) -> Result<()> {
        let api = self
            .apis
            .get(api_name)
            .ok_or_else(|| Error::config(format!("API not defined: {api_name}")))?;
        let endpoint = api.endpoints.get(endpoint_name).ok_or_else(|| {
            Error::config(format!(
                "Endpoint '{endpoint_name}' not defined in API '{api_name}'"
            ))
        })?;

        layers.url = Some(join_url(&api.base_url, &endpoint.path)?);
        layers.params = overlay(&endpoint.params, &layers.params);
        layers.headers = overlay(&api.headers, &layers.headers);
        if layers.pagination.is_none() {
            layers.pagination.clone_from(&endpoint.pagination);
        }
        if layers.rate_limit.is_none() {
            layers.rate_limit.clone_from(&endpoint.rate_limit);
        }
        Ok(())
    }

    /// Resolve a job's load step into a [`LoadSpec`]; overrides win
    pub fn load_spec(&self, load: &LoadRef) -> Result<LoadSpec> {
        let overrides = &load.overrides;
        match self.target(&load.target)? {
            TargetConfig::File { path, format, .. } => Ok(LoadSpec::file(
                overrides.path.as_deref().unwrap_or(path),
                overrides.format.unwrap_or(*format),
            )),
            TargetConfig::Database {
                connection_string, ..
            } => Ok(LoadSpec::database(
                overrides
                    .connection_string
                    .as_deref()
                    .unwrap_or(connection_string),
            )),
            TargetConfig::Api {
                url,
                method,
                headers,
                ..
            } => {
                let url = overrides.url.as_deref().unwrap_or(url).to_string();
                Url::parse(&url)?;

                let method = match overrides.method.as_deref().or(method.as_deref()) {
                    Some(raw) => raw.parse::<Method>()?,
                    None => Method::POST,
                };

                Ok(LoadSpec::Api {
                    url,
                    method,
                    headers: object_to_params(&overlay(headers, &overrides.headers)),
                    timeout: overrides.timeout.and_then(seconds),
                })
            }
        }
    }

    /// Resolve a job's validation step.
    ///
    /// A rule set missing from `validations` validates nothing.
    pub fn validation(&self, validate: &ValidationRef) -> Result<ResolvedValidation> {
        let rules = match self.validations.get(&validate.ruleset) {
            Some(value) => RuleSet::from_value(value)?,
            None => {
                warn!("Validation ruleset '{}' is not defined", validate.ruleset);
                RuleSet::new()
            }
        };
        let severity = match &validate.severity {
            Some(raw) => raw.parse()?,
            None => Severity::default(),
        };
        let phase = match &validate.phase {
            Some(raw) => raw.parse()?,
            None => Phase::default(),
        };

        Ok(ResolvedValidation {
            rules,
            severity,
            phase,
        })
    }

    /// Parse a named transform pipeline; a missing name means no operations
    pub fn transform_operations(&self, name: &str) -> Result<TransformOperations> {
        match self.transforms.get(name) {
            Some(value) => TransformOperations::from_value(value),
            None => {
                warn!("Transform pipeline '{}' is not defined", name);
                Ok(TransformOperations::new())
            }
        }
    }

    /// Non-fatal findings: dangling references and out-of-range
    /// pagination or rate-limit values
    pub fn check(&self) -> Vec<String> {
        let mut findings = Vec::new();

        for (api_name, api) in &self.apis {
            for (endpoint_name, endpoint) in &api.endpoints {
                let label = format!("apis.{api_name}.endpoints.{endpoint_name}");
                bounds_findings(
                    &mut findings,
                    &label,
                    endpoint.pagination.as_ref(),
                    endpoint.rate_limit.as_ref(),
                );
            }
        }

        for source in &self.sources {
            if let SourceConfig::Api {
                name,
                api,
                endpoint,
                pagination,
                rate_limit,
                ..
            } = source
            {
                let label = format!("sources.{name}");
                bounds_findings(&mut findings, &label, pagination.as_ref(), rate_limit.as_ref());

                if let (Some(api_name), Some(endpoint_name)) = (api, endpoint) {
                    match self.apis.get(api_name) {
                        None => findings.push(format!("{label}: API not defined: {api_name}")),
                        Some(a) if !a.endpoints.contains_key(endpoint_name) => findings.push(
                            format!("{label}: endpoint '{endpoint_name}' not defined in API '{api_name}'"),
                        ),
                        Some(_) => {}
                    }
                }
            }
        }

        for job in &self.jobs {
            let label = format!("jobs.{}", job.name);
            match &job.extract {
                Some(extract) => {
                    if self.source(&extract.source).is_err() {
                        findings.push(format!("{label}: unknown source '{}'", extract.source));
                    }
                    bounds_findings(
                        &mut findings,
                        &label,
                        extract.options.pagination.as_ref(),
                        extract.options.rate_limit.as_ref(),
                    );
                }
                None => findings.push(format!("{label}: missing extract section")),
            }
            match &job.load {
                Some(load) if self.target(&load.target).is_err() => {
                    findings.push(format!("{label}: unknown target '{}'", load.target));
                }
                Some(_) => {}
                None => findings.push(format!("{label}: missing load section")),
            }
            if let Some(validate) = &job.validate {
                if !self.validations.contains_key(&validate.ruleset) {
                    findings.push(format!(
                        "{label}: unknown validation ruleset '{}'",
                        validate.ruleset
                    ));
                }
            }
            if let Some(transform) = &job.transform {
                if !self.transforms.contains_key(&transform.pipeline) {
                    findings.push(format!(
                        "{label}: unknown transform pipeline '{}'",
                        transform.pipeline
                    ));
                }
            }
        }

        findings
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// API settings collected across source and endpoint
struct ApiLayers {
    url: Option<String>,
    params: JsonObject,
    headers: JsonObject,
    pagination: Option<JsonValue>,
    rate_limit: Option<JsonValue>,
}

fn api_source(
    url: String,
    params: &JsonObject,
    headers: &JsonObject,
    pagination: Option<&JsonValue>,
    rate_limit: Option<&JsonValue>,
    options: &ExtractOptions,
) -> ApiSource {
    let pagination = match (pagination, options.pagination.as_ref()) {
        (Some(JsonValue::Object(base)), Some(JsonValue::Object(over))) => {
            Some(JsonValue::Object(overlay(base, over)))
        }
        (base, over) => over.or(base).cloned(),
    };

    let base_rate = rate_limit.and_then(RateLimitConfig::from_mapping);
    let over_rate = options
        .rate_limit
        .as_ref()
        .and_then(RateLimitConfig::from_mapping);
    let rate_limit = match (base_rate, over_rate) {
        (Some(base), Some(over)) => Some(base.merged(&over)),
        (base, over) => over.or(base),
    };

    ApiSource {
        url,
        params: object_to_params(&overlay(params, &options.params)),
        headers: object_to_params(&overlay(headers, &options.headers)),
        pagination: pagination.as_ref().and_then(PaginationConfig::from_mapping),
        rate_limit,
        timeout: options.timeout.and_then(seconds),
    }
}

/// `over` keys replace `base` keys; `base` order is kept
fn overlay(base: &JsonObject, over: &JsonObject) -> JsonObject {
    let mut merged = base.clone();
    for (k, v) in over {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Join a base URL and a relative path with exactly one slash
fn join_url(base: &str, path: &str) -> Result<String> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)?;
    Ok(joined)
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok().filter(|d| !d.is_zero())
}

fn bounds_findings(
    findings: &mut Vec<String>,
    label: &str,
    pagination: Option<&JsonValue>,
    rate_limit: Option<&JsonValue>,
) {
    if let Some(config) = pagination.and_then(PaginationConfig::from_mapping) {
        findings.extend(
            config
                .validate_bounds()
                .into_iter()
                .map(|w| format!("{label}.pagination: {w}")),
        );
    }
    if let Some(config) = rate_limit.and_then(RateLimitConfig::from_mapping) {
        findings.extend(
            config
                .validate_bounds()
                .into_iter()
                .map(|w| format!("{label}.rate_limit: {w}")),
        );
    }
}
