//! Job runner
//!
//! Runs a named pipeline job: extract, validate before the transform,
//! transform, validate after the transform, load.

mod types;

pub use types::JobReport;

use crate::config::{PipelineConfig, ResolvedValidation};
use crate::error::{Error, Result};
use crate::extract::ExtractOrchestrator;
use crate::load::{record_count, Loader};
use crate::pagination::PageFetcher;
use crate::transform::Transformer;
use crate::types::JsonValue;
use crate::validation::{validate, Severity};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs jobs from one pipeline configuration
#[derive(Debug, Clone)]
pub struct JobRunner {
    config: PipelineConfig,
    extractor: ExtractOrchestrator,
    loader: Loader,
    transformer: Transformer,
}

impl JobRunner {
    /// Create a runner using HTTP for API sources and targets
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config,
            extractor: ExtractOrchestrator::http()?,
            loader: Loader::http()?,
            transformer: Transformer::new(),
        })
    }

    /// Fetch API pages through `fetcher` instead of HTTP
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.extractor = ExtractOrchestrator::new(fetcher);
        self
    }

    /// Use `transformer` (with its registered operators and aggregates)
    #[must_use]
    pub fn with_transformer(mut self, transformer: Transformer) -> Self {
        self.transformer = transformer;
        self
    }

    /// Get the pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the job named `name`
    pub async fn run(&self, name: &str) -> Result<JobReport> {
        let start = Instant::now();
        let job = self.config.job(name)?;
        info!("Starting job: {}", name);

        let extract = job
            .extract
            .as_ref()
            .ok_or_else(|| Error::config(format!("Job '{name}' missing extract section")))?;
        let load = job
            .load
            .as_ref()
            .ok_or_else(|| Error::config(format!("Job '{name}' missing load section")))?;

        let validation = job
            .validate
            .as_ref()
            .map(|v| self.config.validation(v))
            .transpose()?;
        let load_spec = self.config.load_spec(load)?;

        let mut data = self
            .extractor
            .extract(&self.config.extract_spec(extract)?)
            .await?;
        let records_extracted = record_count(&data);
        let mut warnings = Vec::new();

        if let Some(v) = validation.as_ref().filter(|v| v.phase.before()) {
            warnings.extend(check(&data, v, "before_transform")?);
        }

        if let Some(transform) = &job.transform {
            let ops = self.config.transform_operations(&transform.pipeline)?;
            data = self.transformer.transform(data, &ops)?;
        }

        if let Some(v) = validation.as_ref().filter(|v| v.phase.after()) {
            warnings.extend(check(&data, v, "after_transform")?);
        }

        let result = self.loader.load(&data, &load_spec).await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Job {} finished in {}ms ({} records extracted)",
            name, duration_ms, records_extracted
        );

        Ok(JobReport {
            status: "ok",
            job: name.to_string(),
            records_extracted,
            warnings,
            result,
            duration_ms,
        })
    }
}

/// Validate `data`; failures abort under `error` severity and are
/// returned as warnings under `warn`
fn check(data: &JsonValue, validation: &ResolvedValidation, phase: &str) -> Result<Vec<String>> {
    let result = validate(data, &validation.rules);
    if result.valid {
        return Ok(Vec::new());
    }

    match validation.severity {
        Severity::Error => Err(Error::Validation {
            errors: result.errors,
        }),
        Severity::Warn => {
            for error in &result.errors {
                warn!("Validation ({}): {}", phase, error);
            }
            Ok(result.errors)
        }
    }
}
