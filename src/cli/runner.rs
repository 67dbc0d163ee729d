//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::load_pipeline;
use crate::error::Result;
use crate::extract::{load_data, ApiSource, ExtractOrchestrator, ExtractSpec};
use crate::http::RateLimitConfig;
use crate::load::{write_file, LoadSpec, Loader};
use crate::pagination::PaginationConfig;
use crate::run::JobRunner;
use crate::transform::{transform, TransformOperations};
use crate::types::{FileFormat, JsonValue, Method, SourceKind, StringMap, TargetKind};
use crate::validation::{validate, RuleSet};
use serde_json::json;
use std::path::Path;
use tracing::warn;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Extract {
                kind,
                source,
                format,
                pagination,
                rate_limit,
                params,
                headers,
                output,
            } => {
                let spec = match kind {
                    SourceKind::File => ExtractSpec::file(source, *format),
                    SourceKind::Database => ExtractSpec::database(source),
                    SourceKind::Api => ExtractSpec::Api(ApiSource {
                        url: source.clone(),
                        params: params.iter().cloned().collect::<StringMap>(),
                        headers: headers.iter().cloned().collect::<StringMap>(),
                        pagination: pagination
                            .as_deref()
                            .map(load_data)
                            .transpose()?
                            .as_ref()
                            .and_then(PaginationConfig::from_mapping),
                        rate_limit: rate_limit
                            .as_deref()
                            .map(load_data)
                            .transpose()?
                            .as_ref()
                            .and_then(RateLimitConfig::from_mapping),
                        timeout: None,
                    }),
                };

                let data = ExtractOrchestrator::http()?.extract(&spec).await?;
                self.emit(&data, output.as_deref(), "extracted")
            }
            Commands::Validate { source, rules } => {
                let data = load_data(source)?;
                let rules = match rules {
                    Some(raw) => RuleSet::from_value(&load_data(raw)?)?,
                    None => RuleSet::new(),
                };
                let result = validate(&data, &rules);
                self.print(&serde_json::to_value(&result)?)
            }
            Commands::Transform {
                source,
                operations,
                output,
            } => {
                let data = load_data(source)?;
                let ops = match operations {
                    Some(raw) => TransformOperations::from_value(&load_data(raw)?)?,
                    None => TransformOperations::new(),
                };
                let data = transform(data, &ops)?;
                self.emit(&data, output.as_deref(), "transformed")
            }
            Commands::Load {
                source,
                kind,
                target,
                format,
                method,
            } => {
                let data = load_data(source)?;
                let spec = match kind {
                    TargetKind::File => LoadSpec::file(target, *format),
                    TargetKind::Database => LoadSpec::database(target),
                    TargetKind::Api => LoadSpec::api(target, method.parse::<Method>()?),
                };
                let result = Loader::http()?.load(&data, &spec).await?;
                self.print(&result.to_value())
            }
            Commands::Run { config, job } => {
                let pipeline = load_pipeline(config)?;
                let report = JobRunner::new(pipeline)?.run(job).await?;
                self.print(&serde_json::to_value(&report)?)
            }
            Commands::Check { config } => {
                let pipeline = load_pipeline(config)?;
                let warnings = pipeline.check();
                for warning in &warnings {
                    warn!("{}", warning);
                }

                let sources: Vec<&str> = pipeline.sources.iter().map(|s| s.name()).collect();
                let targets: Vec<&str> = pipeline.targets.iter().map(|t| t.name()).collect();
                self.print(&json!({
                    "name": pipeline.name,
                    "sources": sources,
                    "targets": targets,
                    "jobs": pipeline.job_names(),
                    "warnings": warnings,
                }))
            }
        }
    }

    /// Print `data`, or save it as JSON when `output` is set
    fn emit(&self, data: &JsonValue, output: Option<&Path>, verb: &str) -> Result<()> {
        match output {
            Some(path) => {
                write_file(data, path, FileFormat::Json)?;
                println!("Data {verb} and saved to {}", path.display());
                Ok(())
            }
            None => self.print(data),
        }
    }

    /// Print a JSON value to stdout
    fn print(&self, value: &JsonValue) -> Result<()> {
        let text = if self.cli.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{text}");
        Ok(())
    }
}
