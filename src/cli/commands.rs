//! CLI commands and argument parsing

use crate::config::DEFAULT_CONFIG_PATH;
use crate::types::{FileFormat, SourceKind, TargetKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy ETL CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract data from a file, database or REST API
    Extract {
        /// Type of source
        kind: SourceKind,

        /// File path (or inline JSON), connection string, or API URL
        source: String,

        /// File format
        #[arg(long, default_value = "json")]
        format: FileFormat,

        /// Pagination config (JSON string or path)
        #[arg(long)]
        pagination: Option<String>,

        /// Rate limit config (JSON string or path)
        #[arg(long)]
        rate_limit: Option<String>,

        /// Query parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Request header as key=value (repeatable)
        #[arg(long = "header", value_parser = parse_key_val)]
        headers: Vec<(String, String)>,

        /// Save the extracted data to this JSON file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate data against field rules
    Validate {
        /// Data to validate (file path or JSON string)
        source: String,

        /// Rules (JSON string or path)
        #[arg(long)]
        rules: Option<String>,
    },

    /// Transform data with filter/map/select/sort/aggregate operations
    Transform {
        /// Data to transform (file path or JSON string)
        source: String,

        /// Operations (JSON string or path)
        #[arg(long)]
        operations: Option<String>,

        /// Save the result to this JSON file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load data into a file, database or REST API
    Load {
        /// Data to load (file path or JSON string)
        source: String,

        /// Type of target
        kind: TargetKind,

        /// File path, connection string, or API URL
        target: String,

        /// File format
        #[arg(long, default_value = "json")]
        format: FileFormat,

        /// HTTP method for API targets
        #[arg(long, default_value = "post")]
        method: String,
    },

    /// Run a pipeline job
    Run {
        /// Pipeline file (YAML)
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Job name
        #[arg(short, long)]
        job: String,
    },

    /// Check a pipeline file and list its jobs
    Check {
        /// Pipeline file (YAML)
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

/// Parse `key=value`
pub(crate) fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
