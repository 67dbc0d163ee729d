//! CLI module
//!
//! Command-line interface for one-off ETL steps and pipeline jobs.
//!
//! # Commands
//!
//! - `extract` - Read data from a file, database or REST API
//! - `validate` - Check data against field rules
//! - `transform` - Reshape data
//! - `load` - Write data to a file, database or REST API
//! - `run` - Run a pipeline job
//! - `check` - Inspect a pipeline file

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
