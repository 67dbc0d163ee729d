// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy ETL
//!
//! A small, Rust-native ETL runner.
//!
//! ## Features
//!
//! - **Paginated REST Extraction**: page, offset and cursor walks with
//!   bounded, ordered output and optional pacing between requests
//! - **Record Transforms**: filter, map, select, sort and aggregate with
//!   pluggable operators and aggregate functions
//! - **Validation**: declarative per-field rules
//! - **Files**: JSON, CSV and JSON Lines in and out
//! - **Pipelines**: named sources, targets and jobs in YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_etl::extract::{ApiSource, ExtractOrchestrator, ExtractSpec};
//! use solidafy_etl::pagination::PaginationConfig;
//! use solidafy_etl::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let source = ApiSource::new("https://api.example.com/users")
//!         .with_pagination(PaginationConfig::new("page").with_records_path("data"));
//!
//!     let records = ExtractOrchestrator::http()?
//!         .extract(&ExtractSpec::Api(source))
//!         .await?;
//!     println!("{records}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │            Pipeline YAML  →  JobRunner  →  CLI                │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────┬───┴────────┬────────────┬──────────┐
//! │  Extract   │  Paginate  │ Validate   │ Transform  │  Load    │
//! ├────────────┼────────────┼────────────┼────────────┼──────────┤
//! │ File       │ Page       │ Required   │ Filter     │ File     │
//! │ API        │ Offset     │ Type       │ Map        │ API      │
//! │ Database*  │ Cursor     │ Bounds     │ Select     │ Database*│
//! │            │ Pacing     │ Pattern    │ Sort / Agg │          │
//! └────────────┴────────────┴────────────┴────────────┴──────────┘
//!                                        * placeholder only
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client and rate limiting
pub mod http;

/// Paginated extraction
pub mod pagination;

/// Record transforms
pub mod transform;

/// Field validation
pub mod validation;

/// Source readers and dispatch
pub mod extract;

/// Target writers and dispatch
pub mod load;

/// Pipeline YAML configuration
pub mod config;

/// Job runner
pub mod run;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_pipeline, parse_pipeline, PipelineConfig};
pub use extract::{ApiSource, ExtractOrchestrator, ExtractSpec};
pub use load::{LoadResult, LoadSpec, Loader};
pub use pagination::{PageFetcher, PaginationConfig, Paginator};
pub use run::{JobReport, JobRunner};
pub use transform::{transform, TransformOperations, Transformer};
pub use validation::{validate, RuleSet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
