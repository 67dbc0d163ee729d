//! Runner types

use crate::load::LoadResult;
use serde::Serialize;

/// Summary of one job run, printed as JSON by the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    /// Always "ok"; failed runs return an error instead
    pub status: &'static str,
    pub job: String,
    /// Records produced by the extract step
    pub records_extracted: usize,
    /// Validation failures logged under `warn` severity
    pub warnings: Vec<String>,
    pub result: LoadResult,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
