//! Extract module
//!
//! Reads records from local files, inline JSON payloads, the database
//! placeholder, or REST APIs (paginated through [`crate::pagination`]).

mod file;
mod orchestrator;
mod types;

pub use file::{extract_database, extract_file, load_data};
pub use orchestrator::ExtractOrchestrator;
pub use types::{ApiSource, ExtractSpec};
