//! Load module
//!
//! Writes JSON, CSV or JSON Lines files, sends records to REST APIs, and
//! answers database targets with a placeholder result.

mod loader;
mod types;
mod writer;

pub use loader::{load_to_database, Loader};
pub use types::{record_count, LoadResult, LoadSpec, LoadStatus};
pub use writer::write_file;
