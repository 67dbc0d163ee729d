//! Pagination module
//!
//! Supports: Page number, Offset, Cursor
//!
//! # Overview
//!
//! The pagination module turns a multi-page REST endpoint into one bounded,
//! ordered record list. [`PaginationConfig`] describes the walk,
//! [`Paginator`] performs it through an injectable [`PageFetcher`], and a
//! [`Pacer`] spaces out consecutive requests.

mod paginator;
mod records;
mod types;

pub use paginator::{PageFetcher, PageWalk, Paginator};
pub use records::{coalesce_records, lookup_path, next_cursor};
pub use types::{
    FixedPause, NoPause, Pacer, PaginationConfig, PaginationState, PaginationType, StopReason,
    DEFAULT_PAGE_SIZE, DEFAULT_START_PAGE,
};

#[cfg(test)]
mod tests;
