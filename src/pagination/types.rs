//! Pagination types
//!
//! Configuration, iteration state and the pause abstraction shared by
//! the page/offset and cursor walkers.

use crate::types::{try_parse_int, JsonObject, JsonValue};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Page number used when none (or a non-positive one) is configured
pub const DEFAULT_START_PAGE: i64 = 1;

/// Page size used when none (or a non-positive one) is configured
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Query parameter names used when the config leaves them unset
pub const DEFAULT_PAGE_PARAM: &str = "page";
pub const DEFAULT_SIZE_PARAM: &str = "per_page";
pub const DEFAULT_CURSOR_PARAM: &str = "cursor";
pub const DEFAULT_LIMIT_PARAM: &str = "limit";

// ============================================================================
// Pagination Type
// ============================================================================

/// Supported pagination strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationType {
    /// Page number + page size
    Page,
    /// Record offset + page size; the offset advances by `page_size`
    Offset,
    /// Opaque continuation token returned by the server
    Cursor,
}

impl PaginationType {
    /// Parse a type name (case-insensitive, whitespace-trimmed)
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "page" => Some(Self::Page),
            "offset" => Some(Self::Offset),
            "cursor" => Some(Self::Cursor),
            _ => None,
        }
    }

    /// Whether this strategy walks page numbers
    pub fn is_paged(&self) -> bool {
        matches!(self, Self::Page | Self::Offset)
    }
}

// ============================================================================
// Pagination Config
// ============================================================================

/// How to walk a paginated API endpoint.
///
/// Fields hold exactly what was supplied. [`PaginationConfig::from_mapping`]
/// applies defaults for `start_page` and `page_size`; building the struct
/// directly does not, which is what [`PaginationConfig::validate_bounds`]
/// reports on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationConfig {
    /// "page", "offset", "cursor"; anything else means no pagination
    #[serde(rename = "type")]
    pub kind: Option<String>,

    // Page/offset
    pub page_param: Option<String>,
    pub size_param: Option<String>,
    pub start_page: Option<i64>,
    pub page_size: Option<i64>,

    // Cursor
    pub cursor_param: Option<String>,
    /// Dotted path to the next cursor in the response body
    pub cursor_path: Option<String>,
    pub start_cursor: Option<String>,

    // General
    /// Dotted path to the record array in the response body
    pub records_path: Option<String>,
    pub max_pages: Option<i64>,
    pub max_records: Option<i64>,
}

impl PaginationConfig {
    /// Create an empty config of the given type
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// Parse a raw mapping (typically from YAML/JSON).
    ///
    /// Returns `None` when `obj` is not a mapping. Numeric fields that do not
    /// coerce to an integer are left unset; this never fails.
    pub fn from_mapping(obj: &JsonValue) -> Option<Self> {
        obj.as_object().map(Self::from_object)
    }

    /// Parse a JSON object; see [`PaginationConfig::from_mapping`]
    pub fn from_object(obj: &JsonObject) -> Self {
        let string = |key: &str| obj.get(key).and_then(JsonValue::as_str).map(String::from);
        let int = |key: &str| obj.get(key).and_then(try_parse_int);

        let kind = match obj.get("type") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        let start_cursor = match obj.get("start_cursor") {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Self {
            kind,
            page_param: string("page_param"),
            size_param: string("size_param"),
            start_page: Some(
                int("start_page")
                    .filter(|p| *p > 0)
                    .unwrap_or(DEFAULT_START_PAGE),
            ),
            page_size: Some(
                int("page_size")
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_PAGE_SIZE),
            ),
            cursor_param: string("cursor_param"),
            cursor_path: string("cursor_path"),
            start_cursor,
            records_path: string("records_path"),
            max_pages: int("max_pages"),
            max_records: int("max_records"),
        }
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, size: i64) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Set the records path
    #[must_use]
    pub fn with_records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = Some(path.into());
        self
    }

    /// Set the cursor parameter and response path
    #[must_use]
    pub fn with_cursor(mut self, param: impl Into<String>, path: impl Into<String>) -> Self {
        self.cursor_param = Some(param.into());
        self.cursor_path = Some(path.into());
        self
    }

    /// Set the record and page limits
    #[must_use]
    pub fn with_limits(mut self, max_pages: Option<i64>, max_records: Option<i64>) -> Self {
        self.max_pages = max_pages;
        self.max_records = max_records;
        self
    }

    /// The recognized strategy, if any
    pub fn pagination_type(&self) -> Option<PaginationType> {
        self.kind.as_deref().and_then(PaginationType::parse)
    }

    /// Non-fatal warnings for out-of-range numeric bounds.
    ///
    /// Inspects the stored fields as-is; page/offset checks only apply to
    /// those types and the cursor check only to cursor, while the
    /// `max_pages`/`max_records` checks apply to every type.
    pub fn validate_bounds(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_pages.is_some_and(|mp| mp <= 0) {
            warnings.push("max_pages should be > 0".to_string());
        }
        if self.max_records.is_some_and(|mr| mr <= 0) {
            warnings.push("max_records should be > 0".to_string());
        }

        match self.pagination_type() {
            Some(PaginationType::Page | PaginationType::Offset) => {
                if self.start_page.is_some_and(|sp| sp < 1) {
                    warnings.push("start_page should be >= 1".to_string());
                }
                if self.page_size.is_some_and(|ps| ps <= 0) {
                    warnings.push("page_size should be > 0".to_string());
                }
            }
            Some(PaginationType::Cursor) => {
                if self.page_size.is_some_and(|ps| ps <= 0) {
                    warnings.push("page_size should be > 0 for cursor pagination".to_string());
                }
            }
            None => {}
        }

        warnings
    }

    pub(crate) fn effective_start_page(&self) -> i64 {
        self.start_page
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_START_PAGE)
    }

    pub(crate) fn effective_page_size(&self) -> usize {
        self.page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE) as usize
    }

    pub(crate) fn limits(&self) -> Limits {
        let positive = |v: Option<i64>| v.filter(|n| *n > 0).map(|n| n as usize);
        Limits {
            max_pages: positive(self.max_pages),
            max_records: positive(self.max_records),
        }
    }
}

// ============================================================================
// Limits
// ============================================================================

/// Effective page/record caps; non-positive configured values are ignored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Limits {
    pub max_pages: Option<usize>,
    pub max_records: Option<usize>,
}

impl Limits {
    pub fn pages_reached(&self, pages: usize) -> bool {
        self.max_pages.is_some_and(|max| pages >= max)
    }

    pub fn records_reached(&self, records: usize) -> bool {
        self.max_records.is_some_and(|max| records >= max)
    }

    pub fn trim<T>(&self, records: &mut Vec<T>) {
        if let Some(max) = self.max_records {
            records.truncate(max);
        }
    }
}

// ============================================================================
// Stop Reason
// ============================================================================

/// Why a paginated walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back with no records
    EmptyPage,
    /// A page came back with fewer records than the page size
    ShortPage,
    /// `max_pages` pages were fetched
    MaxPages,
    /// At least `max_records` records were collected
    MaxRecords,
    /// The response carried no next cursor
    CursorExhausted,
    /// The server handed back a cursor that was already requested
    RepeatedCursor,
    /// The next page number or offset does not fit in an `i64`
    PageOverflow,
    /// No pagination configured; one request was made
    SingleRequest,
}

// ============================================================================
// Pagination State
// ============================================================================

/// Tracks pagination state during one walk
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Current page number (page/offset mode)
    pub page: i64,
    /// Current cursor value (cursor mode)
    pub cursor: Option<String>,
    /// Pages fetched so far
    pub pages_fetched: usize,
    /// Records collected so far (before trimming)
    pub total_fetched: usize,
}

impl PaginationState {
    /// Create state with a starting page
    pub fn with_page(page: i64) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Create state with a starting cursor
    pub fn with_cursor(cursor: Option<String>) -> Self {
        Self {
            cursor,
            ..Default::default()
        }
    }

    /// Record one fetched page holding `count` records
    pub fn record_page(&mut self, count: usize) {
        self.pages_fetched += 1;
        self.total_fetched += count;
    }

    /// Advance to the next page.
    ///
    /// Offset walks step by `page_size`; page walks step by one. Returns
    /// `false` (leaving the state untouched) when the next value would
    /// overflow.
    pub fn next_page(&mut self, kind: PaginationType, page_size: usize) -> bool {
        let step = match kind {
            PaginationType::Offset => i64::try_from(page_size).ok(),
            _ => Some(1),
        };
        match step.and_then(|step| self.page.checked_add(step)) {
            Some(next) => {
                self.page = next;
                true
            }
            None => false,
        }
    }

    /// Whether the next request is the first one
    pub fn is_first_request(&self) -> bool {
        self.pages_fetched == 0
    }
}

// ============================================================================
// Pacing
// ============================================================================

/// Pause taken between page requests (never before the first one)
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next request may be issued
    async fn pause(&self);
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

#[async_trait]
impl Pacer for NoPause {
    async fn pause(&self) {}
}

/// Sleeps for a fixed duration
#[derive(Debug, Clone, Copy)]
pub struct FixedPause(pub Duration);

#[async_trait]
impl Pacer for FixedPause {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}
