//! Paginated extraction
//!
//! Drives a [`PageFetcher`] across pages or cursors and flattens the
//! results into one ordered record list.

use super::records::{coalesce_records, next_cursor};
use super::types::{
    Limits, NoPause, Pacer, PaginationConfig, PaginationState, PaginationType, StopReason,
    DEFAULT_CURSOR_PARAM, DEFAULT_LIMIT_PARAM, DEFAULT_PAGE_PARAM, DEFAULT_SIZE_PARAM,
};
use crate::error::Result;
use crate::http::RequestConfig;
use crate::types::{JsonValue, Records, SourceKind};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Performs one request and returns the parsed JSON body.
///
/// Transport and status failures are returned as errors; the paginator
/// passes them through untouched.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` with the query parameters and headers in `request`
    async fn fetch(&self, kind: SourceKind, url: &str, request: &RequestConfig)
        -> Result<JsonValue>;
}

/// Result of one paginated walk
#[derive(Debug, Clone)]
pub struct PageWalk {
    /// Records in page-arrival order, trimmed to `max_records`
    pub records: Records,
    /// Number of requests made
    pub pages: usize,
    /// Why the walk ended
    pub stop: StopReason,
}

/// Walks a paginated endpoint one page at a time
#[derive(Clone)]
pub struct Paginator {
    fetcher: Arc<dyn PageFetcher>,
    pacer: Arc<dyn Pacer>,
}

impl Paginator {
    /// Create a paginator that does not pause between pages
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            pacer: Arc::new(NoPause),
        }
    }

    /// Set the pause taken before every request after the first
    #[must_use]
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Fetch `url`, paginating when `config` names a known strategy.
    ///
    /// Paginated walks return a JSON array of records. Without a
    /// recognized type a single request is made and its payload is
    /// returned unchanged.
    pub async fn paginate(
        &self,
        url: &str,
        base: &RequestConfig,
        config: Option<&PaginationConfig>,
    ) -> Result<JsonValue> {
        match config {
            Some(config) if config.pagination_type().is_some() => {
                let walk = self.walk(url, base, config).await?;
                Ok(JsonValue::Array(
                    walk.records.into_iter().map(JsonValue::Object).collect(),
                ))
            }
            _ => self.fetcher.fetch(SourceKind::Api, url, base).await,
        }
    }

    /// Fetch all records for a paginated endpoint
    pub async fn paginate_records(
        &self,
        url: &str,
        base: &RequestConfig,
        config: &PaginationConfig,
    ) -> Result<Records> {
        Ok(self.walk(url, base, config).await?.records)
    }

    /// Run the walk selected by `config` and report how it ended
    pub async fn walk(
        &self,
        url: &str,
        base: &RequestConfig,
        config: &PaginationConfig,
    ) -> Result<PageWalk> {
        match config.pagination_type() {
            Some(kind) if kind.is_paged() => self.walk_pages(kind, url, base, config).await,
            Some(PaginationType::Cursor) => self.walk_cursor(url, base, config).await,
            _ => {
                let body = self.fetcher.fetch(SourceKind::Api, url, base).await?;
                let mut records = coalesce_records(&body, config.records_path.as_deref());
                config.limits().trim(&mut records);
                Ok(PageWalk {
                    records,
                    pages: 1,
                    stop: StopReason::SingleRequest,
                })
            }
        }
    }

    async fn walk_pages(
        &self,
        kind: PaginationType,
        url: &str,
        base: &RequestConfig,
        config: &PaginationConfig,
    ) -> Result<PageWalk> {
        let page_param = config.page_param.as_deref().unwrap_or(DEFAULT_PAGE_PARAM);
        let size_param = config.size_param.as_deref().unwrap_or(DEFAULT_SIZE_PARAM);
        let page_size = config.effective_page_size();
        let limits = config.limits();

        let mut state = PaginationState::with_page(config.effective_start_page());
        let mut records = Records::new();

        let stop = loop {
            if !state.is_first_request() {
                self.pacer.pause().await;
            }

            let request = base
                .clone()
                .query(page_param, state.page.to_string())
                .query(size_param, page_size.to_string());

            let body = self.fetcher.fetch(SourceKind::Api, url, &request).await?;
            let batch = coalesce_records(&body, config.records_path.as_deref());
            let count = batch.len();
            state.record_page(count);
            records.extend(batch);

            debug!(
                "Page {} fetched {} records ({} total)",
                state.page, count, state.total_fetched
            );

            if let Some(reason) = page_stop(count, page_size, &limits, &state) {
                break reason;
            }
            if !state.next_page(kind, page_size) {
                break StopReason::PageOverflow;
            }
        };

        limits.trim(&mut records);
        debug!(
            "Pagination finished after {} pages: {:?}",
            state.pages_fetched, stop
        );

        Ok(PageWalk {
            records,
            pages: state.pages_fetched,
            stop,
        })
    }

    async fn walk_cursor(
        &self,
        url: &str,
        base: &RequestConfig,
        config: &PaginationConfig,
    ) -> Result<PageWalk> {
        let cursor_param = config
            .cursor_param
            .as_deref()
            .unwrap_or(DEFAULT_CURSOR_PARAM);
        let size_param = config.size_param.as_deref().unwrap_or(DEFAULT_LIMIT_PARAM);
        let page_size = config.effective_page_size();
        let limits = config.limits();

        let mut state = PaginationState::with_cursor(config.start_cursor.clone());
        let mut requested: HashSet<String> = HashSet::new();
        let mut records = Records::new();

        let stop = loop {
            if !state.is_first_request() {
                self.pacer.pause().await;
            }

            let mut request = base.clone();
            if let Some(cursor) = &state.cursor {
                requested.insert(cursor.clone());
                request = request.query(cursor_param, cursor.clone());
            }
            request = request.query(size_param, page_size.to_string());

            let body = self.fetcher.fetch(SourceKind::Api, url, &request).await?;
            let batch = coalesce_records(&body, config.records_path.as_deref());
            let count = batch.len();
            state.record_page(count);
            records.extend(batch);

            let next = next_cursor(&body, config.cursor_path.as_deref());
            debug!(
                "Cursor page {} fetched {} records, next cursor: {:?}",
                state.pages_fetched, count, next
            );

            let Some(next) = next else {
                break StopReason::CursorExhausted;
            };
            if count == 0 {
                break StopReason::EmptyPage;
            }
            if limits.pages_reached(state.pages_fetched) {
                break StopReason::MaxPages;
            }
            if limits.records_reached(state.total_fetched) {
                break StopReason::MaxRecords;
            }
            if requested.contains(&next) {
                break StopReason::RepeatedCursor;
            }
            state.cursor = Some(next);
        };

        limits.trim(&mut records);
        debug!(
            "Cursor pagination finished after {} pages: {:?}",
            state.pages_fetched, stop
        );

        Ok(PageWalk {
            records,
            pages: state.pages_fetched,
            stop,
        })
    }
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator").finish_non_exhaustive()
    }
}

/// Stop checks for page/offset mode, in order
fn page_stop(
    count: usize,
    page_size: usize,
    limits: &Limits,
    state: &PaginationState,
) -> Option<StopReason> {
    if count == 0 {
        Some(StopReason::EmptyPage)
    } else if count < page_size {
        Some(StopReason::ShortPage)
    } else if limits.pages_reached(state.pages_fetched) {
        Some(StopReason::MaxPages)
    } else if limits.records_reached(state.total_fetched) {
        Some(StopReason::MaxRecords)
    } else {
        None
    }
}
