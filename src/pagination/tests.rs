//! Tests for pagination module

use super::*;
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::types::{JsonValue, SourceKind, StringMap};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use test_case::test_case;

// ============================================================================
// Test Doubles
// ============================================================================

/// Serves canned pages in order and records the query of every request
struct ScriptedFetcher {
    pages: Vec<JsonValue>,
    fail_at: Option<usize>,
    calls: Mutex<Vec<StringMap>>,
}

impl ScriptedFetcher {
    fn new(pages: Vec<JsonValue>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing_at(pages: Vec<JsonValue>, index: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            fail_at: Some(index),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<StringMap> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _kind: SourceKind,
        _url: &str,
        request: &RequestConfig,
    ) -> Result<JsonValue> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.query.clone());
            calls.len() - 1
        };
        if self.fail_at == Some(index) {
            return Err(Error::http_status(500, "boom"));
        }
        Ok(self.pages.get(index).cloned().unwrap_or_else(|| json!([])))
    }
}

#[derive(Default)]
struct CountingPacer {
    pauses: AtomicUsize,
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

fn ids(records: &[crate::types::Record]) -> Vec<JsonValue> {
    records.iter().map(|r| r["id"].clone()).collect()
}

fn page_config(size: i64) -> PaginationConfig {
    PaginationConfig::new("page").with_page_size(size)
}

// ============================================================================
// PaginationConfig Tests
// ============================================================================

#[test]
fn test_from_mapping_coerces_start_and_size() {
    let config =
        PaginationConfig::from_mapping(&json!({"type": "page", "start_page": 0, "page_size": 0}))
            .unwrap();
    assert_eq!(config.start_page, Some(1));
    assert_eq!(config.page_size, Some(100));
}

#[test]
fn test_from_mapping_lenient_numbers() {
    let config = PaginationConfig::from_mapping(&json!({
        "type": "cursor",
        "page_size": "25",
        "max_pages": "2.0",
        "max_records": true,
        "cursor_param": "after",
        "cursor_path": "meta.next",
        "start_cursor": 7,
        "records_path": "data"
    }))
    .unwrap();

    assert_eq!(config.pagination_type(), Some(PaginationType::Cursor));
    assert_eq!(config.page_size, Some(25));
    assert_eq!(config.max_pages, Some(2));
    assert_eq!(config.max_records, None);
    assert_eq!(config.cursor_param.as_deref(), Some("after"));
    assert_eq!(config.start_cursor.as_deref(), Some("7"));
}

#[test]
fn test_from_mapping_rejects_non_mapping() {
    assert!(PaginationConfig::from_mapping(&json!("page")).is_none());
    assert!(PaginationConfig::from_mapping(&json!(null)).is_none());
}

#[test]
fn test_from_mapping_stringifies_type() {
    let config = PaginationConfig::from_mapping(&json!({"type": 5})).unwrap();
    assert_eq!(config.kind.as_deref(), Some("5"));
    assert_eq!(config.pagination_type(), None);
}

#[test_case(" PAGE " => Some(PaginationType::Page) ; "padded upper page")]
#[test_case("Offset" => Some(PaginationType::Offset) ; "mixed case offset")]
#[test_case("cursor" => Some(PaginationType::Cursor) ; "cursor")]
#[test_case("link" => None ; "unknown")]
#[test_case("" => None ; "empty")]
fn test_pagination_type_parse(raw: &str) -> Option<PaginationType> {
    PaginationType::parse(raw)
}

#[test]
fn test_validate_bounds_offset() {
    let config = PaginationConfig {
        kind: Some("offset".into()),
        start_page: Some(0),
        page_size: Some(-1),
        ..Default::default()
    };
    assert_eq!(
        config.validate_bounds(),
        vec!["start_page should be >= 1", "page_size should be > 0"]
    );
}

#[test]
fn test_validate_bounds_without_type() {
    let config = PaginationConfig {
        kind: None,
        start_page: Some(0),
        page_size: Some(-1),
        max_pages: Some(0),
        max_records: Some(-5),
        ..Default::default()
    };
    assert_eq!(
        config.validate_bounds(),
        vec!["max_pages should be > 0", "max_records should be > 0"]
    );
}

#[test]
fn test_validate_bounds_cursor() {
    let config = PaginationConfig {
        kind: Some("Cursor".into()),
        start_page: Some(0),
        page_size: Some(0),
        ..Default::default()
    };
    assert_eq!(
        config.validate_bounds(),
        vec!["page_size should be > 0 for cursor pagination"]
    );
}

#[test]
fn test_validate_bounds_clean() {
    let config = PaginationConfig::from_mapping(&json!({"type": "page"})).unwrap();
    assert!(config.validate_bounds().is_empty());
}

// ============================================================================
// PaginationState Tests
// ============================================================================

#[test]
fn test_pagination_state_tracks_pages() {
    let mut state = PaginationState::with_page(3);
    assert!(state.is_first_request());

    state.record_page(10);
    assert!(state.next_page(PaginationType::Page, 10));
    state.record_page(4);

    assert_eq!(state.page, 4);
    assert_eq!(state.pages_fetched, 2);
    assert_eq!(state.total_fetched, 14);
    assert!(!state.is_first_request());
}

#[test]
fn test_pagination_state_offset_steps_by_page_size() {
    let mut state = PaginationState::with_page(1);
    assert!(state.next_page(PaginationType::Offset, 25));
    assert!(state.next_page(PaginationType::Offset, 25));
    assert_eq!(state.page, 51);
}

#[test]
fn test_pagination_state_overflow_is_refused() {
    let mut state = PaginationState::with_page(i64::MAX);
    assert!(!state.next_page(PaginationType::Page, 100));
    assert_eq!(state.page, i64::MAX);

    let mut state = PaginationState::with_page(i64::MAX - 10);
    assert!(!state.next_page(PaginationType::Offset, 20));
    assert_eq!(state.page, i64::MAX - 10);
}

// ============================================================================
// Record Helper Tests
// ============================================================================

#[test]
fn test_lookup_path() {
    let body = json!({"data": {"items": [1, 2]}, "count": 2});
    assert_eq!(lookup_path(&body, "data.items"), Some(&json!([1, 2])));
    assert_eq!(lookup_path(&body, "$.count"), Some(&json!(2)));
    assert_eq!(lookup_path(&body, "data.missing"), None);
    assert_eq!(lookup_path(&body, "count.deeper"), None);
}

#[test]
fn test_coalesce_records_paths() {
    let body = json!({"meta": {"total": 3}, "data": {"rows": [{"id": 1}, 2]}});
    let records = coalesce_records(&body, Some("data.rows"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["value"], json!(2));
}

#[test]
fn test_coalesce_records_fallbacks() {
    // First array-valued field
    let body = json!({"total": 2, "items": [{"id": 1}, {"id": 2}], "other": [{"id": 9}]});
    assert_eq!(ids(&coalesce_records(&body, None)), vec![json!(1), json!(2)]);

    // Unresolved path falls back too
    assert_eq!(
        ids(&coalesce_records(&body, Some("results"))),
        vec![json!(1), json!(2)]
    );

    // Object without arrays is one record
    let single = coalesce_records(&json!({"id": 5}), None);
    assert_eq!(ids(&single), vec![json!(5)]);

    // Malformed pages yield nothing
    assert!(coalesce_records(&json!("oops"), None).is_empty());
    assert!(coalesce_records(&json!(null), None).is_empty());
}

#[test]
fn test_next_cursor() {
    assert_eq!(
        next_cursor(&json!({"meta": {"next": "abc"}}), Some("meta.next")),
        Some("abc".to_string())
    );
    assert_eq!(
        next_cursor(&json!({"next": 42}), Some("next")),
        Some("42".to_string())
    );
    assert_eq!(next_cursor(&json!({"next": ""}), Some("next")), None);
    assert_eq!(next_cursor(&json!({"next": null}), Some("next")), None);
    assert_eq!(next_cursor(&json!({"next": "abc"}), None), None);
}

// ============================================================================
// Page Mode Tests
// ============================================================================

#[tokio::test]
async fn test_page_mode_short_batch_stops() {
    let fetcher = ScriptedFetcher::new(vec![json!([{"id": 1}, {"id": 2}]), json!([{"id": 3}])]);
    let paginator = Paginator::new(fetcher.clone());

    let records = paginator
        .paginate_records("https://api.test/items", &RequestConfig::new(), &page_config(2))
        .await
        .unwrap();

    assert_eq!(ids(&records), vec![json!(1), json!(2), json!(3)]);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_page_mode_max_records_trims() {
    let fetcher = ScriptedFetcher::new(vec![json!([{"id": 1}, {"id": 2}]), json!([{"id": 3}])]);
    let paginator = Paginator::new(fetcher.clone());
    let config = page_config(2).with_limits(None, Some(2));

    let walk = paginator
        .walk("https://api.test/items", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(ids(&walk.records), vec![json!(1), json!(2)]);
    assert_eq!(walk.stop, StopReason::MaxRecords);
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_page_mode_trims_mid_page() {
    let fetcher = ScriptedFetcher::new(vec![
        json!([{"id": 1}, {"id": 2}, {"id": 3}]),
        json!([{"id": 4}, {"id": 5}, {"id": 6}]),
        json!([{"id": 7}]),
    ]);
    let paginator = Paginator::new(fetcher.clone());
    let config = page_config(3).with_limits(None, Some(5));

    let records = paginator
        .paginate_records("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_page_mode_max_pages() {
    let fetcher = ScriptedFetcher::new(vec![
        json!([{"id": 1}]),
        json!([{"id": 2}]),
        json!([{"id": 3}]),
    ]);
    let paginator = Paginator::new(fetcher.clone());
    let config = page_config(1).with_limits(Some(2), None);

    let walk = paginator
        .walk("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(ids(&walk.records), vec![json!(1), json!(2)]);
    assert_eq!(walk.pages, 2);
    assert_eq!(walk.stop, StopReason::MaxPages);
}

#[tokio::test]
async fn test_page_mode_empty_page_stops() {
    let fetcher = ScriptedFetcher::new(vec![json!([{"id": 1}]), json!([])]);
    let paginator = Paginator::new(fetcher.clone());

    let walk = paginator
        .walk("u", &RequestConfig::new(), &page_config(1))
        .await
        .unwrap();

    assert_eq!(ids(&walk.records), vec![json!(1)]);
    assert_eq!(walk.stop, StopReason::EmptyPage);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_page_mode_malformed_page_is_short() {
    let fetcher = ScriptedFetcher::new(vec![json!([{"id": 1}, {"id": 2}]), json!("garbage")]);
    let paginator = Paginator::new(fetcher.clone());

    let records = paginator
        .paginate_records("u", &RequestConfig::new(), &page_config(2))
        .await
        .unwrap();

    assert_eq!(ids(&records), vec![json!(1), json!(2)]);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_page_mode_params_merge_over_base() {
    let fetcher = ScriptedFetcher::new(vec![json!([{"id": 1}, {"id": 2}]), json!([])]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig {
        kind: Some("page".into()),
        page_param: Some("p".into()),
        size_param: Some("n".into()),
        start_page: Some(5),
        page_size: Some(2),
        ..Default::default()
    };
    let base = RequestConfig::new().query("state", "open").query("p", "99");

    paginator.paginate_records("u", &base, &config).await.unwrap();

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].get("state"), Some(&"open".to_string()));
    assert_eq!(calls[0].get("p"), Some(&"5".to_string()));
    assert_eq!(calls[0].get("n"), Some(&"2".to_string()));
    assert_eq!(calls[1].get("p"), Some(&"6".to_string()));
    assert_eq!(calls[1].get("state"), Some(&"open".to_string()));
}

/// Serves ids `offset..min(offset + limit, total)` like a real offset API
struct OffsetFetcher {
    total: i64,
    offsets: Mutex<Vec<i64>>,
}

#[async_trait]
impl PageFetcher for OffsetFetcher {
    async fn fetch(
        &self,
        _kind: SourceKind,
        _url: &str,
        request: &RequestConfig,
    ) -> Result<JsonValue> {
        let offset: i64 = request.query["offset"].parse().unwrap();
        let limit: i64 = request.query["limit"].parse().unwrap();
        self.offsets.lock().unwrap().push(offset);
        let rows: Vec<JsonValue> = (offset..(offset + limit).min(self.total))
            .map(|id| json!({"id": id}))
            .collect();
        Ok(JsonValue::Array(rows))
    }
}

#[tokio::test]
async fn test_offset_mode_advances_by_page_size() {
    let fetcher = Arc::new(OffsetFetcher {
        total: 6,
        offsets: Mutex::new(Vec::new()),
    });
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::from_mapping(&json!({
        "type": "offset",
        "page_param": "offset",
        "size_param": "limit",
        "start_page": 1,
        "page_size": 2
    }))
    .unwrap();

    let walk = paginator
        .walk("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(
        ids(&walk.records),
        vec![json!(1), json!(2), json!(3), json!(4), json!(5)]
    );
    assert_eq!(*fetcher.offsets.lock().unwrap(), vec![1, 3, 5]);
    assert_eq!(walk.stop, StopReason::ShortPage);
}

#[tokio::test]
async fn test_page_mode_stops_before_page_overflow() {
    let fetcher = ScriptedFetcher::new(vec![json!([{"id": 1}]), json!([{"id": 2}])]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::from_mapping(&json!({
        "type": "page",
        "start_page": i64::MAX,
        "page_size": 1
    }))
    .unwrap();

    let walk = paginator
        .walk("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(walk.stop, StopReason::PageOverflow);
    assert_eq!(ids(&walk.records), vec![json!(1)]);
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_page_mode_default_params() {
    let fetcher = ScriptedFetcher::new(vec![json!([])]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::from_mapping(&json!({"type": "page"})).unwrap();

    paginator
        .paginate_records("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    let calls = fetcher.calls();
    assert_eq!(calls[0].get("page"), Some(&"1".to_string()));
    assert_eq!(calls[0].get("per_page"), Some(&"100".to_string()));
}

#[tokio::test]
async fn test_page_mode_ignores_non_positive_limits() {
    let fetcher = ScriptedFetcher::new(vec![json!([{"id": 1}]), json!([])]);
    let paginator = Paginator::new(fetcher.clone());
    let config = page_config(1).with_limits(Some(0), Some(-1));

    let records = paginator
        .paginate_records("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_bounded_walk_page_count() {
    // Never more than ceil(N / page_size) + 1 pages
    let pages: Vec<JsonValue> = (0..10)
        .map(|p| json!([{"id": p * 3}, {"id": p * 3 + 1}, {"id": p * 3 + 2}]))
        .collect();
    for max in 1..=12 {
        let fetcher = ScriptedFetcher::new(pages.clone());
        let paginator = Paginator::new(fetcher.clone());
        let config = page_config(3).with_limits(None, Some(max));

        let records = paginator
            .paginate_records("u", &RequestConfig::new(), &config)
            .await
            .unwrap();

        assert_eq!(records.len(), max as usize);
        assert!(fetcher.call_count() <= (max as usize).div_ceil(3) + 1);
    }
}

// ============================================================================
// Cursor Mode Tests
// ============================================================================

#[tokio::test]
async fn test_cursor_mode_follows_tokens() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"data": [{"id": "a"}, {"id": "b"}], "next": "tok1"}),
        json!({"data": [{"id": "c"}], "next": null}),
    ]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::new("cursor")
        .with_cursor("cursor", "next")
        .with_records_path("data");

    let walk = paginator
        .walk("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(ids(&walk.records), vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(walk.stop, StopReason::CursorExhausted);

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].contains_key("cursor"));
    assert_eq!(calls[0].get("limit"), Some(&"100".to_string()));
    assert_eq!(calls[1].get("cursor"), Some(&"tok1".to_string()));
}

#[tokio::test]
async fn test_cursor_mode_start_cursor_and_size_param() {
    let fetcher = ScriptedFetcher::new(vec![json!({"items": [{"id": 1}]})]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig {
        kind: Some("cursor".into()),
        cursor_param: Some("after".into()),
        cursor_path: Some("meta.next".into()),
        start_cursor: Some("seed".into()),
        size_param: Some("page_size".into()),
        page_size: Some(10),
        ..Default::default()
    };

    let records = paginator
        .paginate_records("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    let calls = fetcher.calls();
    assert_eq!(calls[0].get("after"), Some(&"seed".to_string()));
    assert_eq!(calls[0].get("page_size"), Some(&"10".to_string()));
}

#[tokio::test]
async fn test_cursor_mode_repeated_cursor_stops() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"data": [{"id": 1}], "next": "same"}),
        json!({"data": [{"id": 2}], "next": "same"}),
        json!({"data": [{"id": 3}], "next": "same"}),
    ]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::new("cursor").with_cursor("cursor", "next");

    let walk = paginator
        .walk("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(ids(&walk.records), vec![json!(1), json!(2)]);
    assert_eq!(walk.stop, StopReason::RepeatedCursor);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_cursor_mode_empty_batch_stops() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"data": [{"id": 1}], "next": "t1"}),
        json!({"data": [], "next": "t2"}),
        json!({"data": [{"id": 3}], "next": null}),
    ]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::new("cursor").with_cursor("cursor", "next");

    let walk = paginator
        .walk("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(walk.stop, StopReason::EmptyPage);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_cursor_mode_limits() {
    let fetcher = ScriptedFetcher::new(vec![
        json!({"data": [{"id": 1}, {"id": 2}], "next": "t1"}),
        json!({"data": [{"id": 3}, {"id": 4}], "next": "t2"}),
        json!({"data": [{"id": 5}], "next": null}),
    ]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::new("cursor")
        .with_cursor("cursor", "next")
        .with_limits(None, Some(3));

    let records = paginator
        .paginate_records("u", &RequestConfig::new(), &config)
        .await
        .unwrap();

    assert_eq!(ids(&records), vec![json!(1), json!(2), json!(3)]);
    assert_eq!(fetcher.call_count(), 2);

    let fetcher = ScriptedFetcher::new(vec![
        json!({"data": [{"id": 1}], "next": "t1"}),
        json!({"data": [{"id": 2}], "next": "t2"}),
    ]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::new("cursor")
        .with_cursor("cursor", "next")
        .with_limits(Some(1), None);

    let walk = paginator
        .walk("u", &RequestConfig::new(), &config)
        .await
        .unwrap();
    assert_eq!(walk.stop, StopReason::MaxPages);
    assert_eq!(fetcher.call_count(), 1);
}

// ============================================================================
// Shared Behavior Tests
// ============================================================================

#[tokio::test]
async fn test_pause_between_pages_only() {
    let fetcher = ScriptedFetcher::new(vec![
        json!([{"id": 1}]),
        json!([{"id": 2}]),
        json!([]),
    ]);
    let pacer = Arc::new(CountingPacer::default());
    let paginator = Paginator::new(fetcher.clone()).with_pacer(pacer.clone());

    paginator
        .paginate_records("u", &RequestConfig::new(), &page_config(1))
        .await
        .unwrap();

    assert_eq!(fetcher.call_count(), 3);
    assert_eq!(pacer.pauses.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fetch_error_propagates() {
    let fetcher = ScriptedFetcher::failing_at(vec![json!([{"id": 1}])], 1);
    let paginator = Paginator::new(fetcher.clone());

    let err = paginator
        .paginate_records("u", &RequestConfig::new(), &page_config(1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_unknown_type_returns_raw_payload() {
    let payload = json!({"data": [{"id": 1}], "next": "x"});
    let fetcher = ScriptedFetcher::new(vec![payload.clone(), payload.clone()]);
    let paginator = Paginator::new(fetcher.clone());
    let config = PaginationConfig::new("link_header");

    let body = paginator
        .paginate("u", &RequestConfig::new(), Some(&config))
        .await
        .unwrap();
    assert_eq!(body, payload);

    let body = paginator
        .paginate("u", &RequestConfig::new(), None)
        .await
        .unwrap();
    assert_eq!(body, payload);
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_paginate_returns_array() {
    let fetcher = ScriptedFetcher::new(vec![json!({"results": [{"id": 1}]})]);
    let paginator = Paginator::new(fetcher);

    let body = paginator
        .paginate("u", &RequestConfig::new(), Some(&page_config(5)))
        .await
        .unwrap();
    assert_eq!(body, json!([{"id": 1}]));
}
