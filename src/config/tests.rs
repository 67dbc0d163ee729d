//! Tests for the pipeline configuration module

use super::*;
use crate::error::Error;
use crate::extract::ExtractSpec;
use crate::http::RateLimitConfig;
use crate::load::LoadSpec;
use crate::types::{FileFormat, Method};
use crate::validation::{Phase, Severity};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

const PIPELINE: &str = r#"
name: demo
vars:
  BASE: https://api.example.com
  TOKEN: from-vars
  OUT_DIR: out
apis:
  example:
    base_url: ${BASE}/
    headers:
      Accept: application/json
      Authorization: Bearer ${TOKEN}
    endpoints:
      users:
        path: /users
        params: { state: open, limit: 10 }
        pagination: { type: page, page_size: 50, records_path: data, max_pages: 4 }
        rate_limit: { sleep_seconds: 0.5 }
sources:
  - name: users
    type: api
    api: example
    endpoint: users
    params: { state: all }
    headers: { X-Trace: "1" }
  - name: direct
    type: api
    url: https://other.example.com/items
    pagination: { type: cursor, cursor_path: meta.next }
    rate_limit: { max_per_sec: 2 }
  - name: local
    type: file
    path: in/data.csv
    format: csv
  - name: warehouse
    type: database
    connection_string: postgres://localhost/db
targets:
  - name: out
    type: file
    path: ${OUT_DIR}/users.json
  - name: hook
    type: api
    url: https://hooks.example.com/ingest
    method: put
    headers: { X-Key: k }
  - name: db
    type: database
    connection_string: postgres://localhost/db
validations:
  basic:
    id: { required: true, type: integer, min: 1 }
transforms:
  clean:
    filter: { field: active, op: eq, value: true }
    select: [id, name]
jobs:
  - name: sync
    extract:
      source: users
      options:
        params: { page_hint: "2" }
        pagination: { max_pages: 2 }
        rate_limit: { sleep_seconds: 0 }
        timeout: 5
    validate: { ruleset: basic, severity: warn, phase: both }
    transform: { pipeline: clean }
    load:
      target: hook
      overrides: { method: patch, headers: { X-Extra: e } }
  - name: copy
    extract: { source: local }
    load: { target: out, overrides: { format: jsonl } }
"#;

fn no_env() -> Vec<(String, String)> {
    Vec::new()
}

fn pipeline() -> PipelineConfig {
    parse_pipeline(PIPELINE, no_env()).unwrap()
}

// ============================================================================
// Substitution
// ============================================================================

#[test]
fn test_variables_render() {
    let vars = Variables::new().set("HOST", "example.com").set("PORT", "80");
    assert_eq!(vars.render("http://${HOST}:${PORT}/"), "http://example.com:80/");
    assert_eq!(vars.render("${MISSING}/x"), "${MISSING}/x");
    assert_eq!(vars.render("no tokens"), "no tokens");
}

#[test]
fn test_env_overrides_vars() {
    let mut raw = serde_json::Map::new();
    raw.insert("TOKEN".into(), json!("from-vars"));
    raw.insert("RETRIES".into(), json!(3));

    let vars = Variables::from_vars(&raw).with_env([("TOKEN", "from-env")]);
    assert_eq!(vars.get("TOKEN"), Some("from-env"));
    assert_eq!(vars.get("RETRIES"), Some("3"));
}

#[test]
fn test_render_value_nested() {
    let vars = Variables::new().set("X", "1");
    let rendered = vars.render_value(&json!({"a": ["${X}", {"b": "${X}${X}"}], "${X}": 2}));
    assert_eq!(rendered, json!({"a": ["1", {"b": "11"}], "${X}": 2}));
}

#[test]
fn test_token_helpers() {
    assert!(has_tokens("${A}"));
    assert!(!has_tokens("$A {A}"));
    assert_eq!(token_names("${A}-${B_2}"), vec!["A", "B_2"]);
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_pipeline() {
    let config = pipeline();
    assert_eq!(config.name.as_deref(), Some("demo"));
    assert_eq!(config.sources.len(), 4);
    assert_eq!(config.targets.len(), 3);
    assert_eq!(config.job_names(), vec!["sync", "copy"]);
    assert_eq!(config.apis["example"].base_url, "https://api.example.com/");
}

#[test]
fn test_parse_uses_env_over_vars() {
    let env = vec![("TOKEN".to_string(), "secret".to_string())];
    let config = parse_pipeline(PIPELINE, env).unwrap();
    assert_eq!(
        config.apis["example"].headers["Authorization"],
        json!("Bearer secret")
    );
}

#[test]
fn test_parse_rejects_bad_roots_and_duplicates() {
    assert!(parse_pipeline("- a\n- b\n", no_env()).is_err());

    let duplicate = "sources:\n  - {name: a, type: database}\n  - {name: a, type: database}\n";
    let err = parse_pipeline(duplicate, no_env()).unwrap_err();
    assert!(err.to_string().contains("Duplicate source name: a"));

    let no_url = "sources:\n  - {name: a, type: api}\n";
    assert!(parse_pipeline(no_url, no_env()).is_err());

    let unknown_type = "sources:\n  - {name: a, type: ftp}\n";
    assert!(parse_pipeline(unknown_type, no_env()).is_err());
}

#[test]
fn test_load_pipeline_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PIPELINE.as_bytes()).unwrap();

    let config = load_pipeline_with_env(file.path(), no_env()).unwrap();
    assert_eq!(config.jobs.len(), 2);

    let err = load_pipeline("/no/such/pipeline.yml").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_endpoint_source_resolution() {
    let config = pipeline();
    let job = config.job("sync").unwrap();
    let spec = config
        .extract_spec(job.extract.as_ref().unwrap())
        .unwrap();

    let ExtractSpec::Api(source) = spec else {
        panic!("expected an API source");
    };
    assert_eq!(source.url, "https://api.example.com/users");

    // endpoint < source < job options
    assert_eq!(source.params["state"], "all");
    assert_eq!(source.params["limit"], "10");
    assert_eq!(source.params["page_hint"], "2");
    assert_eq!(source.headers["Accept"], "application/json");
    assert_eq!(source.headers["Authorization"], "Bearer from-vars");
    assert_eq!(source.headers["X-Trace"], "1");

    // pagination inherited from the endpoint, overlaid per key
    let pagination = source.pagination.unwrap();
    assert_eq!(pagination.kind.as_deref(), Some("page"));
    assert_eq!(pagination.page_size, Some(50));
    assert_eq!(pagination.records_path.as_deref(), Some("data"));
    assert_eq!(pagination.max_pages, Some(2));

    assert_eq!(source.rate_limit, Some(RateLimitConfig::sleep(0.0)));
    assert_eq!(source.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn test_direct_source_resolution() {
    let config = pipeline();
    let extract = ExtractRef {
        source: "direct".into(),
        options: ExtractOptions::default(),
    };
    let ExtractSpec::Api(source) = config.extract_spec(&extract).unwrap() else {
        panic!("expected an API source");
    };
    assert_eq!(source.url, "https://other.example.com/items");
    assert_eq!(
        source.pagination.unwrap().cursor_path.as_deref(),
        Some("meta.next")
    );
    assert_eq!(source.rate_limit, Some(RateLimitConfig::per_second(2.0)));
    assert!(source.timeout.is_none());
}

#[test]
fn test_file_and_database_sources() {
    let config = pipeline();
    let job = config.job("copy").unwrap();
    assert_eq!(
        config.extract_spec(job.extract.as_ref().unwrap()).unwrap(),
        ExtractSpec::file("in/data.csv", FileFormat::Csv)
    );

    let extract = ExtractRef {
        source: "warehouse".into(),
        options: ExtractOptions::default(),
    };
    assert_eq!(
        config.extract_spec(&extract).unwrap(),
        ExtractSpec::database("postgres://localhost/db")
    );
}

#[test]
fn test_load_spec_overrides() {
    let config = pipeline();

    let sync = config.job("sync").unwrap();
    let LoadSpec::Api {
        url,
        method,
        headers,
        timeout,
    } = config.load_spec(sync.load.as_ref().unwrap()).unwrap()
    else {
        panic!("expected an API target");
    };
    assert_eq!(url, "https://hooks.example.com/ingest");
    assert_eq!(method, Method::PATCH);
    assert_eq!(headers["X-Key"], "k");
    assert_eq!(headers["X-Extra"], "e");
    assert!(timeout.is_none());

    let copy = config.job("copy").unwrap();
    let LoadSpec::File { path, format } = config.load_spec(copy.load.as_ref().unwrap()).unwrap()
    else {
        panic!("expected a file target");
    };
    assert_eq!(path, PathBuf::from("out/users.json"));
    assert_eq!(format, FileFormat::Jsonl);
}

#[test]
fn test_validation_and_transform_resolution() {
    let config = pipeline();
    let job = config.job("sync").unwrap();

    let validation = config.validation(job.validate.as_ref().unwrap()).unwrap();
    assert_eq!(validation.severity, Severity::Warn);
    assert_eq!(validation.phase, Phase::Both);
    assert_eq!(validation.rules.len(), 1);

    let ops = config.transform_operations("clean").unwrap();
    assert_eq!(ops.filter.len(), 1);
    assert_eq!(ops.select, vec![vec!["id".to_string(), "name".to_string()]]);
    assert!(config.transform_operations("missing").unwrap().is_empty());
}

#[test]
fn test_lookup_errors() {
    let config = pipeline();
    assert!(matches!(config.job("nope"), Err(Error::JobNotFound { .. })));
    assert!(matches!(config.source("nope"), Err(Error::UnknownSource { .. })));
    assert!(matches!(config.target("nope"), Err(Error::UnknownTarget { .. })));

    let extract = ExtractRef {
        source: "nope".into(),
        options: ExtractOptions::default(),
    };
    assert!(config.extract_spec(&extract).is_err());
}

#[test]
fn test_check_reports_findings() {
    let yaml = r#"
sources:
  - name: s
    type: api
    url: https://x.example.com
    pagination: { type: page, max_pages: 0 }
    rate_limit: { max_per_sec: 0 }
jobs:
  - name: j
    extract: { source: s }
    load: { target: missing }
    transform: { pipeline: nowhere }
"#;
    let config = parse_pipeline(yaml, no_env()).unwrap();
    let findings = config.check();
    assert!(findings.contains(&"sources.s.pagination: max_pages should be > 0".to_string()));
    assert!(findings.contains(&"sources.s.rate_limit: max_per_sec should be > 0".to_string()));
    assert!(findings.contains(&"jobs.j: unknown target 'missing'".to_string()));
    assert!(findings.contains(&"jobs.j: unknown transform pipeline 'nowhere'".to_string()));

    assert!(pipeline().check().is_empty());
}
