//! HTTP client for extraction and loading
//!
//! Provides a thin reqwest wrapper that handles:
//! - Default and per-request headers, query parameters and timeouts
//! - Status classification (non-2xx is an error)
//! - Response body coercion into JSON records

use crate::error::{Error, Result};
use crate::pagination::PageFetcher;
use crate::types::{JsonObject, JsonValue, Method, SourceKind, StringMap};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Timeout applied when neither the client nor the request sets one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative request paths
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            default_headers: HashMap::new(),
            user_agent: format!("solidafy-etl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
    /// Request body (JSON)
    pub body: Option<JsonValue>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter, replacing any previous value
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn queries(mut self, params: &StringMap) -> Self {
        self.query
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add several headers
    #[must_use]
    pub fn headers(mut self, headers: &StringMap) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Response of a load request
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    /// HTTP status code
    pub status_code: u16,
    /// Parsed JSON body, or the raw text when it is not JSON
    pub response: JsonValue,
}

/// HTTP client used for API sources and targets
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Make a request; non-2xx statuses become [`Error::HttpStatus`]
    pub async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        config: &RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(url);
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let mut req = self.client.request(method.clone(), &full_url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !config.query.is_empty() {
            req = req.query(&config.query);
        }
        if let Some(ref body) = config.body {
            req = req.json(body);
        }

        let response = req.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                #[allow(clippy::cast_possible_truncation)]
                Error::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        debug!("Request succeeded: {} {} ({})", method, full_url, status.as_u16());
        Ok(response)
    }

    /// GET `url` and coerce the body into JSON
    pub async fn get_json(&self, url: &str, config: &RequestConfig) -> Result<JsonValue> {
        let response = self.request(reqwest::Method::GET, url, config).await?;
        let content_type = content_type(&response);
        let text = response.text().await?;
        Ok(coerce_body(&content_type, &text))
    }

    /// Send `body` as JSON with a write method (POST, PUT or PATCH)
    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        body: JsonValue,
        config: &RequestConfig,
    ) -> Result<SendOutcome> {
        if method == Method::GET {
            return Err(Error::invalid_value(
                "method",
                "Unsupported HTTP method: GET",
            ));
        }

        let request = config.clone().json(body);
        let response = self.request(method.into(), url, &request).await?;
        let status_code = response.status().as_u16();
        let text = response.text().await?;
        let response = serde_json::from_str(&text).unwrap_or(JsonValue::String(text));

        Ok(SendOutcome {
            status_code,
            response,
        })
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(
        &self,
        kind: SourceKind,
        url: &str,
        request: &RequestConfig,
    ) -> Result<JsonValue> {
        if kind != SourceKind::Api {
            return Err(Error::invalid_value(
                "type",
                format!("HTTP client cannot fetch {kind} sources"),
            ));
        }
        self.get_json(url, request).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase()
}

/// Coerce a response body into a JSON object or array of objects.
///
/// JSON bodies keep objects and arrays of objects as they are; other arrays
/// have their items wrapped as `{"value": item}` and scalars become
/// `{"value": scalar}`. Bodies that are not JSON (by content type or because
/// they fail to parse) become `{"content": text, "content_type": type}`.
pub fn coerce_body(content_type: &str, text: &str) -> JsonValue {
    let parsed = if content_type.contains("json") {
        serde_json::from_str::<JsonValue>(text).ok()
    } else {
        None
    };

    match parsed {
        Some(JsonValue::Object(map)) => JsonValue::Object(map),
        Some(JsonValue::Array(items)) => {
            if items.iter().all(JsonValue::is_object) {
                JsonValue::Array(items)
            } else {
                JsonValue::Array(items.into_iter().map(wrap_value).collect())
            }
        }
        Some(scalar) => wrap_value(scalar),
        None => {
            let mut map = JsonObject::new();
            map.insert("content".to_string(), JsonValue::String(text.to_string()));
            map.insert(
                "content_type".to_string(),
                JsonValue::String(content_type.to_string()),
            );
            JsonValue::Object(map)
        }
    }
}

fn wrap_value(value: JsonValue) -> JsonValue {
    let mut map = JsonObject::new();
    map.insert("value".to_string(), value);
    JsonValue::Object(map)
}
