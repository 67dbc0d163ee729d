//! Extract types

use crate::http::RateLimitConfig;
use crate::pagination::PaginationConfig;
use crate::types::{FileFormat, StringMap};
use std::path::PathBuf;
use std::time::Duration;

/// A REST endpoint to extract from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiSource {
    /// Absolute endpoint URL
    pub url: String,
    /// Base query parameters, kept under pagination parameters
    pub params: StringMap,
    pub headers: StringMap,
    /// Paginated when set with a recognized type
    pub pagination: Option<PaginationConfig>,
    /// Pause between pages
    pub rate_limit: Option<RateLimitConfig>,
    pub timeout: Option<Duration>,
}

impl ApiSource {
    /// Create a source for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Add a base query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set pagination
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Set the pacing between pages
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Where to extract from
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractSpec {
    /// A local file, or an inline JSON payload in place of a path
    File { path: PathBuf, format: FileFormat },
    /// Database placeholder
    Database { connection_string: String },
    Api(ApiSource),
}

impl ExtractSpec {
    /// File source
    pub fn file(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self::File {
            path: path.into(),
            format,
        }
    }

    /// Database source
    pub fn database(connection_string: impl Into<String>) -> Self {
        Self::Database {
            connection_string: connection_string.into(),
        }
    }
}
