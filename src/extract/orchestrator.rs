//! Source dispatch

use super::file::{extract_database, extract_file};
use super::types::{ApiSource, ExtractSpec};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{PageFetcher, Paginator};
use crate::types::JsonValue;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extracts records from files, the database stub, or REST APIs.
///
/// API requests go through the injected [`PageFetcher`], which makes the
/// orchestrator testable without a network.
#[derive(Clone)]
pub struct ExtractOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
}

impl ExtractOrchestrator {
    /// Create an orchestrator over `fetcher`
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Create an orchestrator backed by a default [`HttpClient`]
    pub fn http() -> Result<Self> {
        Ok(Self::new(Arc::new(HttpClient::new()?)))
    }

    /// Extract from `spec`
    pub async fn extract(&self, spec: &ExtractSpec) -> Result<JsonValue> {
        match spec {
            ExtractSpec::File { path, format } => {
                debug!("Extracting {} from {}", format, path.display());
                extract_file(path, *format)
            }
            ExtractSpec::Database { connection_string } => {
                warn!("Database extraction is not implemented; returning a placeholder");
                Ok(extract_database(connection_string))
            }
            ExtractSpec::Api(source) => self.extract_api(source).await,
        }
    }

    /// Fetch an API source, paginating when its config names a strategy
    pub async fn extract_api(&self, source: &ApiSource) -> Result<JsonValue> {
        let mut request = RequestConfig::new()
            .queries(&source.params)
            .headers(&source.headers);
        if let Some(timeout) = source.timeout {
            request = request.timeout(timeout);
        }

        if let Some(pagination) = &source.pagination {
            for warning in pagination.validate_bounds() {
                warn!("Pagination config for {}: {}", source.url, warning);
            }
        }

        let mut paginator = Paginator::new(Arc::clone(&self.fetcher));
        if let Some(rate_limit) = &source.rate_limit {
            for warning in rate_limit.validate_bounds() {
                warn!("Rate limit config for {}: {}", source.url, warning);
            }
            paginator = paginator.with_pacer(rate_limit.pacer());
        }

        let data = paginator
            .paginate(&source.url, &request, source.pagination.as_ref())
            .await?;

        match &data {
            JsonValue::Array(items) => info!("Extracted {} records from {}", items.len(), source.url),
            _ => info!("Extracted payload from {}", source.url),
        }
        Ok(data)
    }
}

impl std::fmt::Debug for ExtractOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractOrchestrator").finish_non_exhaustive()
    }
}
