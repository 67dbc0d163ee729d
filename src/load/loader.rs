//! Target dispatch

use super::types::{record_count, LoadResult, LoadSpec, LoadStatus};
use super::writer::write_file;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::{JsonValue, Method, StringMap};
use std::time::Duration;
use tracing::{info, warn};

/// Writes records to files, REST APIs, or the database placeholder
#[derive(Debug, Clone)]
pub struct Loader {
    client: HttpClient,
}

impl Loader {
    /// Create a loader that sends API loads through `client`
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Create a loader backed by a default [`HttpClient`]
    pub fn http() -> Result<Self> {
        Ok(Self::new(HttpClient::new()?))
    }

    /// Load `data` into `spec`
    pub async fn load(&self, data: &JsonValue, spec: &LoadSpec) -> Result<LoadResult> {
        let result = match spec {
            LoadSpec::File { path, format } => write_file(data, path, *format)?,
            LoadSpec::Database { connection_string } => {
                warn!("Database loading is not implemented; nothing was written");
                load_to_database(data, connection_string)
            }
            LoadSpec::Api {
                url,
                method,
                headers,
                timeout,
            } => {
                self.load_to_api(data, url, *method, headers, *timeout)
                    .await?
            }
        };

        info!("{} ({} records)", result.message, result.records);
        Ok(result)
    }

    /// Send `data` as a JSON body; only POST, PUT and PATCH are accepted
    pub async fn load_to_api(
        &self,
        data: &JsonValue,
        url: &str,
        method: Method,
        headers: &StringMap,
        timeout: Option<Duration>,
    ) -> Result<LoadResult> {
        let mut request = RequestConfig::new().headers(headers);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let outcome = self
            .client
            .send_json(method, url, data.clone(), &request)
            .await?;

        Ok(LoadResult {
            status_code: Some(outcome.status_code),
            response: Some(outcome.response),
            ..LoadResult::success(format!("Data loaded to {url}"), record_count(data))
        })
    }
}

/// Placeholder result for database targets
pub fn load_to_database(data: &JsonValue, connection_string: &str) -> LoadResult {
    LoadResult {
        status: LoadStatus::NotImplemented,
        status_code: None,
        message: "Database loading not yet implemented".to_string(),
        response: None,
        connection_string: Some(connection_string.to_string()),
        records: record_count(data),
        note: Some("Install database-specific drivers to enable this feature".to_string()),
    }
}
