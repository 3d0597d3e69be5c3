//! HTTP client for the remote scan and search services.
//!
//! # Requirements
//!
//! - An API key for the platform
//! - Network access to the platform's API gateway
//!
//! # API Usage
//!
//! - `POST /scans` submits a scan; the new scan's URL is returned in the
//!   `Location` header of a `201 Created` response.
//! - `GET /scans/{id}` returns the scan and its status.
//! - `GET /scans/{id}/execution-details` returns crawl and attack counters.
//! - `POST /search?index=&size=` runs a search one page at a time.

use crate::core::{
    Scan, ScanApi, ScanError, ScanExecutionDetails, ScanId, SearchApi, SearchPage,
    SearchRequest, Vulnerability,
};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-api-key";
const MAX_ERROR_BODY: usize = 512;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// API key (kept secret).
    pub api_key: SecretString,

    /// Base URL of the API, including the version prefix.
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Number of results requested per search page.
    pub page_size: u32,
}

impl HttpClientConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into().into()),
            base_url: "https://us.api.insight.rapid7.com/ias/v1".to_string(),
            timeout: Duration::from_secs(60),
            page_size: 1000,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the search page size.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size.max(1);
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct SubmitScanBody<'a> {
    scan_config: IdRef<'a>,
}

#[derive(Debug, Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

/// Client for the scan and search services.
///
/// One client may be shared by concurrent runs; `reqwest` pools
/// connections internally and requests carry no per-run state.
///
/// # Example
///
/// ```rust,ignore
/// use scanpilot::backends::http::{HttpClientConfig, InsightApiClient};
///
/// let config = HttpClientConfig::new("your-api-key");
/// let client = InsightApiClient::new(config)?;
/// ```
#[derive(Debug, Clone)]
pub struct InsightApiClient {
    config: HttpClientConfig,
    client: reqwest::Client,
}

impl InsightApiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScanError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &str,
        path: &str,
    ) -> Result<T, ScanError> {
        let response = self
            .client
            .get(self.config.url(path))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ScanError::connection_failed(service, e.to_string()))?;

        let response = ensure_success(service, response).await?;

        response
            .json()
            .await
            .map_err(|e| ScanError::ambiguous_response(service, e.to_string()))
    }
}

async fn ensure_success(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ScanError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ScanError::UnexpectedStatus {
        service: service.to_string(),
        status,
        body: truncate(&body, MAX_ERROR_BODY),
    })
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[async_trait]
impl ScanApi for InsightApiClient {
    async fn submit_scan(&self, scan_config_id: &str) -> Result<ScanId, ScanError> {
        let body = SubmitScanBody {
            scan_config: IdRef { id: scan_config_id },
        };

        let response = self
            .client
            .post(self.config.url("scans"))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::submission_failed(e.to_string()))?;

        if response.status() != reqwest::StatusCode::CREATED {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ScanError::submission_failed(format!(
                "response {}: {}",
                status,
                truncate(&text, MAX_ERROR_BODY)
            )));
        }

        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(ScanId::from_location)
            .ok_or_else(|| ScanError::submission_failed("response did not include a scan location"))
    }

    async fn get_scan(&self, scan_id: &ScanId) -> Result<Scan, ScanError> {
        self.get_json("scan", &format!("scans/{}", scan_id)).await
    }

    async fn get_execution_details(
        &self,
        scan_id: &ScanId,
    ) -> Result<ScanExecutionDetails, ScanError> {
        self.get_json("scan", &format!("scans/{}/execution-details", scan_id))
            .await
    }
}

#[async_trait]
impl SearchApi for InsightApiClient {
    async fn search_page(
        &self,
        request: &SearchRequest,
        index: u32,
    ) -> Result<SearchPage<Vulnerability>, ScanError> {
        let response = self
            .client
            .post(self.config.url("search"))
            .query(&[("index", index), ("size", self.config.page_size)])
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| ScanError::connection_failed("search", e.to_string()))?;

        let response = ensure_success("search", response).await?;

        response
            .json()
            .await
            .map_err(|e| ScanError::ambiguous_response("search", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = HttpClientConfig::new("test-key")
            .with_base_url("https://eu.example.com/ias/v1/")
            .with_page_size(0)
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.page_size, 1);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.url("/scans"), "https://eu.example.com/ias/v1/scans");
    }

    #[test]
    fn test_submit_body_shape() {
        let body = SubmitScanBody {
            scan_config: IdRef { id: "cfg-1" },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"scan_config": {"id": "cfg-1"}})
        );
    }

    #[test]
    fn test_search_body_shape() {
        let request = SearchRequest::vulnerabilities("vulnerability.scans.id='abc'");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"type": "VULNERABILITY", "query": "vulnerability.scans.id='abc'"})
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[test]
    fn test_api_key_is_not_debug_printed() {
        let config = HttpClientConfig::new("super-secret-key");
        assert!(!format!("{:?}", config).contains("super-secret-key"));
    }
}
