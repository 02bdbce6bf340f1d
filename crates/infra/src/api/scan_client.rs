//! Scan-ingest API client
//!
//! Sends one scan record per `POST {base_url}/scan` and probes
//! `GET {base_url}/health` for connectivity. Implements the core
//! [`ScanIngest`] port so the offline queue can drain through it.
//!
//! Status classification:
//! - 2xx: success
//! - 401/403: `Auth`
//! - 429/503: `RateLimit`
//! - other 5xx: `Server`
//! - everything else: `Client`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tnt_core::{IngestError, ScanIngest};
use tnt_domain::constants::{API_KEY_HEADER, HEALTH_PATH, SCAN_INGEST_PATH};
use tnt_domain::{ApiConfig, ScanRecord};
use tracing::{debug, instrument, warn};

use crate::http::HttpClient;

const MAX_REASON_LEN: usize = 256;

/// Configuration for [`ScanApiClient`]
#[derive(Debug, Clone)]
pub struct ScanApiConfig {
    /// Base URL, without trailing slash (e.g. `https://host/api`)
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-attempt request timeout
    pub timeout: Duration,
    pub max_attempts: usize,
    /// Delay before the first retry; doubles per retry
    pub base_backoff: Duration,
}

impl Default for ScanApiConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ScanApiConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key: api.api_key.clone().filter(|key| !key.is_empty()),
            timeout: Duration::from_secs(api.timeout_seconds.max(1)),
            max_attempts: api.max_attempts.max(1),
            base_backoff: Duration::from_millis(200),
        }
    }
}

/// HTTP adapter for the scan-ingest endpoint.
pub struct ScanApiClient {
    http: HttpClient,
    config: ScanApiConfig,
}

impl ScanApiClient {
    /// Build a client; the API key, when set, goes out on every request.
    pub fn new(config: ScanApiConfig) -> Result<Self, IngestError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())
                .map_err(|e| IngestError::Config(format!("invalid API key header: {e}")))?;
            let value = HeaderValue::from_str(key)
                .map_err(|_| IngestError::Config("API key is not a valid header value".into()))?;
            headers.insert(name, value);
        }

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .base_backoff(config.base_backoff)
            .user_agent(concat!("tnt/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| IngestError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ScanApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Probe the health endpoint.
    ///
    /// `Ok(false)` means the API answered but is unhealthy; `Err` means it
    /// could not be reached at all.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool, IngestError> {
        let url = self.url(HEALTH_PATH);
        debug!(url = %url, "Performing health check");

        let response = self.send_request(self.http.request(Method::GET, &url)).await?;

        if response.status().is_success() {
            debug!("scan API is healthy");
            Ok(true)
        } else {
            warn!(status = %response.status(), "scan API returned non-success status");
            Ok(false)
        }
    }

    async fn send_request(&self, builder: RequestBuilder) -> Result<Response, IngestError> {
        // covers every retry the HTTP client may make
        let deadline = self
            .config
            .timeout
            .saturating_mul(u32::try_from(self.http.max_attempts()).unwrap_or(u32::MAX))
            .saturating_add(self.config.base_backoff.saturating_mul(8));

        tokio::time::timeout(deadline, self.http.send(builder))
            .await
            .map_err(|_| IngestError::Timeout(deadline))?
            .map_err(IngestError::from)
    }
}

#[async_trait]
impl ScanIngest for ScanApiClient {
    #[instrument(skip(self, scan), fields(scan = scan.label()))]
    async fn send_scan(&self, scan: &ScanRecord) -> Result<(), IngestError> {
        let builder = self.http.request(Method::POST, self.url(SCAN_INGEST_PATH)).json(scan);
        let response = self.send_request(builder).await?;
        let status = response.status();

        if status.is_success() {
            let remote_id = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("id").cloned());
            debug!(status = %status, remote_id = ?remote_id, "scan ingested");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

/// Map a non-success response to an [`IngestError`].
pub fn classify_status(status: StatusCode, body: &str) -> IngestError {
    let reason = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", truncate_reason(body.trim()))
    };

    match status.as_u16() {
        401 | 403 => IngestError::Auth(reason),
        429 | 503 => IngestError::RateLimit(reason),
        500..=599 => IngestError::Server(reason),
        _ => IngestError::Client(reason),
    }
}

fn truncate_reason(reason: &str) -> String {
    if reason.len() <= MAX_REASON_LEN {
        return reason.to_string();
    }

    let mut truncated = reason.chars().take(MAX_REASON_LEN.saturating_sub(3)).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(classify_status(StatusCode::UNAUTHORIZED, ""), IngestError::Auth(_)));
        assert!(matches!(classify_status(StatusCode::FORBIDDEN, ""), IngestError::Auth(_)));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            IngestError::RateLimit(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, ""),
            IngestError::RateLimit(_)
        ));
        assert!(matches!(classify_status(StatusCode::BAD_GATEWAY, ""), IngestError::Server(_)));
        assert!(matches!(classify_status(StatusCode::BAD_REQUEST, ""), IngestError::Client(_)));
        assert!(matches!(classify_status(StatusCode::NOT_FOUND, ""), IngestError::Client(_)));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1_000);
        let IngestError::Client(reason) = classify_status(StatusCode::BAD_REQUEST, &body) else {
            panic!("expected client error");
        };
        assert!(reason.ends_with("..."));
        assert!(reason.len() < 300);
    }

    #[test]
    fn config_strips_trailing_slash_and_empty_key() {
        let api = ApiConfig {
            base_url: "https://example.org/api/".into(),
            api_key: Some(String::new()),
            ..ApiConfig::default()
        };
        let config = ScanApiConfig::from(&api);
        assert_eq!(config.base_url, "https://example.org/api");
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn invalid_api_key_is_config_error() {
        let config = ScanApiConfig { api_key: Some("bad\nkey".into()), ..ScanApiConfig::default() };
        assert!(matches!(ScanApiClient::new(config), Err(IngestError::Config(_))));
    }
}
