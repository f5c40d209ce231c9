//! HTTP Transport Layer
//!
//! The dispatch gate only needs "send this request, give me status and
//! body". That seam is the [`Transport`] trait, so the gate can be driven by
//! an in-memory transport in tests and by [`HttpTransport`] in production.
//!
//! # Headers
//!
//! Every request carries:
//!
//! - `X-API-Key`: the configured key (marked sensitive)
//! - `User-Agent`: `rustmaps-client/{version}`
//! - `Accept`: `application/json`

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::request::{ApiRequest, Method};

pub const USER_AGENT_VALUE: &str = concat!("rustmaps-client/", env!("CARGO_PKG_VERSION"));

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Transport trait for rustmaps communication
///
/// Implementations perform exactly one exchange per call and never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return whatever status the server answered with
    ///
    /// # Errors
    ///
    /// Only for failures below the HTTP status level (timeouts, refused
    /// connections). Non-2xx statuses are returned as `Ok`.
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// reqwest-backed transport for rustmaps.com
pub struct HttpTransport {
    /// Reqwest HTTP client with default headers and timeout applied
    client: reqwest::Client,

    /// API base URL, no trailing slash
    base_url: String,

    /// Request timeout
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from the client configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the API key cannot be used as a header
    /// value or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| ClientError::InvalidConfig(format!("API key is not a valid header: {}", e)))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url_for(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.path_and_query())
    }

    fn map_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        let url = self.url_for(request);
        tracing::debug!("Sending HTTP {} to {}", request.method(), url);

        let builder = match request.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        tracing::debug!("Received HTTP {} from {}", status, url);
        Ok(RawResponse { status, body })
    }
}
