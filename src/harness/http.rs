//! HTTP utilities for Harness REST API calls

use super::error::Result;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// One outbound API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
        }
    }
}

/// Raw response: status, headers and the undecoded body.
/// Pagination needs the headers, so nothing is interpreted here.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Header value parsed as an integer
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }
}

/// The seam between Harness API logic and the wire
pub trait Transport: Send + Sync {
    fn execute(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse>> + Send;
}

/// HTTP client wrapper for Harness API calls
#[derive(Clone)]
pub struct HarnessHttpClient {
    client: Client,
}

impl HarnessHttpClient {
    /// Create a new HTTP client sending `headers` on every request
    pub fn new(headers: HeaderMap, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("harness-backup/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HarnessHttpClient {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        tracing::debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method, request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status != 200 {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::warn!("API returned {} - {}", status, sanitize_for_log(&body));
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
