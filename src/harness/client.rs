//! Harness Client
//!
//! Main client for interacting with the Harness API: credentials, base URL,
//! paging limits and the transport, passed explicitly to every call site.

use super::auth::HarnessCredentials;
use super::error::{HarnessError, Result};
use super::http::{ApiRequest, ApiResponse, HarnessHttpClient, Transport};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://app.harness.io";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_PAGES: u32 = 10_000;

/// Tunables for a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: Url,
    pub timeout: Duration,
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Main Harness client
#[derive(Clone)]
pub struct HarnessClient<T = HarnessHttpClient> {
    transport: T,
    account_id: String,
    base_url: Url,
    page_size: u32,
    max_pages: u32,
}

impl HarnessClient<HarnessHttpClient> {
    /// Create a client talking HTTP with the given credentials
    pub fn new(credentials: &HarnessCredentials, options: ClientOptions) -> Result<Self> {
        let http = HarnessHttpClient::new(credentials.headers()?, options.timeout)?;
        Ok(Self::with_transport(http, credentials.account_id(), options))
    }
}

impl<T: Transport> HarnessClient<T> {
    /// Create a client on top of any transport
    pub fn with_transport(transport: T, account_id: &str, options: ClientOptions) -> Self {
        Self {
            transport,
            account_id: account_id.to_string(),
            base_url: options.base_url,
            page_size: options.page_size.max(1),
            max_pages: options.max_pages.max(1),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one request as-is
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.transport.execute(request).await
    }

    /// Fetch a single object by URL.
    /// `Ok(None)` means 404; any status other than 200/404 is treated as bad credentials.
    pub async fn get_object(&self, url: Url) -> Result<Option<Value>> {
        let response = self.send(ApiRequest::get(url)).await?;
        match response.status {
            200 => {
                let value = if response.body.trim().is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(&response.body)?
                };
                Ok(Some(value))
            }
            404 => Ok(None),
            status => Err(HarnessError::UnauthorizedOrMalformed { status }),
        }
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a URL below the base URL from already-encoded path segments
    pub fn api_url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?)
    }

    /// Build an organization-scoped `v1` URL
    pub fn v1_org_url(&self, org: &str, resource: &str) -> Result<Url> {
        self.api_url(&format!("v1/orgs/{}/{}", urlencoding::encode(org), resource))
    }
}
