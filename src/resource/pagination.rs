//! Pagination Cursor
//!
//! The Harness API exposes three list conventions:
//!
//! - **header counted**: `X-Page-Number` / `X-Total-Elements` response headers
//! - **content-length sentinel**: a page that comes back *without* a
//!   `Content-Length` header means more pages follow (the API streams
//!   chunked bodies until the last page)
//! - **unpaginated**: one call returns everything
//!
//! [`PageCursor`] walks any of them and returns the concatenated items in
//! wire order.

use super::registry::{value_at_path, PageParams};
use crate::harness::client::HarnessClient;
use crate::harness::error::{HarnessError, Result};
use crate::harness::http::{ApiRequest, ApiResponse, Transport};
use reqwest::header::CONTENT_LENGTH;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

pub const PAGE_NUMBER_HEADER: &str = "X-Page-Number";
pub const TOTAL_ELEMENTS_HEADER: &str = "X-Total-Elements";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    HeaderCounted,
    ContentLengthSentinel,
    Unpaginated,
}

impl PaginationStyle {
    /// Decide which page to request next, or `None` when the listing is complete.
    pub fn next_page(
        self,
        kind: &'static str,
        requested_page: u32,
        page_size: u32,
        response: &ApiResponse,
    ) -> Result<Option<u32>> {
        match self {
            PaginationStyle::HeaderCounted => {
                let missing = |header: &str| HarnessError::MalformedPage {
                    kind,
                    detail: format!("missing or invalid {header} header"),
                };
                let page_number = response
                    .header_u64(PAGE_NUMBER_HEADER)
                    .ok_or_else(|| missing(PAGE_NUMBER_HEADER))?;
                let total = response
                    .header_u64(TOTAL_ELEMENTS_HEADER)
                    .ok_or_else(|| missing(TOTAL_ELEMENTS_HEADER))?;

                if (page_number + 1) * u64::from(page_size) < total {
                    let next = u32::try_from(page_number + 1).map_err(|_| {
                        HarnessError::MalformedPage {
                            kind,
                            detail: format!("page number {page_number} out of range"),
                        }
                    })?;
                    Ok(Some(next))
                } else {
                    Ok(None)
                }
            }
            PaginationStyle::ContentLengthSentinel => {
                if response.has_header(CONTENT_LENGTH.as_str()) {
                    Ok(None)
                } else {
                    Ok(Some(requested_page + 1))
                }
            }
            PaginationStyle::Unpaginated => Ok(None),
        }
    }
}

/// Literal `[]` payloads carry no usable pagination headers; treat them as the end.
pub fn is_empty_listing(body: &str) -> bool {
    body.trim() == "[]"
}

/// Walks every page of one listing endpoint
pub struct PageCursor<'a, T> {
    client: &'a HarnessClient<T>,
    kind: &'static str,
    method: Method,
    url: Url,
    body: Option<&'a Value>,
    style: PaginationStyle,
    params: Option<&'a PageParams>,
    items_path: &'a str,
}

impl<'a, T: Transport> PageCursor<'a, T> {
    pub fn new(
        client: &'a HarnessClient<T>,
        kind: &'static str,
        method: Method,
        url: Url,
        style: PaginationStyle,
        params: Option<&'a PageParams>,
        items_path: &'a str,
    ) -> Self {
        Self {
            client,
            kind,
            method,
            url,
            body: None,
            style,
            params,
            items_path,
        }
    }

    pub fn with_body(mut self, body: Option<&'a Value>) -> Self {
        self.body = body;
        self
    }

    fn page_url(&self, page: u32) -> Url {
        let mut url = self.url.clone();
        if let (Some(params), true) = (self.params, self.style != PaginationStyle::Unpaginated) {
            url.query_pairs_mut()
                .append_pair(&params.page, &page.to_string())
                .append_pair(&params.size, &self.client.page_size().to_string());
        }
        url
    }

    fn extract_items(&self, body: &str) -> Result<Vec<Value>> {
        let parsed: Value = serde_json::from_str(body)?;
        match value_at_path(&parsed, self.items_path) {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::Null) => Ok(Vec::new()),
            _ => Err(HarnessError::MalformedPage {
                kind: self.kind,
                detail: format!("expected an item array at '{}'", self.items_path),
            }),
        }
    }

    /// Fetch every page and return all items in API order
    pub async fn collect_all(self) -> Result<Vec<Value>> {
        let page_size = self.client.page_size();
        let max_pages = self.client.max_pages();
        let mut items = Vec::new();
        let mut page = 0u32;
        let mut requests = 0u32;

        loop {
            if requests >= max_pages {
                return Err(HarnessError::MalformedPage {
                    kind: self.kind,
                    detail: format!("listing did not finish within {max_pages} pages"),
                });
            }

            let request = ApiRequest {
                method: self.method.clone(),
                url: self.page_url(page),
                body: self.body.cloned(),
            };
            let response = self.client.send(request).await?;
            requests += 1;

            if !response.is_ok() {
                return Err(HarnessError::ListingFetch {
                    kind: self.kind,
                    status: response.status,
                    body: response.body,
                });
            }

            if is_empty_listing(&response.body) {
                break;
            }

            let page_items = self.extract_items(&response.body)?;
            tracing::debug!(
                "{}: page {} returned {} items",
                self.kind,
                page,
                page_items.len()
            );
            items.extend(page_items);

            match self.style.next_page(self.kind, page, page_size, &response)? {
                Some(next) => page = next,
                None => break,
            }
        }

        tracing::info!("{}: fetched {} items in {} requests", self.kind, items.len(), requests);
        Ok(items)
    }
}
