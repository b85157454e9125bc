//! Shared helpers for integration tests
//!
//! wiremock always answers with a `Content-Length` header, so listings that
//! page by the absence of that header are driven through [`ScriptedTransport`].

#![allow(dead_code)]

use harness_backup::harness::client::{ClientOptions, HarnessClient};
use harness_backup::harness::error::Result;
use harness_backup::harness::http::{ApiRequest, ApiResponse, Transport};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
use serde_json::Value;
use std::sync::Mutex;

pub const ACCOUNT: &str = "test_account";
pub const ORG: &str = "default";
pub const PROJECT: &str = "demo";

/// Answers every request through a routing closure and records what was sent
pub struct ScriptedTransport<F> {
    route: F,
    requests: Mutex<Vec<ApiRequest>>,
}

impl<F> ScriptedTransport<F>
where
    F: Fn(&ApiRequest) -> ApiResponse + Send + Sync,
{
    pub fn new(route: F) -> Self {
        Self {
            route,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose URL path equals `path`
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }
}

impl<F> Transport for ScriptedTransport<F>
where
    F: Fn(&ApiRequest) -> ApiResponse + Send + Sync,
{
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = (self.route)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

/// A client over a scripted transport
pub fn scripted_client<F>(route: F, page_size: u32) -> HarnessClient<ScriptedTransport<F>>
where
    F: Fn(&ApiRequest) -> ApiResponse + Send + Sync,
{
    let options = ClientOptions {
        page_size,
        ..ClientOptions::default()
    };
    scripted_client_with(route, options)
}

pub fn scripted_client_with<F>(route: F, options: ClientOptions) -> HarnessClient<ScriptedTransport<F>>
where
    F: Fn(&ApiRequest) -> ApiResponse + Send + Sync,
{
    HarnessClient::with_transport(ScriptedTransport::new(route), ACCOUNT, options)
}

/// A 200 page; `last` controls whether `Content-Length` is present
pub fn page(body: Value, last: bool) -> ApiResponse {
    let body = body.to_string();
    let mut headers = HeaderMap::new();
    if last {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len() as u64));
    }
    ApiResponse {
        status: 200,
        headers,
        body,
    }
}

pub fn empty_listing() -> ApiResponse {
    page(Value::Array(Vec::new()), true)
}

pub fn status(code: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status: code,
        headers: HeaderMap::new(),
        body: body.to_string(),
    }
}

pub fn query_param(request: &ApiRequest, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub fn project_path() -> String {
    format!("/v1/orgs/{ORG}/projects/{PROJECT}")
}

/// 200 for the project lookup
pub fn project_found() -> ApiResponse {
    page(
        serde_json::json!({"project": {"identifier": PROJECT, "name": "Demo", "org": ORG}}),
        true,
    )
}

/// Entries of a workspace parent directory, by name
pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
