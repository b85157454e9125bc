//! Resource Registry - Load resource definitions from JSON
//!
//! Every Harness resource kind is described declaratively (endpoint per
//! scope level, pagination style, where the items and identifiers live, and
//! how an item is written to disk). One generic fetch routine consumes these
//! descriptors instead of a hand-written fetcher per kind.

use super::pagination::PaginationStyle;
use super::scope::{Scope, ScopeLevel};
use crate::harness::error::{HarnessError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/harness.json")];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Where the organization/project identifiers go in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeIn {
    /// `/v1/orgs/{org}/projects/{project}/...`; the account travels in a header
    Path,
    /// `accountIdentifier` / `orgIdentifier` / `projectIdentifier` query parameters
    Query,
}

/// Endpoint path template for each scope level the API supports
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Endpoints {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

impl Endpoints {
    fn for_level(&self, level: ScopeLevel) -> Option<&str> {
        match level {
            ScopeLevel::Account => self.account.as_deref(),
            ScopeLevel::Org => self.org.as_deref(),
            ScopeLevel::Project => self.project.as_deref(),
        }
    }
}

/// Names of the page-number and page-size query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    pub page: String,
    pub size: String,
}

/// How one item is turned into file contents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputMode {
    /// The API already returns YAML text at `yaml_path`; write it untouched
    Verbatim { yaml_path: String },
    /// Re-serialize the record as YAML, optionally keeping only one top-level key
    Structured {
        #[serde(default)]
        keep: Option<String>,
    },
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub method: HttpMethod,
    pub scope_in: ScopeIn,
    pub endpoints: Endpoints,
    #[serde(default)]
    pub query: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<Value>,
    pub pagination: PaginationStyle,
    #[serde(default)]
    pub page_params: Option<PageParams>,
    /// Dot path to the item array; empty means the body itself is the array
    pub items_path: String,
    pub id_path: String,
    pub output: OutputMode,
}

impl ResourceDef {
    /// Build the listing URL (without page parameters) for a scope.
    /// `environment` fills the `{environment}` placeholder of nested kinds.
    pub fn listing_url(
        &self,
        key: &'static str,
        base_url: &Url,
        scope: &Scope,
        environment: Option<&str>,
    ) -> Result<Url> {
        let level = scope.level();
        let template = self
            .endpoints
            .for_level(level)
            .ok_or(HarnessError::UnsupportedScope {
                kind: key,
                level: level.as_str(),
            })?;

        let path = render_template(template, scope, environment)?;
        let mut url = Url::parse(&format!(
            "{}{}",
            base_url.as_str().trim_end_matches('/'),
            path
        ))?;

        {
            let mut pairs = url.query_pairs_mut();
            if self.scope_in == ScopeIn::Query {
                pairs.append_pair("accountIdentifier", scope.account_id());
                if let Some(org) = scope.org_id() {
                    pairs.append_pair("orgIdentifier", org);
                }
                if let Some(project) = scope.project_id() {
                    pairs.append_pair("projectIdentifier", project);
                }
            }
            for (name, value) in &self.query {
                let value = render_value(value, scope, environment)?;
                pairs.append_pair(name, &value);
            }
        }

        Ok(url)
    }
}

fn placeholder_value<'a>(
    name: &str,
    scope: &'a Scope,
    environment: Option<&'a str>,
) -> Result<&'a str> {
    let value = match name {
        "org" => scope.org_id(),
        "project" => scope.project_id(),
        "environment" => environment,
        _ => None,
    };
    value.ok_or_else(|| HarnessError::InvalidScope(format!("no value for {{{name}}}")))
}

/// Substitute `{name}` placeholders in a path, percent-encoding each value
fn render_template(template: &str, scope: &Scope, environment: Option<&str>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            return Err(HarnessError::InvalidScope(format!(
                "unterminated placeholder in {template}"
            )));
        };
        let name = &rest[start + 1..start + len];
        let value = placeholder_value(name, scope, environment)?;
        out.push_str(&urlencoding::encode(value));
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Query values are either literals or a single `{name}` placeholder
fn render_value(value: &str, scope: &Scope, environment: Option<&str>) -> Result<String> {
    match value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
        Some(name) => placeholder_value(name, scope, environment).map(str::to_string),
        None => Ok(value.to_string()),
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Human-readable name of a kind, or the key itself when it is unknown
pub fn display_name(key: &str) -> &str {
    get_resource(key).map_or(key, |def| def.display_name.as_str())
}

/// Look up a value by dot path; an empty path is the value itself
pub fn value_at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, part| current.get(part))
}
