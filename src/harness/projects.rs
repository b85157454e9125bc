//! Harness Projects
//!
//! Existence lookup for a single project.

use super::client::HarnessClient;
use super::error::Result;
use super::http::Transport;
use serde_json::Value;

/// Project information
#[derive(Debug, Clone)]
pub struct Project {
    pub identifier: String,
    pub name: String,
    pub org: String,
}

impl Project {
    fn from_value(value: &Value, fallback_id: &str, org: &str) -> Self {
        // v1 responses wrap the object: {"project": {...}, "created": ..., ...}
        let project = value.get("project").unwrap_or(value);
        let field = |name: &str| project.get(name).and_then(|v| v.as_str());
        Self {
            identifier: field("identifier").unwrap_or(fallback_id).to_string(),
            name: field("name").unwrap_or(fallback_id).to_string(),
            org: field("org").unwrap_or(org).to_string(),
        }
    }
}

/// Look up a project; `Ok(None)` when it does not exist
pub async fn get_project<T: Transport>(
    client: &HarnessClient<T>,
    org: &str,
    identifier: &str,
) -> Result<Option<Project>> {
    let url = client.v1_org_url(org, &format!("projects/{}", urlencoding::encode(identifier)))?;
    let project = client
        .get_object(url)
        .await?
        .map(|value| Project::from_value(&value, identifier, org));

    match &project {
        Some(p) => tracing::info!("Found project {} ({}) in org {}", p.identifier, p.name, p.org),
        None => tracing::info!("Project {} not found in org {}", identifier, org),
    }
    Ok(project)
}
