//! Resource Fetcher
//!
//! Lists resources of one kind through the registry descriptor and writes
//! each item into the backup workspace.

use super::kind::ResourceKind;
use super::pagination::PageCursor;
use super::registry::{value_at_path, OutputMode, ResourceDef};
use super::scope::Scope;
use crate::backup::workspace::Workspace;
use crate::harness::client::HarnessClient;
use crate::harness::error::{HarnessError, Result};
use crate::harness::http::Transport;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Fetch every item of `kind` visible at `scope`
pub async fn list_kind<T: Transport>(
    client: &HarnessClient<T>,
    kind: ResourceKind,
    scope: &Scope,
) -> Result<Vec<Value>> {
    list_with_parent(client, kind, scope, None).await
}

/// Like [`list_kind`], filling the `{environment}` placeholder of nested kinds
pub async fn list_with_parent<T: Transport>(
    client: &HarnessClient<T>,
    kind: ResourceKind,
    scope: &Scope,
    environment: Option<&str>,
) -> Result<Vec<Value>> {
    let def = kind.definition();
    let url = def.listing_url(kind.key(), client.base_url(), scope, environment)?;

    PageCursor::new(
        client,
        kind.key(),
        def.method.into(),
        url,
        def.pagination,
        def.page_params.as_ref(),
        &def.items_path,
    )
    .with_body(def.body.as_ref())
    .collect_all()
    .await
}

/// One item ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedItem {
    pub key: String,
    pub contents: String,
}

/// Turn a raw API record into a directory key and file contents
pub fn render_item(kind: &'static str, def: &ResourceDef, item: &Value) -> Result<RenderedItem> {
    let malformed = |detail: String| HarnessError::MalformedPage { kind, detail };

    let identifier = value_at_path(item, &def.id_path)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(format!("item has no string at '{}'", def.id_path)))?;

    let key = directory_key(identifier);
    if key != identifier {
        tracing::warn!("{kind}: '{identifier}' is not a safe directory name, using '{key}'");
    }

    let contents = match &def.output {
        OutputMode::Verbatim { yaml_path } => value_at_path(item, yaml_path)
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(format!("item {identifier} has no YAML at '{yaml_path}'")))?
            .to_string(),
        OutputMode::Structured { keep: Some(field) } => {
            let mut kept = Map::new();
            kept.insert(
                field.clone(),
                item.get(field).cloned().unwrap_or(Value::Null),
            );
            serde_yaml::to_string(&Value::Object(kept))?
        }
        OutputMode::Structured { keep: None } => serde_yaml::to_string(item)?,
    };

    Ok(RenderedItem {
        key: key.into_owned(),
        contents,
    })
}

/// Make a display name or identifier safe to use as one path component.
/// Path separators, NUL and leading dots become `_`; empty names become `unnamed`.
pub fn directory_key(raw: &str) -> Cow<'_, str> {
    let needs_fix = raw.is_empty()
        || raw.starts_with('.')
        || raw.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if !needs_fix {
        return Cow::Borrowed(raw);
    }
    if raw.is_empty() {
        return Cow::Owned("unnamed".to_string());
    }

    let mut key: String = raw
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let dots = key.len() - key.trim_start_matches('.').len();
    key.replace_range(..dots, &"_".repeat(dots));
    Cow::Owned(key)
}

/// Write rendered items below `relative_dir`, warning when two items share a key
fn write_items(
    workspace: &Workspace,
    kind: ResourceKind,
    relative_dir: &Path,
    items: &[Value],
) -> Result<Vec<String>> {
    let def = kind.definition();
    let mut seen = HashSet::new();
    let mut keys = Vec::with_capacity(items.len());

    for item in items {
        let rendered = render_item(kind.key(), def, item)?;
        if !seen.insert(rendered.key.clone()) {
            tracing::warn!(
                "{kind}: duplicate key '{}', the later item overwrites the earlier one",
                rendered.key
            );
        }
        workspace.write_item(relative_dir, &rendered.key, &rendered.contents)?;
        keys.push(rendered.key);
    }
    Ok(keys)
}

/// Back up every item of `kind` into the workspace; returns the number of files written.
///
/// Environments also pull their infrastructure definitions into
/// `environments/<env>/infrastructures/`.
pub async fn fetch_kind<T: Transport>(
    client: &HarnessClient<T>,
    kind: ResourceKind,
    scope: &Scope,
    workspace: &Workspace,
) -> Result<usize> {
    let items = list_kind(client, kind, scope).await?;
    let relative_dir = PathBuf::from(kind.key());
    let keys = write_items(workspace, kind, &relative_dir, &items)?;
    let mut written = keys.len();

    if kind == ResourceKind::Environment {
        for (item, env_key) in items.iter().zip(&keys) {
            let env_id = value_at_path(item, &kind.definition().id_path)
                .and_then(Value::as_str)
                .unwrap_or(env_key);
            written += fetch_infrastructures(client, scope, env_id, env_key, workspace).await?;
        }
    }

    tracing::info!("{}: wrote {} files", kind, written);
    Ok(written)
}

async fn fetch_infrastructures<T: Transport>(
    client: &HarnessClient<T>,
    scope: &Scope,
    env_id: &str,
    env_key: &str,
    workspace: &Workspace,
) -> Result<usize> {
    let kind = ResourceKind::InfrastructureDefinition;
    let items = list_with_parent(client, kind, scope, Some(env_id)).await?;
    let relative_dir = Path::new(ResourceKind::Environment.key())
        .join(env_key)
        .join(kind.key());
    Ok(write_items(workspace, kind, &relative_dir, &items)?.len())
}
