//! Backup and pagination scenarios driven by a scripted transport

mod common;

use common::*;
use flate2::read::GzDecoder;
use harness_backup::backup::{run_backup, BackupRequest, BackupStage};
use harness_backup::harness::client::ClientOptions;
use harness_backup::harness::error::HarnessError;
use harness_backup::resource::{list_kind, ResourceKind, Scope};
use reqwest::Method;
use serde_json::json;
use std::fs::File;

fn project_scope() -> Scope {
    Scope::project(ACCOUNT, ORG, PROJECT)
}

fn request_in(dir: &std::path::Path) -> BackupRequest {
    let mut request = BackupRequest::new(ORG, PROJECT);
    request.work_dir = dir.to_path_buf();
    request
}

#[tokio::test]
async fn test_connector_failure_on_second_page_aborts_backup() {
    let connectors = "/ng/api/connectors/listV2";
    let client = scripted_client(
        |req| {
            if req.url.path() == project_path() {
                return project_found();
            }
            if req.url.path() == connectors {
                return match query_param(req, "pageIndex").as_deref() {
                    Some("0") => page(
                        json!({"data": {"content": [{"connector": {"identifier": "gh"}}]}}),
                        false,
                    ),
                    _ => status(500, "internal error"),
                };
            }
            empty_listing()
        },
        20,
    );
    let work_dir = tempfile::tempdir().unwrap();

    let failure = run_backup(&client, &request_in(work_dir.path()))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, BackupStage::Fetching(ResourceKind::Connector));
    assert_eq!(failure.kind(), Some("connectors"));
    match &failure.source {
        HarnessError::ListingFetch { kind, status, body } => {
            assert_eq!(*kind, "connectors");
            assert_eq!(*status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("unexpected error {other:?}"),
    }

    // No archive and no leftover workspace
    assert!(dir_entries(work_dir.path()).is_empty());

    // Nothing after connectors was requested
    let transport = client.transport();
    assert_eq!(transport.requests_to(connectors).len(), 2);
    assert!(transport
        .requests_to("/ng/api/delegate-setup/listDelegates")
        .is_empty());
}

#[tokio::test]
async fn test_sentinel_listing_follows_missing_content_length() {
    let roles = format!("/v1/orgs/{ORG}/projects/{PROJECT}/roles");
    let client = scripted_client(
        |req| {
            let page_no: u32 = query_param(req, "page").unwrap().parse().unwrap();
            let items = json!([
                {"identifier": format!("role_{}", page_no * 2)},
                {"identifier": format!("role_{}", page_no * 2 + 1)}
            ]);
            page(items, page_no == 2)
        },
        2,
    );

    let items = list_kind(&client, ResourceKind::Role, &project_scope())
        .await
        .unwrap();

    let ids: Vec<&str> = items
        .iter()
        .map(|i| i["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["role_0", "role_1", "role_2", "role_3", "role_4", "role_5"]
    );

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 3);
    for (n, req) in requests.iter().enumerate() {
        assert_eq!(req.url.path(), roles);
        assert_eq!(query_param(req, "page"), Some(n.to_string()));
        assert_eq!(query_param(req, "limit").as_deref(), Some("2"));
    }
}

#[tokio::test]
async fn test_unpaginated_listing_makes_one_request() {
    let client = scripted_client(
        |_| {
            page(
                json!({"resource": [{"name": "d1"}, {"name": "d2"}]}),
                false,
            )
        },
        20,
    );

    let items = list_kind(&client, ResourceKind::Delegate, &project_scope())
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.body, Some(json!({"filterType": "Delegate"})));
    assert_eq!(query_param(req, "page"), None);
    assert_eq!(query_param(req, "accountIdentifier").as_deref(), Some(ACCOUNT));
    assert_eq!(query_param(req, "projectIdentifier").as_deref(), Some(PROJECT));
}

#[tokio::test]
async fn test_runaway_listing_stops_at_max_pages() {
    let options = ClientOptions {
        max_pages: 3,
        ..ClientOptions::default()
    };
    let client = scripted_client_with(|_| page(json!([{"identifier": "again"}]), false), options);

    let err = list_kind(&client, ResourceKind::Role, &project_scope())
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::MalformedPage { kind: "roles", .. }));
    assert_eq!(client.transport().requests().len(), 3);
}

#[tokio::test]
async fn test_empty_project_produces_archive_with_only_root() {
    let client = scripted_client(
        |req| {
            if req.url.path() == project_path() {
                project_found()
            } else {
                empty_listing()
            }
        },
        20,
    );
    let work_dir = tempfile::tempdir().unwrap();
    let mut request = request_in(work_dir.path());
    request.dest = Some("empty.tar.gz".into());

    let report = run_backup(&client, &request).await.unwrap();
    assert!(report.changed);
    assert_eq!(report.files_written, 0);
    assert_eq!(report.msg, "Project demo has been backed up to empty.tar.gz.");
    assert_eq!(dir_entries(work_dir.path()), vec!["empty.tar.gz"]);

    let archive_path = work_dir.path().join("empty.tar.gz");
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(archive_path).unwrap()));
    let paths: Vec<_> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().into_owned())
        .collect();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].components().count(), 1);
    assert_eq!(paths[0].components().next().unwrap().as_os_str(), "empty");

    // One existence check plus one listing per top-level kind
    assert_eq!(
        client.transport().requests().len(),
        1 + ResourceKind::BACKUP_ORDER.len()
    );
}

#[tokio::test]
async fn test_check_mode_only_checks_existence() {
    let client = scripted_client(
        |req| {
            if req.url.path() == project_path() {
                project_found()
            } else {
                status(500, "unexpected")
            }
        },
        20,
    );
    let work_dir = tempfile::tempdir().unwrap();
    let mut request = request_in(work_dir.path());
    request.check_mode = true;

    let report = run_backup(&client, &request).await.unwrap();
    assert!(report.changed);
    assert!(report.check_mode);
    assert_eq!(client.transport().requests().len(), 1);
    assert!(dir_entries(work_dir.path()).is_empty());
}

#[tokio::test]
async fn test_dashed_identifier_is_rejected_before_any_request() {
    let client = scripted_client(|_| project_found(), 20);
    let work_dir = tempfile::tempdir().unwrap();
    let mut request = request_in(work_dir.path());
    request.project = "my-project".into();

    let failure = run_backup(&client, &request).await.unwrap_err();
    assert_eq!(failure.stage, BackupStage::Validating);
    assert!(matches!(failure.source, HarnessError::InvalidIdentifier(_)));
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn test_environment_triggers_infrastructure_listing() {
    let client = scripted_client(
        |req| match req.url.path() {
            p if p == project_path() => project_found(),
            "/ng/api/environmentsV2" => page(
                json!({"data": {"content": [
                    {"environment": {"identifier": "qa", "yaml": "environment:\n  identifier: qa\n"}}
                ]}}),
                true,
            ),
            _ => empty_listing(),
        },
        20,
    );
    let work_dir = tempfile::tempdir().unwrap();

    let report = run_backup(&client, &request_in(work_dir.path()))
        .await
        .unwrap();
    assert_eq!(report.files_written, 1);

    let infra_requests = client.transport().requests_to("/ng/api/infrastructures");
    assert_eq!(infra_requests.len(), 1);
    assert_eq!(
        query_param(&infra_requests[0], "environmentIdentifier").as_deref(),
        Some("qa")
    );
}

#[tokio::test]
async fn test_archive_failure_removes_workspace() {
    let client = scripted_client(
        |req| match req.url.path() {
            p if p == project_path() => project_found(),
            "/v1/orgs/default/projects/demo/roles" => {
                page(json!([{"identifier": "viewer"}]), true)
            }
            _ => empty_listing(),
        },
        20,
    );
    let work_dir = tempfile::tempdir().unwrap();
    // A directory at the destination makes the archive impossible to create
    std::fs::create_dir(work_dir.path().join("blocked.tar.gz")).unwrap();
    let mut request = request_in(work_dir.path());
    request.dest = Some("blocked.tar.gz".into());

    let failure = run_backup(&client, &request).await.unwrap_err();

    assert_eq!(failure.stage, BackupStage::Archiving);
    assert!(matches!(failure.source, HarnessError::Archive { .. }));
    assert_eq!(failure.kind(), None);
    assert_eq!(dir_entries(work_dir.path()), vec!["blocked.tar.gz"]);
    assert!(work_dir.path().join("blocked.tar.gz").is_dir());
    assert!(!dir_entries(work_dir.path())
        .iter()
        .any(|name| name.starts_with(".harness-backup-tmp-")));
}
