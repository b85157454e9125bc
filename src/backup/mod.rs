//! Project backup
//!
//! Checks that the project exists, materializes every resource kind into a
//! fresh workspace, archives the workspace and removes it again.

pub mod archive;
pub mod workspace;

use crate::harness::auth::validate_identifier;
use crate::harness::client::HarnessClient;
use crate::harness::error::HarnessError;
use crate::harness::http::Transport;
use crate::harness::projects::get_project;
use crate::resource::fetcher::fetch_kind;
use crate::resource::kind::ResourceKind;
use crate::resource::scope::Scope;
use archive::{archive_root_name, create_tar_gz_archive};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use workspace::Workspace;

/// Inputs for one backup run
#[derive(Debug, Clone)]
pub struct BackupRequest {
    pub org: String,
    pub project: String,
    /// Archive path; defaults to `ansible_harness_project_backup_<project>.tar.gz`
    pub dest: Option<PathBuf>,
    /// Dry run: stop after the existence check
    pub check_mode: bool,
    /// Directory holding the workspace and relative destinations
    pub work_dir: PathBuf,
}

impl BackupRequest {
    pub fn new(org: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            project: project.into(),
            dest: None,
            check_mode: false,
            work_dir: PathBuf::from("."),
        }
    }

    /// Destination as the user sees it
    pub fn dest_display(&self) -> PathBuf {
        self.dest.clone().unwrap_or_else(|| default_dest(&self.project))
    }

    fn resolved_dest(&self) -> PathBuf {
        let dest = self.dest_display();
        if dest.is_absolute() {
            dest
        } else {
            self.work_dir.join(dest)
        }
    }
}

pub fn default_dest(project: &str) -> PathBuf {
    PathBuf::from(format!("ansible_harness_project_backup_{project}.tar.gz"))
}

/// Outcome reported to the caller
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub changed: bool,
    pub msg: String,
    pub dest: PathBuf,
    pub check_mode: bool,
    pub files_written: usize,
    pub completed_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStage {
    Validating,
    CheckingExistence,
    CreatingWorkspace,
    Fetching(ResourceKind),
    Archiving,
    CleaningUp,
}

impl fmt::Display for BackupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupStage::Validating => f.write_str("validating input"),
            BackupStage::CheckingExistence => f.write_str("checking project existence"),
            BackupStage::CreatingWorkspace => f.write_str("creating workspace"),
            BackupStage::Fetching(kind) => write!(f, "fetching {kind}"),
            BackupStage::Archiving => f.write_str("archiving"),
            BackupStage::CleaningUp => f.write_str("cleaning up"),
        }
    }
}

#[derive(Debug, Error)]
#[error("backup failed while {stage}: {source}")]
pub struct BackupFailure {
    pub stage: BackupStage,
    #[source]
    pub source: HarnessError,
}

impl BackupFailure {
    fn at(stage: BackupStage) -> impl FnOnce(HarnessError) -> Self {
        move |source| Self { stage, source }
    }

    /// Resource kind whose listing failed, if the failure happened while fetching
    pub fn kind(&self) -> Option<&'static str> {
        match self.stage {
            BackupStage::Fetching(kind) => Some(kind.key()),
            _ => self.source.kind(),
        }
    }
}

/// Run a full project backup
pub async fn run_backup<T: Transport>(
    client: &HarnessClient<T>,
    request: &BackupRequest,
) -> Result<BackupReport, BackupFailure> {
    validate_identifier(&request.org).map_err(BackupFailure::at(BackupStage::Validating))?;
    validate_identifier(&request.project).map_err(BackupFailure::at(BackupStage::Validating))?;

    let stage = BackupStage::CheckingExistence;
    let project = get_project(client, &request.org, &request.project)
        .await
        .map_err(BackupFailure::at(stage))?;
    if project.is_none() {
        return Err(BackupFailure {
            stage,
            source: HarnessError::NotFound {
                title: "Project".into(),
                identifier: request.project.clone(),
            },
        });
    }

    let shown_dest = request.dest_display();
    let msg = format!(
        "Project {} has been backed up to {}.",
        request.project,
        shown_dest.display()
    );

    if request.check_mode {
        tracing::info!("Check mode: skipping backup of {}", request.project);
        return Ok(report(msg, shown_dest, true, 0));
    }

    let workspace = Workspace::create(&request.work_dir)
        .map_err(BackupFailure::at(BackupStage::CreatingWorkspace))?;
    let scope = Scope::project(client.account_id(), &request.org, &request.project);

    let mut files_written = 0;
    for kind in ResourceKind::BACKUP_ORDER {
        files_written += fetch_kind(client, kind, &scope, &workspace)
            .await
            .map_err(BackupFailure::at(BackupStage::Fetching(kind)))?;
    }

    let dest = request.resolved_dest();
    archive_workspace(&workspace, &dest).map_err(BackupFailure::at(BackupStage::Archiving))?;

    workspace
        .close()
        .map_err(BackupFailure::at(BackupStage::CleaningUp))?;

    tracing::info!("{}", msg);
    Ok(report(msg, shown_dest, false, files_written))
}

/// Archive the workspace under a root named after the destination
fn archive_workspace(workspace: &Workspace, dest: &Path) -> crate::harness::error::Result<()> {
    let root = archive_root_name(dest);
    create_tar_gz_archive(workspace.path(), dest, &root)?;
    Ok(())
}

fn report(msg: String, dest: PathBuf, check_mode: bool, files_written: usize) -> BackupReport {
    BackupReport {
        changed: true,
        msg,
        dest,
        check_mode,
        files_written,
        completed_at: chrono::Utc::now().to_rfc3339(),
    }
}
