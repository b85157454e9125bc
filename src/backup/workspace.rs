//! Ephemeral working directory for one backup run.
//!
//! The directory is removed when the [`Workspace`] is closed or dropped, so
//! every exit path of a backup cleans up after itself.

use crate::harness::error::{HarnessError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const WORKSPACE_PREFIX: &str = ".harness-backup-tmp-";

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a fresh, uniquely named directory under `parent`.
    /// Fails rather than reusing a directory that already exists.
    pub fn create(parent: &Path) -> Result<Self> {
        let path = parent.join(format!("{WORKSPACE_PREFIX}{}", Uuid::new_v4()));
        fs::create_dir(&path).map_err(|e| HarnessError::filesystem(&path, e))?;
        tracing::debug!("Created workspace {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `<relative_dir>/<key>/<key>.yaml`, creating directories on demand.
    /// An existing file is overwritten.
    pub fn write_item(&self, relative_dir: &Path, key: &str, contents: &str) -> Result<PathBuf> {
        let dir = self.path.join(relative_dir).join(key);
        fs::create_dir_all(&dir).map_err(|e| HarnessError::filesystem(&dir, e))?;
        let file = dir.join(format!("{key}.yaml"));
        fs::write(&file, contents).map_err(|e| HarnessError::filesystem(&file, e))?;
        Ok(file)
    }

    /// Remove the directory tree now, reporting failures
    pub fn close(mut self) -> Result<()> {
        self.removed = true;
        remove_tree(&self.path)
    }
}

fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            tracing::debug!("Removed workspace {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HarnessError::filesystem(path, e)),
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_tree(&self.path) {
            tracing::warn!("Failed to remove workspace {}: {}", self.path.display(), e);
        }
    }
}
