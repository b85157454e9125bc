//! Tarball creation for a populated workspace
use crate::harness::error::{HarnessError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use tar::Builder;
use walkdir::WalkDir;

/// Suffixes stripped from the destination file name to form the archive root
const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".tar"];

/// Fallback root when the destination name yields nothing usable
const FALLBACK_ROOT: &str = "backup";

/// Name of the single top-level directory inside the archive.
///
/// Uses the file name of `dest` without its archive suffix. Names without a
/// known suffix are cut at their first `.`. Always one normal path component:
/// empty or dot-only stems fall back to `backup`.
pub fn archive_root_name(dest: &Path) -> String {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or_else(|| file_name.split('.').next().unwrap_or_default());

    if is_usable_root(stem) {
        stem.to_string()
    } else {
        FALLBACK_ROOT.to_string()
    }
}

fn is_usable_root(stem: &str) -> bool {
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        return false;
    }
    let mut components = Path::new(stem).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Creates a GZipped TAR archive from a source directory.
///
/// Every file and directory below `source_dir` is stored under `root_name`,
/// keeping its relative path. If writing fails after the destination was
/// opened, the partial file is removed; a file this call never opened is
/// left alone.
///
/// # Arguments
/// * `source_dir` - The directory whose contents will be archived.
/// * `archive_dest_path` - Where the `.tar.gz` archive will be created.
/// * `root_name` - Top-level directory name inside the archive.
///
/// # Returns
/// Path to the created archive file.
pub fn create_tar_gz_archive(
    source_dir: &Path,
    archive_dest_path: &Path,
    root_name: &str,
) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(HarnessError::filesystem(
            source_dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "source is not a directory"),
        ));
    }
    if let Some(parent) = archive_dest_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| HarnessError::filesystem(parent, e))?;
        }
    }

    tracing::info!(
        "Creating tar.gz archive from {} to {}",
        source_dir.display(),
        archive_dest_path.display()
    );

    let archive_err = |source: std::io::Error| HarnessError::Archive {
        path: archive_dest_path.to_path_buf(),
        source,
    };

    let archive_file = File::create(archive_dest_path).map_err(archive_err)?;
    if let Err(e) = write_archive(archive_file, source_dir, root_name).map_err(archive_err) {
        if let Err(remove_err) = std::fs::remove_file(archive_dest_path) {
            tracing::warn!(
                "Failed to remove partial archive {}: {}",
                archive_dest_path.display(),
                remove_err
            );
        }
        return Err(e);
    }

    tracing::info!(
        "Tar.gz archive created successfully at {}",
        archive_dest_path.display()
    );
    Ok(archive_dest_path.to_path_buf())
}

fn write_archive(archive_file: File, source_dir: &Path, root_name: &str) -> std::io::Result<()> {
    let enc = GzEncoder::new(archive_file, Compression::default());
    let mut tar_builder = Builder::new(enc);
    let root = Path::new(root_name);

    tar_builder.append_dir(root, source_dir)?;

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let name = path
            .strip_prefix(source_dir)
            .map(|rel| root.join(rel))
            .map_err(std::io::Error::other)?;

        if entry.file_type().is_dir() {
            tar_builder.append_dir(&name, path)?;
        } else if entry.file_type().is_file() {
            tar_builder.append_path_with_name(path, &name)?;
        }
    }

    tar_builder.into_inner()?.finish()?;
    Ok(())
}
