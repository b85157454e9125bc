//! Export a Harness project's configuration into a `.tar.gz` archive,
//! one YAML file per resource.

pub mod backup;
pub mod config;
pub mod harness;
pub mod resource;

/// Version injected at compile time via HARNESS_BACKUP_VERSION (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("HARNESS_BACKUP_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
