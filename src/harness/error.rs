//! Error taxonomy for Harness API and backup operations

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::resource::registry::display_name;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{title} {identifier} does not exist.")]
    NotFound { title: String, identifier: String },

    #[error("Harness response invalid or unexpected (status {status}). Ensure your API Key is correct.")]
    UnauthorizedOrMalformed { status: u16 },

    #[error(
        "Harness {} List Response was unexpected. Status Code: {status}. {body}",
        display_name(.kind)
    )]
    ListingFetch {
        kind: &'static str,
        status: u16,
        body: String,
    },

    #[error("malformed {kind} listing page: {detail}")]
    MalformedPage { kind: &'static str, detail: String },

    #[error("filesystem operation failed on {path}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build archive {path}")]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to parse response JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Harness Identifiers may not contain dashes: {0}")]
    InvalidIdentifier(String),

    #[error("Must provide {flag} or {env_var} to the environment.")]
    MissingCredential {
        flag: &'static str,
        env_var: &'static str,
    },

    #[error("{kind} cannot be listed at {level} scope")]
    UnsupportedScope {
        kind: &'static str,
        level: &'static str,
    },

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("{0} contains characters not allowed in an HTTP header")]
    InvalidHeader(&'static str),
}

impl HarnessError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Resource kind name for listing failures, if any
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            Self::ListingFetch { kind, .. }
            | Self::MalformedPage { kind, .. }
            | Self::UnsupportedScope { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
