//! Configuration Management
//!
//! Optional persistent defaults for harness-backup. Command-line flags win over
//! the environment, which wins over this file, which wins over built-in defaults.

use crate::harness::auth::{HarnessCredentials, ACCOUNT_ID_ENV};
use crate::harness::client::{
    ClientOptions, DEFAULT_BASE_URL, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Harness API base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Account used when neither `--account-id` nor HARNESS_ACCOUNT_ID is set
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u32>,
    /// Upper bound on pages fetched for one listing
    #[serde(default)]
    pub max_pages: Option<u32>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub page_size: Option<u32>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("harness-backup").join("config.json"))
    }

    /// Load configuration from the default location.
    /// A missing file yields the defaults; a broken one is reported.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Client tunables after applying command-line overrides
    pub fn client_options(&self, overrides: &Overrides) -> Result<ClientOptions> {
        let base_url = overrides
            .base_url
            .as_deref()
            .or(self.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL);
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL '{base_url}'"))?;

        let timeout = overrides
            .timeout_secs
            .or(self.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(ClientOptions {
            base_url,
            timeout,
            page_size: overrides
                .page_size
                .or(self.page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            max_pages: self.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
        })
    }

    /// Resolve credentials: flags, then the process environment, then this file
    pub fn credentials(
        &self,
        api_key: Option<&str>,
        account_id: Option<&str>,
    ) -> crate::harness::error::Result<HarnessCredentials> {
        self.credentials_with(api_key, account_id, |name| std::env::var(name).ok())
    }

    /// Same as [`Config::credentials`] with a custom environment lookup
    pub fn credentials_with<F>(
        &self,
        api_key: Option<&str>,
        account_id: Option<&str>,
        env: F,
    ) -> crate::harness::error::Result<HarnessCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        HarnessCredentials::resolve_with(api_key, account_id, |name| {
            env(name).filter(|v| !v.is_empty()).or_else(|| {
                if name == ACCOUNT_ID_ENV {
                    self.account_id.clone()
                } else {
                    None
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::auth::API_KEY_ENV;
    use crate::harness::error::HarnessError;

    fn file_config() -> Config {
        Config {
            base_url: Some("https://harness.example.com/gateway".into()),
            account_id: Some("file_acct".into()),
            timeout_secs: Some(5),
            page_size: Some(50),
            max_pages: Some(3),
        }
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let options = Config::default()
            .client_options(&Overrides::default())
            .unwrap();
        assert_eq!(options.base_url.as_str(), "https://app.harness.io/");
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert_eq!(options.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(options.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_file_values_apply() {
        let options = file_config()
            .client_options(&Overrides::default())
            .unwrap();
        assert_eq!(options.base_url.as_str(), "https://harness.example.com/gateway");
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.page_size, 50);
        assert_eq!(options.max_pages, 3);
    }

    #[test]
    fn test_flags_override_file() {
        let overrides = Overrides {
            base_url: Some("http://127.0.0.1:9000".into()),
            timeout_secs: Some(1),
            page_size: Some(7),
        };
        let options = file_config().client_options(&overrides).unwrap();
        assert_eq!(options.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(options.timeout, Duration::from_secs(1));
        assert_eq!(options.page_size, 7);
    }

    #[test]
    fn test_invalid_base_url_is_reported() {
        let overrides = Overrides {
            base_url: Some("not a url".into()),
            ..Overrides::default()
        };
        assert!(Config::default().client_options(&overrides).is_err());
    }

    #[test]
    fn test_account_id_falls_back_to_file() {
        let env = |name: &str| (name == API_KEY_ENV).then(|| "key".to_string());
        let creds = file_config().credentials_with(None, None, env).unwrap();
        assert_eq!(creds.account_id(), "file_acct");
    }

    #[test]
    fn test_environment_wins_over_file() {
        let env = |name: &str| match name {
            API_KEY_ENV => Some("key".to_string()),
            ACCOUNT_ID_ENV => Some("env_acct".to_string()),
            _ => None,
        };
        let creds = file_config().credentials_with(None, None, env).unwrap();
        assert_eq!(creds.account_id(), "env_acct");
    }

    #[test]
    fn test_api_key_never_comes_from_file() {
        let err = file_config()
            .credentials_with(None, None, |_| None)
            .unwrap_err();
        assert!(matches!(err, HarnessError::MissingCredential { flag: "--api-key", .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_size": 100, "account_id": "a1"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.page_size, Some(100));
        assert_eq!(config.account_id.as_deref(), Some("a1"));
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn test_load_from_broken_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
