//! Harness Authentication
//!
//! Resolves the API key and account identifier from explicit arguments or
//! the `HARNESS_API_KEY` / `HARNESS_ACCOUNT_ID` environment variables, and
//! turns them into request headers.

use super::error::{HarnessError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

pub const API_KEY_ENV: &str = "HARNESS_API_KEY";
pub const ACCOUNT_ID_ENV: &str = "HARNESS_ACCOUNT_ID";

const API_KEY_HEADER: &str = "x-api-key";
const ACCOUNT_HEADER: &str = "Harness-Account";

/// Harness credentials: an opaque API key plus the account it belongs to
#[derive(Clone)]
pub struct HarnessCredentials {
    api_key: String,
    account_id: String,
}

impl std::fmt::Debug for HarnessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Security: never print the key itself
        f.debug_struct("HarnessCredentials")
            .field("api_key", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

impl HarnessCredentials {
    pub fn new(api_key: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            account_id: account_id.into(),
        }
    }

    /// Resolve credentials from explicit values, falling back to the process environment
    pub fn resolve(api_key: Option<&str>, account_id: Option<&str>) -> Result<Self> {
        Self::resolve_with(api_key, account_id, |name| std::env::var(name).ok())
    }

    /// Resolve credentials with a custom environment lookup.
    /// Explicit values win over the environment; empty strings count as absent.
    pub fn resolve_with<F>(api_key: Option<&str>, account_id: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |explicit: Option<&str>, var: &str| {
            explicit
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };

        let api_key = pick(api_key, API_KEY_ENV).ok_or(HarnessError::MissingCredential {
            flag: "--api-key",
            env_var: API_KEY_ENV,
        })?;
        let account_id = pick(account_id, ACCOUNT_ID_ENV).ok_or(HarnessError::MissingCredential {
            flag: "--account-id",
            env_var: ACCOUNT_ID_ENV,
        })?;

        tracing::debug!("Resolved credentials for account {}", account_id);
        Ok(Self { api_key, account_id })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Headers sent with every Harness request
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| HarnessError::InvalidHeader(API_KEY_HEADER))?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        headers.insert(
            HeaderName::from_static("harness-account"),
            HeaderValue::from_str(&self.account_id)
                .map_err(|_| HarnessError::InvalidHeader(ACCOUNT_HEADER))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

/// Reject identifiers the Harness platform would refuse
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if identifier.is_empty() || identifier.contains('-') {
        return Err(HarnessError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_explicit_values_take_precedence() {
        let env = env_with(&[(API_KEY_ENV, "env-key"), (ACCOUNT_ID_ENV, "envacct")]);
        let creds = HarnessCredentials::resolve_with(Some("flag-key"), Some("flagacct"), env).unwrap();
        assert_eq!(creds.api_key, "flag-key");
        assert_eq!(creds.account_id(), "flagacct");
    }

    #[test]
    fn test_falls_back_to_environment() {
        let env = env_with(&[(API_KEY_ENV, "env-key"), (ACCOUNT_ID_ENV, "envacct")]);
        let creds = HarnessCredentials::resolve_with(None, Some(""), env).unwrap();
        assert_eq!(creds.api_key, "env-key");
        assert_eq!(creds.account_id(), "envacct");
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let env = env_with(&[(ACCOUNT_ID_ENV, "envacct")]);
        let err = HarnessCredentials::resolve_with(None, None, env).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::MissingCredential { env_var: API_KEY_ENV, .. }
        ));
    }

    #[test]
    fn test_headers_contain_key_and_account() {
        let headers = HarnessCredentials::new("k", "acct").headers().unwrap();
        assert_eq!(headers["x-api-key"], "k");
        assert_eq!(headers["harness-account"], "acct");
        assert_eq!(headers["content-type"], "application/json");
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = HarnessCredentials::new("supersecret", "acct");
        assert!(!format!("{creds:?}").contains("supersecret"));
    }

    #[test]
    fn test_identifiers_with_dashes_rejected() {
        assert!(validate_identifier("demo_project").is_ok());
        assert!(matches!(
            validate_identifier("demo-project"),
            Err(HarnessError::InvalidIdentifier(_))
        ));
        assert!(validate_identifier("").is_err());
    }
}
