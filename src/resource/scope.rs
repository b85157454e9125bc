//! Listing scope: account, optionally narrowed to an organization and project

use crate::harness::auth::validate_identifier;
use crate::harness::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeLevel {
    Account,
    Org,
    Project,
}

impl ScopeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeLevel::Account => "account",
            ScopeLevel::Org => "organization",
            ScopeLevel::Project => "project",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    account: String,
    org: Option<String>,
    project: Option<String>,
}

impl Scope {
    pub fn account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            org: None,
            project: None,
        }
    }

    pub fn org(account: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            org: Some(org.into()),
            ..Self::account(account)
        }
    }

    pub fn project(
        account: impl Into<String>,
        org: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            project: Some(project.into()),
            ..Self::org(account, org)
        }
    }

    /// Build a scope from optional parts; a project without an org is rejected
    pub fn from_parts(account: &str, org: Option<&str>, project: Option<&str>) -> Result<Self> {
        match (org, project) {
            (None, None) => Ok(Self::account(account)),
            (Some(org), None) => {
                validate_identifier(org)?;
                Ok(Self::org(account, org))
            }
            (Some(org), Some(project)) => {
                validate_identifier(org)?;
                validate_identifier(project)?;
                Ok(Self::project(account, org, project))
            }
            (None, Some(_)) => Err(HarnessError::InvalidScope(
                "a project scope also requires an organization".into(),
            )),
        }
    }

    pub fn level(&self) -> ScopeLevel {
        match (&self.org, &self.project) {
            (Some(_), Some(_)) => ScopeLevel::Project,
            (Some(_), None) => ScopeLevel::Org,
            _ => ScopeLevel::Account,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org.as_deref()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project.as_deref()
    }
}
