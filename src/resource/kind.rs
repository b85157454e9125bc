//! Resource kinds known to the backup and listing commands

use super::registry::{get_resource, ResourceDef};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ResourceKind {
    Service,
    Environment,
    InfrastructureDefinition,
    EnvironmentGroup,
    Connector,
    Delegate,
    Secret,
    Template,
    Variable,
    User,
    UserGroup,
    ServiceAccount,
    ResourceGroup,
    Role,
}

impl ResourceKind {
    /// Top-level kinds in the order a project backup fetches them.
    /// Infrastructure definitions are fetched from inside each environment.
    pub const BACKUP_ORDER: [ResourceKind; 13] = [
        ResourceKind::Service,
        ResourceKind::Environment,
        ResourceKind::EnvironmentGroup,
        ResourceKind::Connector,
        ResourceKind::Delegate,
        ResourceKind::Secret,
        ResourceKind::Template,
        ResourceKind::Variable,
        ResourceKind::User,
        ResourceKind::UserGroup,
        ResourceKind::ServiceAccount,
        ResourceKind::ResourceGroup,
        ResourceKind::Role,
    ];

    /// Registry key, which is also the output directory name
    pub fn key(self) -> &'static str {
        match self {
            ResourceKind::Service => "services",
            ResourceKind::Environment => "environments",
            ResourceKind::InfrastructureDefinition => "infrastructures",
            ResourceKind::EnvironmentGroup => "environment_groups",
            ResourceKind::Connector => "connectors",
            ResourceKind::Delegate => "delegates",
            ResourceKind::Secret => "secrets",
            ResourceKind::Template => "templates",
            ResourceKind::Variable => "variables",
            ResourceKind::User => "users",
            ResourceKind::UserGroup => "user_groups",
            ResourceKind::ServiceAccount => "service_accounts",
            ResourceKind::ResourceGroup => "resource_groups",
            ResourceKind::Role => "roles",
        }
    }

    /// Descriptor from the embedded registry
    pub fn definition(self) -> &'static ResourceDef {
        get_resource(self.key())
            .unwrap_or_else(|| panic!("Embedded registry has no entry for {}", self.key()))
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
