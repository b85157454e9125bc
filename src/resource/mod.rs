//! Resource abstraction layer
//!
//! Harness resource kinds are described declaratively. Descriptors are loaded
//! from JSON embedded at compile time, so a new kind needs a descriptor entry
//! and an enum variant, not a new fetcher.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource descriptors from embedded JSON
//! - [`kind`] - The closed set of resource kinds and the backup order
//! - [`scope`] - Account / organization / project scope
//! - [`pagination`] - Page cursor over the Harness paging conventions
//! - [`fetcher`] - Lists a kind and writes its items into a workspace
//!
//! # Resource Definitions
//!
//! Descriptors live in `src/resources/harness.json`.

pub mod fetcher;
pub mod kind;
pub mod pagination;
pub mod registry;
pub mod scope;

pub use fetcher::{fetch_kind, list_kind, list_with_parent};
pub use kind::ResourceKind;
pub use registry::{get_registry, get_resource, ResourceDef};
pub use scope::{Scope, ScopeLevel};
