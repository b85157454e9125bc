//! Harness API interaction module
//!
//! Credentials, the HTTP transport, the client that ties them to a base URL
//! and paging limits, and the error taxonomy shared by the whole crate.
//!
//! # Module Structure
//!
//! - [`auth`] - API key and account id resolution, request headers
//! - [`client`] - Main Harness client for making API requests
//! - [`error`] - Error types
//! - [`http`] - Transport trait and the reqwest-backed implementation
//! - [`projects`] - Project existence lookup
//!
//! # Example
//!
//! ```ignore
//! use harness_backup::harness::auth::HarnessCredentials;
//! use harness_backup::harness::client::{ClientOptions, HarnessClient};
//!
//! async fn example() -> harness_backup::harness::error::Result<()> {
//!     let creds = HarnessCredentials::resolve(None, None)?;
//!     let client = HarnessClient::new(&creds, ClientOptions::default())?;
//!     let project = harness_backup::harness::projects::get_project(&client, "org", "proj").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod projects;
