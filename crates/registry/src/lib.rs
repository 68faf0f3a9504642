//! # casconf registry
//!
//! Runtime side of the casconf settings schema: publishes bound settings
//! records for concurrent readers and swaps them atomically on reload.
//!
//! - [`SettingsHandle`] holds one record of any [`Settings`](casconf_model::Settings) type.
//!   Readers get an `Arc` snapshot; [`SettingsHandle::reload`] binds, validates and swaps the whole
//!   record or nothing.
//! - [`SettingsRegistry`] loads a root document with every section the server reads (the
//!   relational repository chain and the SAML metadata location) and publishes them as one
//!   [`RegistrySnapshot`].
//! - [`RegistryConfig`] decides what a load does with invalid records ([`ReloadPolicy`]), with
//!   unknown keys ([`UnknownFieldPolicy`]) and which deployment modules are active.
//!
//! ## Example
//!
//! ```
//! use casconf_registry::{RegistryConfig, SettingsRegistry};
//! use serde_json::json;
//!
//! let registry = SettingsRegistry::new(RegistryConfig::default());
//! let outcome = registry.load(&json!({
//!     "jdbc": [
//!         { "id": "groups", "order": 2, "sql": "SELECT * FROM groups WHERE {0}" },
//!         { "id": "people", "order": 1, "sql": "SELECT * FROM people WHERE {0}" },
//!     ],
//! }))?;
//!
//! assert_eq!(outcome.generation, 1);
//! let ids: Vec<_> = registry.repositories().iter().filter_map(|r| r.id().map(str::to_owned)).collect();
//! assert_eq!(ids, ["people", "groups"]);
//! # Ok::<(), casconf_registry::RegistryError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Ordered repository chain.
pub mod chain;
/// Registry configuration and load policies.
pub mod config;
/// Registry error types.
pub mod error;
/// Atomically replaceable settings records.
pub mod handle;
/// The root settings registry.
pub mod registry;

pub use chain::RepositoryChain;
pub use config::{RegistryConfig, ReloadPolicy, UnknownFieldPolicy};
pub use error::{RegistryError, Result};
pub use handle::{ReloadOutcome, SettingsHandle};
pub use registry::{JDBC_SECTION, ROOT_DOCUMENT, RegistrySnapshot, SAML_SECTION, SettingsRegistry};
