//! # casconf model
//!
//! Typed settings schema for an identity server's attribute repositories and
//! SAML metadata location.
//!
//! The crate declares one record per configurable feature, each with named
//! fields, documented defaults and the deployment module it depends on:
//!
//! | Record | Filter name | Module |
//! |--------|-------------|--------|
//! | [`JdbcAttributeRepositorySettings`] | `JdbcPrincipalAttributesProperties` | `cas-server-support-person-directory` |
//! | [`SamlMetadataLocationSettings`] | `FileSystemSamlMetadataProperties` | `cas-server-support-saml-idp` |
//!
//! Every record implements [`Settings`], which provides:
//!
//! - [`Settings::load_defaults`]: a record holding the documented defaults
//! - [`Settings::bind_from`]: relaxed binding of an untyped document, failing with
//!   [`BindingError`] on type mismatches and unknown enum literals
//! - [`Settings::validate`]: structural checks returned as a [`ValidationReport`]
//! - [`Settings::to_document`]: projection to a document, optionally narrowed by a
//!   [`FieldFilter`]
//!
//! Records hold no behavior beyond that. Query execution, attribute merging
//! and metadata I/O belong to the engines that consume them.
//!
//! ## Example
//!
//! ```
//! use casconf_model::{FieldFilter, SamlMetadataLocationSettings, Settings};
//! use serde_json::json;
//!
//! let saml = SamlMetadataLocationSettings::bind_from(&json!({}))?;
//! assert_eq!(saml.location(), "file:/etc/cas/saml");
//! assert!(saml.validate().is_valid());
//!
//! let view = saml.to_document(Some(&FieldFilter::only(["location"])));
//! assert_eq!(view["location"], "file:/etc/cas/saml");
//! # Ok::<(), casconf_model::BindingError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with record fixtures and sample documents. Enable
//!   it in `[dev-dependencies]` of dependent crates.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Relaxed document binding.
pub mod binding;
/// Relational connection settings.
pub mod connection;
/// Binding error types.
pub mod error;
/// Relational attribute repository settings.
pub mod jdbc;
/// SAML metadata location settings.
pub mod saml;
/// Field schema, filters and the `Settings` trait.
pub mod schema;
/// Shared fixtures for tests of crates that consume settings records.
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
/// Validation reports.
pub mod validation;

pub use binding::Bound;
pub use connection::{ConnectionPoolSettings, RelationalConnectionSettings};
pub use error::{BindingError, Result, UnknownLiteral};
pub use jdbc::{
    CaseCanonicalizationMode, JdbcAttributeRepositorySettings, PREDICATE_PLACEHOLDER,
    QueryAttributeError, QueryType, parse_query_attribute,
};
pub use saml::{DEFAULT_LOCATION as DEFAULT_SAML_LOCATION, SamlMetadataLocationSettings};
pub use schema::{
    Document, FieldDescriptor, FieldFilter, FieldKind, FieldSpec, ModuleRequirement,
    SchemaDescriptor, Settings,
};
pub use validation::{ValidationReport, ValidationViolation, ViolationKind};
