//! Registry behavior: what happens to invalid records and unknown keys.

use std::collections::BTreeSet;

use casconf_model::{ModuleRequirement, ValidationReport};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// What a load does with a record that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Keep the previous record and return [`RegistryError::Rejected`].
    #[default]
    RejectInvalid,
    /// Publish the record anyway and log each violation.
    WarnOnly,
}

/// What a load does with document keys the schema does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Drop them silently.
    Ignore,
    /// Drop them and log each one.
    #[default]
    Warn,
    /// Fail the load with [`RegistryError::UnknownFields`].
    Reject,
}

/// Registry configuration.
///
/// # Example
///
/// ```
/// use casconf_registry::{RegistryConfig, ReloadPolicy, UnknownFieldPolicy};
///
/// let config = RegistryConfig::builder()
///     .reload_policy(ReloadPolicy::WarnOnly)
///     .unknown_fields(UnknownFieldPolicy::Reject)
///     .active_modules(["cas-server-support-saml-idp".to_owned()].into())
///     .build();
///
/// assert_eq!(config.reload_policy(), ReloadPolicy::WarnOnly);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RegistryConfig {
    #[builder(default)]
    reload_policy: ReloadPolicy,

    #[builder(default)]
    unknown_fields: UnknownFieldPolicy,

    /// Names of the deployment modules present in this installation.
    #[builder(default)]
    active_modules: BTreeSet<String>,
}

impl RegistryConfig {
    /// Returns the invalid-record policy.
    #[must_use]
    pub fn reload_policy(&self) -> ReloadPolicy {
        self.reload_policy
    }

    /// Returns the unknown-key policy.
    #[must_use]
    pub fn unknown_fields(&self) -> UnknownFieldPolicy {
        self.unknown_fields
    }

    /// Returns the active deployment modules.
    #[must_use]
    pub fn active_modules(&self) -> &BTreeSet<String> {
        &self.active_modules
    }

    /// Returns `true` if `module` is automated or listed as active.
    #[must_use]
    pub fn is_active(&self, module: &ModuleRequirement) -> bool {
        module.is_satisfied_by(&self.active_modules)
    }

    /// Applies the unknown-key policy to the keys a bind ignored.
    pub(crate) fn screen_unknown(&self, filter: &'static str, fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        match self.unknown_fields {
            UnknownFieldPolicy::Ignore => Ok(()),
            UnknownFieldPolicy::Warn => {
                for field in fields {
                    tracing::warn!(filter, field = %field, "Ignoring unknown setting");
                }
                Ok(())
            },
            UnknownFieldPolicy::Reject => {
                Err(RegistryError::UnknownFields { filter, fields: fields.to_vec() })
            },
        }
    }

    /// Applies the invalid-record policy to a validation report.
    ///
    /// Returns the violations that were accepted as warnings.
    pub(crate) fn screen_report(
        &self,
        filter: &'static str,
        report: ValidationReport,
    ) -> Result<ValidationReport> {
        if report.is_valid() {
            return Ok(report);
        }
        match self.reload_policy {
            ReloadPolicy::RejectInvalid => Err(RegistryError::Rejected { filter, report }),
            ReloadPolicy::WarnOnly => {
                for violation in report.violations() {
                    tracing::warn!(
                        filter,
                        field = %violation.field(),
                        kind = %violation.kind(),
                        message = %violation.message(),
                        "Accepting settings with violation"
                    );
                }
                Ok(report)
            },
        }
    }
}
