//! Atomically replaceable settings records.
//!
//! A [`SettingsHandle`] publishes one immutable record at a time. Readers
//! take an [`Arc`] to the current record and keep observing that complete
//! record for as long as they hold it; a reload builds the replacement off to
//! the side and swaps the pointer under a write lock held only for the swap.
//! A reader therefore never sees a mix of old and new fields.

use std::sync::Arc;

use casconf_model::{Settings, ValidationReport};
use parking_lot::RwLock;
use serde_json::Value;

use crate::{config::RegistryConfig, error::Result};

/// Result of a successful load or reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// Generation now being published.
    pub generation: u64,
    /// Violations accepted under [`ReloadPolicy::WarnOnly`](crate::ReloadPolicy::WarnOnly).
    pub warnings: ValidationReport,
    /// Paths of document keys that were ignored.
    pub unknown_fields: Vec<String>,
    /// Required deployment modules that are not active.
    pub inactive_modules: Vec<&'static str>,
}

#[derive(Debug)]
struct Published<T> {
    record: Arc<T>,
    generation: u64,
}

/// Holder of the currently published record of type `T`.
///
/// # Cloning
///
/// `SettingsHandle` is cheaply cloneable via [`Arc`]. All clones observe and
/// publish the same record.
#[derive(Debug)]
pub struct SettingsHandle<T> {
    published: Arc<RwLock<Published<T>>>,
}

impl<T> Clone for SettingsHandle<T> {
    fn clone(&self) -> Self {
        Self { published: Arc::clone(&self.published) }
    }
}

impl<T> SettingsHandle<T> {
    /// Publishes `record` as generation 0.
    #[must_use]
    pub fn new(record: T) -> Self {
        Self { published: Arc::new(RwLock::new(Published { record: Arc::new(record), generation: 0 })) }
    }

    /// Returns the current record.
    #[must_use]
    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.published.read().record)
    }

    /// Returns the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.published.read().generation
    }

    /// Returns the current record together with its generation.
    #[must_use]
    pub fn snapshot(&self) -> (Arc<T>, u64) {
        let published = self.published.read();
        (Arc::clone(&published.record), published.generation)
    }

    /// Publishes `record`, returning the new generation.
    pub fn replace(&self, record: T) -> u64 {
        let record = Arc::new(record);
        let mut published = self.published.write();
        published.record = record;
        published.generation += 1;
        published.generation
    }
}

impl<T: Settings> SettingsHandle<T> {
    /// Publishes the record's defaults as generation 0.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(T::load_defaults())
    }

    /// Binds `document`, screens it with `config` and publishes the result.
    ///
    /// On any error the previous record and generation stay in place.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Binding`](crate::RegistryError::Binding) if the document does not bind
    /// - [`RegistryError::UnknownFields`](crate::RegistryError::UnknownFields) if unknown keys are
    ///   rejected
    /// - [`RegistryError::Rejected`](crate::RegistryError::Rejected) if the record is invalid and
    ///   invalid records are rejected
    #[tracing::instrument(skip_all, fields(filter = T::FILTER_NAME))]
    pub fn reload(&self, document: &Value, config: &RegistryConfig) -> Result<ReloadOutcome> {
        let bound = T::bind_detailed(document)?;
        config.screen_unknown(T::FILTER_NAME, &bound.unknown_fields)?;
        let warnings = config.screen_report(T::FILTER_NAME, validate(&bound.record))?;

        let inactive_modules =
            if config.is_active(&T::MODULE) { Vec::new() } else { vec![T::MODULE.name] };
        for module in &inactive_modules {
            tracing::warn!(module = %module, "Settings published but required module is not active");
        }

        let generation = self.replace(bound.record);
        tracing::info!(generation, "Published settings");

        Ok(ReloadOutcome { generation, warnings, unknown_fields: bound.unknown_fields, inactive_modules })
    }
}

#[tracing::instrument(skip_all, fields(filter = T::FILTER_NAME))]
pub(crate) fn validate<T: Settings>(record: &T) -> ValidationReport {
    let report = record.validate();
    tracing::debug!(violations = report.len(), "Validated settings");
    report
}
