//! Registry error types.

use casconf_model::{BindingError, ValidationReport};
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while loading or reloading settings.
///
/// A failed load never changes the published settings.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The document could not be bound to its record type.
    #[error("binding failed: {0}")]
    Binding(#[from] BindingError),

    /// The bound record violates its invariants and the reload policy
    /// rejects invalid records.
    #[error("{filter} rejected: {report}")]
    Rejected {
        /// Filter name of the rejected record.
        filter: &'static str,
        /// Violations found.
        report: ValidationReport,
    },

    /// The document carries keys the schema does not declare and the
    /// unknown-field policy rejects them.
    #[error("{filter} has unknown settings: {}", fields.join(", "))]
    UnknownFields {
        /// Filter name of the record being loaded.
        filter: &'static str,
        /// Paths of the unrecognized keys.
        fields: Vec<String>,
    },
}

impl RegistryError {
    /// Returns the violations of a rejected load, if any.
    #[must_use]
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Rejected { report, .. } => Some(report),
            Self::Binding(_) | Self::UnknownFields { .. } => None,
        }
    }
}
