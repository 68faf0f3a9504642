//! Binding error types.
//!
//! A [`BindingError`] means a raw document could not be coerced into a typed
//! settings record. It always names the offending field using its canonical,
//! dotted path (for example `singleRow` or `pool.minSize`) so the error can be
//! reported back against the configuration source.
//!
//! Structural problems in a well-typed record are not errors; they are
//! reported as [`ValidationViolation`](crate::ValidationViolation)s.

use thiserror::Error;

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, BindingError>;

/// Label used in place of a field name when the document root itself is bad.
pub const ROOT_FIELD: &str = "<root>";

/// Errors raised while binding an untyped document to a settings record.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`; new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BindingError {
    /// The document (or a nested section) is not a key-value object.
    #[error("{field}: expected an object, found {value}")]
    NotAnObject {
        /// Field path of the offending section, or [`ROOT_FIELD`].
        field: String,
        /// Rendering of the value found instead.
        value: String,
    },

    /// A value cannot be converted to the declared field type.
    #[error("{field}: expected {expected}, found {value}")]
    TypeMismatch {
        /// Canonical field path.
        field: String,
        /// Human-readable name of the declared type.
        expected: String,
        /// Rendering of the offending value.
        value: String,
    },

    /// A numeric value lies outside the range of the declared field type.
    #[error("{field}: {value} is outside the range {min}..={max}")]
    OutOfRange {
        /// Canonical field path.
        field: String,
        /// Rendering of the offending value.
        value: String,
        /// Smallest accepted value.
        min: i128,
        /// Largest accepted value.
        max: i128,
    },

    /// An enum literal is not part of the declared domain.
    #[error("{field}: unknown literal '{value}', expected one of {}", expected.join(", "))]
    UnknownVariant {
        /// Canonical field path.
        field: String,
        /// The literal that was supplied.
        value: String,
        /// The declared domain.
        expected: &'static [&'static str],
    },

    /// A duration literal could not be parsed.
    #[error("{field}: invalid duration '{value}': {message}")]
    InvalidDuration {
        /// Canonical field path.
        field: String,
        /// The literal that was supplied.
        value: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The document sets the same field more than once, e.g. as `singleRow`
    /// and `single-row`, or as `pool.minSize` next to a `pool` section that
    /// also sets it.
    #[error("{field}: set more than once under different spellings")]
    DuplicateField {
        /// Canonical field path.
        field: String,
    },

    /// The document names a field the schema does not declare.
    ///
    /// Only raised by callers that opt into strict handling of unknown keys;
    /// plain binding ignores them.
    #[error("{field}: unknown setting")]
    UnknownField {
        /// Path of the unrecognized key as it appeared in the document.
        field: String,
    },

    /// The normalized document was rejected by the record decoder.
    #[error("malformed settings document: {message}")]
    Malformed {
        /// Decoder diagnostic.
        message: String,
    },
}

impl BindingError {
    /// Returns the field path this error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::NotAnObject { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::UnknownVariant { field, .. }
            | Self::InvalidDuration { field, .. }
            | Self::DuplicateField { field }
            | Self::UnknownField { field } => Some(field),
            Self::Malformed { .. } => None,
        }
    }

    /// Re-anchors the error under `prefix`, e.g. `jdbc[2]`.
    ///
    /// Used when a record is bound as one element of a larger document.
    #[must_use]
    pub fn prefixed(mut self, prefix: &str) -> Self {
        match &mut self {
            Self::NotAnObject { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::UnknownVariant { field, .. }
            | Self::InvalidDuration { field, .. }
            | Self::DuplicateField { field }
            | Self::UnknownField { field } => {
                *field = if field == ROOT_FIELD {
                    prefix.to_owned()
                } else {
                    format!("{prefix}.{field}")
                };
            },
            Self::Malformed { message } => {
                *message = format!("{prefix}: {message}");
            },
        }
        self
    }
}

/// A string did not match any literal of an enum domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown literal '{value}', expected one of {}", expected.join(", "))]
pub struct UnknownLiteral {
    /// The literal that was supplied.
    pub value: String,
    /// The declared domain.
    pub expected: &'static [&'static str],
}
