//! Field-level validation results.
//!
//! Validation never fails: it returns a [`ValidationReport`] holding zero or
//! more [`ValidationViolation`]s in the order they were detected. Whether a
//! non-empty report blocks startup or is merely logged is the caller's call.

use std::fmt;

use serde::Serialize;

/// Category of a validation violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required value is missing or blank.
    Required,
    /// A container lacks entries another setting depends on.
    Incomplete,
    /// A value is present but has the wrong shape.
    Malformed,
    /// A numeric bound is violated.
    OutOfRange,
    /// A value that must be unique appears more than once.
    Duplicate,
    /// A value names something the consuming engine cannot use.
    Unsupported,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Incomplete => write!(f, "incomplete"),
            Self::Malformed => write!(f, "malformed"),
            Self::OutOfRange => write!(f, "out_of_range"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// A single invariant a settings record fails to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationViolation {
    field: String,
    kind: ViolationKind,
    message: String,
}

impl ValidationViolation {
    /// Creates a violation against `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self { field: field.into(), kind, message: message.into() }
    }

    /// Returns the canonical field path, e.g. `columnMappings`.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the violation category.
    #[must_use]
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Returns the human-readable explanation.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.kind, self.message)
    }
}

/// Ordered collection of violations produced by a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    violations: Vec<ValidationViolation>,
}

impl ValidationReport {
    /// Creates an empty (passing) report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub fn push(&mut self, field: impl Into<String>, kind: ViolationKind, message: impl Into<String>) {
        self.violations.push(ValidationViolation::new(field, kind, message));
    }

    /// Appends every violation of `other`, preserving order.
    pub fn extend(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    /// Re-anchors every violation under `prefix`, e.g. `jdbc[0]`.
    #[must_use]
    pub fn prefixed(self, prefix: &str) -> Self {
        let violations = self
            .violations
            .into_iter()
            .map(|v| ValidationViolation { field: format!("{prefix}.{}", v.field), ..v })
            .collect();
        Self { violations }
    }

    /// Returns `true` when no violation was recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the violations in detection order.
    #[must_use]
    pub fn violations(&self) -> &[ValidationViolation] {
        &self.violations
    }

    /// Returns the number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns `true` when the report holds no violations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns `true` if any violation refers to `field`.
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Converts the report into a `Result`, failing when it holds violations.
    ///
    /// # Errors
    ///
    /// Returns the report itself if it is not valid.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "no violations");
        }
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationReport {
    type Item = ValidationViolation;
    type IntoIter = std::vec::IntoIter<ValidationViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a ValidationViolation;
    type IntoIter = std::slice::Iter<'a, ValidationViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}
