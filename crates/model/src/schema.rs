//! The settings schema: field declarations, module requirements, projection
//! filters and the [`Settings`] trait every record implements.
//!
//! Each record publishes a static table of [`FieldSpec`]s. The table is the
//! single description of the record's external shape: relaxed binding reads
//! it to coerce raw documents, [`FieldFilter::redacted`] reads it to find
//! sensitive fields, and [`Settings::describe`] renders it as metadata.

use std::{collections::BTreeSet, fmt};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    binding::{self, Bound},
    error::Result,
    validation::ValidationReport,
};

/// An untyped settings document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Declared type of a settings field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-form string.
    String,
    /// `true` / `false`.
    Boolean,
    /// Integer within an inclusive range.
    ///
    /// Bounds are `i128` so every `i64` and `u64` range is expressible.
    Integer {
        /// Smallest accepted value.
        min: i128,
        /// Largest accepted value.
        max: i128,
    },
    /// Humantime duration literal such as `2s` or `10m`.
    Duration,
    /// Ordered list of strings.
    StringList,
    /// String-to-string map.
    StringMap,
    /// One literal out of a fixed, upper-case domain.
    Enum(&'static [&'static str]),
    /// Nested section with its own fields.
    Object(&'static [FieldSpec]),
}

impl FieldKind {
    /// Signed 32-bit integer.
    pub const I32: Self = Self::Integer { min: i32::MIN as i128, max: i32::MAX as i128 };
    /// Signed 64-bit integer.
    pub const I64: Self = Self::Integer { min: i64::MIN as i128, max: i64::MAX as i128 };
    /// Unsigned 32-bit integer.
    pub const U32: Self = Self::Integer { min: 0, max: u32::MAX as i128 };
    /// Unsigned 64-bit integer.
    pub const U64: Self = Self::Integer { min: 0, max: u64::MAX as i128 };
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer { min, max } => write!(f, "integer[{min}..={max}]"),
            Self::Duration => write!(f, "duration"),
            Self::StringList => write!(f, "list<string>"),
            Self::StringMap => write!(f, "map<string,string>"),
            Self::Enum(domain) => write!(f, "enum{{{}}}", domain.join(",")),
            Self::Object(_) => write!(f, "object"),
        }
    }
}

/// Declaration of a single externally configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical camelCase name used in documents.
    pub name: &'static str,
    /// Declared type.
    pub kind: FieldKind,
    /// Whether a non-blank value is required by policy.
    pub required: bool,
    /// Whether the value must be kept out of exported views.
    pub sensitive: bool,
    /// One-line documentation.
    pub description: &'static str,
}

impl FieldSpec {
    /// Declares an optional, non-sensitive field.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self { name, kind, required: false, sensitive: false, description }
    }

    /// Marks the field as required.
    #[must_use]
    pub const fn required(self) -> Self {
        Self { required: true, ..self }
    }

    /// Marks the field as sensitive.
    #[must_use]
    pub const fn sensitive(self) -> Self {
        Self { sensitive: true, ..self }
    }
}

/// Deployment module a record depends on to take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleRequirement {
    /// Module name.
    pub name: &'static str,
    /// Whether the module is pulled in automatically with the feature.
    pub automated: bool,
}

impl ModuleRequirement {
    /// Declares a module requirement.
    #[must_use]
    pub const fn new(name: &'static str, automated: bool) -> Self {
        Self { name, automated }
    }

    /// Returns `true` if the module is automated or listed in `active_modules`.
    #[must_use]
    pub fn is_satisfied_by(&self, active_modules: &BTreeSet<String>) -> bool {
        self.automated || active_modules.contains(self.name)
    }
}

/// Selects which top-level fields a projection emits.
///
/// This replaces a global registry of named serialization filters: callers
/// pass the filter explicitly to [`Settings::to_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldFilter {
    /// Emit only the listed field names.
    Only(BTreeSet<String>),
    /// Emit every field except the listed names.
    Except(BTreeSet<String>),
}

impl FieldFilter {
    /// Allowlist filter.
    #[must_use]
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(fields.into_iter().map(Into::into).collect())
    }

    /// Denylist filter.
    #[must_use]
    pub fn except<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Except(fields.into_iter().map(Into::into).collect())
    }

    /// Filter omitting every field `T` declares sensitive.
    #[must_use]
    pub fn redacted<T: Settings>() -> Self {
        Self::except(T::fields().into_iter().filter(|f| f.sensitive).map(|f| f.name))
    }

    /// Returns `true` if `field` passes the filter.
    #[must_use]
    pub fn allows(&self, field: &str) -> bool {
        match self {
            Self::Only(names) => names.contains(field),
            Self::Except(names) => !names.contains(field),
        }
    }
}

/// Rendered metadata for one field, as returned by [`Settings::describe`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Canonical name.
    pub name: &'static str,
    /// Declared type, rendered.
    pub kind: String,
    /// Whether a value is required by policy.
    pub required: bool,
    /// Whether the value is withheld from exported views.
    pub sensitive: bool,
    /// Documentation.
    pub description: &'static str,
    /// Default value, omitted for sensitive or unset fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Nested fields of an object section.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
}

/// Rendered schema of a settings record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    /// Serialization filter name of the record.
    pub filter_name: &'static str,
    /// Module the record depends on.
    pub module: ModuleRequirement,
    /// Top-level fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

fn describe_fields<'a>(
    specs: impl IntoIterator<Item = &'a FieldSpec>,
    defaults: &Document,
) -> Vec<FieldDescriptor> {
    specs
        .into_iter()
        .map(|spec| {
            let default_value = if spec.sensitive {
                None
            } else {
                defaults.get(spec.name).filter(|value| !value.is_null()).cloned()
            };
            let fields = match spec.kind {
                FieldKind::Object(nested) => {
                    let nested_defaults = match defaults.get(spec.name) {
                        Some(Value::Object(map)) => map.clone(),
                        _ => Document::new(),
                    };
                    describe_fields(nested, &nested_defaults)
                },
                _ => Vec::new(),
            };
            FieldDescriptor {
                name: spec.name,
                kind: spec.kind.to_string(),
                required: spec.required,
                sensitive: spec.sensitive,
                description: spec.description,
                default_value,
                fields,
            }
        })
        .collect()
}

/// A typed settings record.
///
/// Implementors declare their schema ([`fields`](Settings::fields)), the
/// serialization filter name they are exported under, the module they depend
/// on, and their structural invariants ([`validate`](Settings::validate)).
/// Defaults, binding and projection are provided.
pub trait Settings:
    Default + Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Symbolic name export layers use to select this record's field view.
    const FILTER_NAME: &'static str;

    /// Module that must be active for the record to take effect.
    const MODULE: ModuleRequirement;

    /// Top-level fields in document order.
    fn fields() -> Vec<&'static FieldSpec>;

    /// Checks structural invariants.
    ///
    /// User-input problems are reported as data; this never fails.
    fn validate(&self) -> ValidationReport;

    /// Returns a record populated with the documented defaults.
    #[must_use]
    fn load_defaults() -> Self {
        Self::default()
    }

    /// Binds an untyped document, applying defaults for absent fields.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`](crate::BindingError) when a value cannot be
    /// coerced to its declared type or an enum literal is unknown.
    fn bind_from(document: &Value) -> Result<Self> {
        Self::bind_detailed(document).map(|bound| bound.record)
    }

    /// Like [`bind_from`](Settings::bind_from), also returning the document
    /// keys the schema does not recognize.
    ///
    /// # Errors
    ///
    /// Same as [`bind_from`](Settings::bind_from).
    fn bind_detailed(document: &Value) -> Result<Bound<Self>> {
        binding::bind(document)
    }

    /// Projects the record to a document with camelCase keys.
    ///
    /// Every declared field is emitted; unset optional fields appear as
    /// `null`, which binding treats as absent. With `include`, only the fields
    /// the filter allows are emitted.
    #[must_use]
    fn to_document(&self, include: Option<&FieldFilter>) -> Document {
        let document = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                tracing::error!(filter = Self::FILTER_NAME, value = %other, "Record did not serialize to an object");
                Document::new()
            },
            Err(err) => {
                tracing::error!(filter = Self::FILTER_NAME, error = %err, "Record serialization failed");
                Document::new()
            },
        };
        match include {
            None => document,
            Some(filter) => document.into_iter().filter(|(key, _)| filter.allows(key)).collect(),
        }
    }

    /// Renders the schema with defaults, for config-metadata output.
    #[must_use]
    fn describe() -> SchemaDescriptor {
        let defaults = Self::load_defaults().to_document(None);
        SchemaDescriptor {
            filter_name: Self::FILTER_NAME,
            module: Self::MODULE,
            fields: describe_fields(Self::fields(), &defaults),
        }
    }
}
