//! Relaxed binding of untyped documents to settings records.
//!
//! Configuration reaches the server from property files, environment
//! variables and structured documents, so the same setting can arrive in
//! several spellings and as a string where a boolean or integer is declared.
//! Binding runs in two steps:
//!
//! 1. **Normalize** the raw document against the record's [`FieldSpec`] table: dotted keys are
//!    expanded into nested sections, key spellings are matched leniently (`singleRow`,
//!    `single-row`, `single_row`, `SINGLE_ROW`), scalars are coerced to their declared type and
//!    enum literals are canonicalized. Every rejection names the field.
//! 2. **Decode** the normalized document with the record's `serde` implementation, which fills in
//!    defaults for anything absent.
//!
//! Unknown keys never fail binding; they are collected in [`Bound::unknown_fields`] so callers
//! can apply their own policy.

use std::time::Duration;

use serde_json::Value;

use crate::{
    error::{BindingError, ROOT_FIELD, Result},
    schema::{Document, FieldKind, FieldSpec, Settings},
};

/// Maximum number of characters of an offending value echoed in errors.
const MAX_RENDERED_VALUE: usize = 64;

/// Placeholder echoed instead of the value of a sensitive field.
const REDACTED: &str = "<redacted>";

/// A bound record plus the keys binding ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<T> {
    /// The typed record.
    pub record: T,
    /// Paths of document keys the schema does not declare, in document order.
    pub unknown_fields: Vec<String>,
}

impl<T> Bound<T> {
    /// Returns the record, or [`BindingError::UnknownField`] naming the first
    /// unrecognized key.
    ///
    /// # Errors
    ///
    /// Fails when any key was ignored during binding.
    pub fn into_strict(self) -> Result<T> {
        let Self { record, unknown_fields } = self;
        match unknown_fields.into_iter().next() {
            Some(field) => Err(BindingError::UnknownField { field }),
            None => Ok(record),
        }
    }
}

#[tracing::instrument(skip_all, fields(filter = T::FILTER_NAME))]
pub(crate) fn bind<T: Settings>(document: &Value) -> Result<Bound<T>> {
    let mut unknown_fields = Vec::new();
    let normalized = match document {
        Value::Null => Document::new(),
        Value::Object(map) => normalize_object(map, &T::fields(), "", &mut unknown_fields)?,
        other => {
            return Err(BindingError::NotAnObject {
                field: ROOT_FIELD.to_owned(),
                value: render(other),
            });
        },
    };

    for field in &unknown_fields {
        tracing::debug!(field = %field, "Ignoring unknown setting");
    }

    let record = serde_json::from_value(Value::Object(normalized))
        .map_err(|err| BindingError::Malformed { message: err.to_string() })?;

    Ok(Bound { record, unknown_fields })
}

fn normalize_object(
    map: &Document,
    specs: &[&FieldSpec],
    prefix: &str,
    unknown_fields: &mut Vec<String>,
) -> Result<Document> {
    let mut normalized = Document::new();

    for (key, value) in expand_dotted(map, prefix)? {
        let Some(spec) = specs.iter().find(|spec| relaxed_eq(&key, spec.name)) else {
            unknown_fields.push(join(prefix, &key));
            continue;
        };
        if value.is_null() {
            continue;
        }
        let path = join(prefix, spec.name);
        if normalized.contains_key(spec.name) {
            return Err(BindingError::DuplicateField { field: path });
        }
        let coerced = coerce(spec, value, &path, unknown_fields)?;
        normalized.insert(spec.name.to_owned(), coerced);
    }

    Ok(normalized)
}

/// Expands `a.b` keys into nested sections, one level at a time.
///
/// Deeper levels are expanded when the nested section is normalized in turn.
/// String-map fields keep dotted remainders as entry keys. A dotted key into a
/// section that holds a non-object value, or one that repeats a key the
/// section already sets, is an error; `null` counts as absent.
fn expand_dotted(map: &Document, prefix: &str) -> Result<Document> {
    let mut expanded = Document::new();

    for (key, value) in map {
        match key.split_once('.') {
            Some((head, rest)) if !head.is_empty() && !rest.is_empty() => {
                let slot =
                    expanded.entry(head.to_owned()).or_insert_with(|| Value::Object(Document::new()));
                if slot.is_null() {
                    *slot = Value::Object(Document::new());
                }
                match slot {
                    Value::Object(section) if section.contains_key(rest) => {
                        return Err(BindingError::DuplicateField { field: join(prefix, key) });
                    },
                    Value::Object(section) => {
                        section.insert(rest.to_owned(), value.clone());
                    },
                    other => {
                        return Err(BindingError::NotAnObject {
                            field: join(prefix, head),
                            value: render(other),
                        });
                    },
                }
            },
            _ => match (expanded.get_mut(key), value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    for (nested_key, nested_value) in incoming {
                        if existing.contains_key(nested_key) {
                            return Err(BindingError::DuplicateField {
                                field: join(&join(prefix, key), nested_key),
                            });
                        }
                        existing.insert(nested_key.clone(), nested_value.clone());
                    }
                },
                (Some(Value::Object(_)), Value::Null) => {},
                (Some(Value::Object(_)), other) => {
                    return Err(BindingError::NotAnObject {
                        field: join(prefix, key),
                        value: render(other),
                    });
                },
                _ => {
                    expanded.insert(key.clone(), value.clone());
                },
            },
        }
    }

    Ok(expanded)
}

/// Compares a document key with a canonical field name, ignoring ASCII case
/// and `-` / `_` separators.
#[must_use]
pub fn relaxed_eq(candidate: &str, canonical: &str) -> bool {
    candidate
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .eq(canonical.chars().map(|c| c.to_ascii_lowercase()))
}

fn coerce(
    spec: &FieldSpec,
    value: Value,
    path: &str,
    unknown_fields: &mut Vec<String>,
) -> Result<Value> {
    match spec.kind {
        FieldKind::String => match scalar_to_string(&value) {
            Some(s) => Ok(Value::String(s)),
            None => Err(mismatch(spec, path, "string", &value)),
        },

        FieldKind::Boolean => match &value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch(spec, path, "boolean", &value)),
            },
            _ => Err(mismatch(spec, path, "boolean", &value)),
        },

        FieldKind::Integer { min, max } => {
            let parsed = match &value {
                Value::Number(n) => n.as_i64().map(i128::from).or_else(|| n.as_u64().map(i128::from)),
                Value::String(s) => s.trim().parse::<i128>().ok(),
                _ => None,
            };
            match parsed {
                Some(n) if (min..=max).contains(&n) => i64::try_from(n)
                    .map(Value::from)
                    .or_else(|_| u64::try_from(n).map(Value::from))
                    .map_err(|_| out_of_range(spec, path, &value, min, max)),
                Some(_) => Err(out_of_range(spec, path, &value, min, max)),
                None => Err(mismatch(spec, path, "integer", &value)),
            }
        },

        FieldKind::Duration => match &value {
            Value::String(s) => {
                let literal = s.trim().to_owned();
                let parsed: std::result::Result<Duration, serde_json::Error> =
                    humantime_serde::deserialize(Value::String(literal.clone()));
                match parsed {
                    Ok(_) => Ok(Value::String(literal)),
                    Err(err) => Err(BindingError::InvalidDuration {
                        field: path.to_owned(),
                        value: render_for(spec, &value),
                        message: err.to_string(),
                    }),
                }
            },
            _ => Err(mismatch(spec, path, "duration", &value)),
        },

        FieldKind::StringList => match &value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    scalar_to_string(item).map(Value::String).ok_or_else(|| {
                        mismatch(spec, &format!("{path}[{i}]"), "string", item)
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::String(s) => Ok(Value::Array(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_owned()))
                    .collect(),
            )),
            _ => Err(mismatch(spec, path, "list of strings", &value)),
        },

        FieldKind::StringMap => match &value {
            Value::Object(entries) => entries
                .iter()
                .map(|(key, entry)| {
                    scalar_to_string(entry)
                        .map(|s| (key.clone(), Value::String(s)))
                        .ok_or_else(|| mismatch(spec, &format!("{path}.{key}"), "string", entry))
                })
                .collect::<Result<Document>>()
                .map(Value::Object),
            _ => Err(mismatch(spec, path, "map of strings", &value)),
        },

        FieldKind::Enum(domain) => match &value {
            Value::String(s) => {
                let literal = s.trim();
                domain
                    .iter()
                    .find(|candidate| candidate.eq_ignore_ascii_case(literal))
                    .map(|canonical| Value::String((*canonical).to_owned()))
                    .ok_or_else(|| BindingError::UnknownVariant {
                        field: path.to_owned(),
                        value: s.clone(),
                        expected: domain,
                    })
            },
            _ => Err(mismatch(spec, path, &format!("one of {}", domain.join(", ")), &value)),
        },

        FieldKind::Object(nested) => match &value {
            Value::Object(map) => {
                let specs: Vec<&FieldSpec> = nested.iter().collect();
                normalize_object(map, &specs, path, unknown_fields).map(Value::Object)
            },
            _ => Err(BindingError::NotAnObject { field: path.to_owned(), value: render(&value) }),
        },
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn mismatch(spec: &FieldSpec, path: &str, expected: &str, value: &Value) -> BindingError {
    BindingError::TypeMismatch {
        field: path.to_owned(),
        expected: expected.to_owned(),
        value: render_for(spec, value),
    }
}

fn out_of_range(spec: &FieldSpec, path: &str, value: &Value, min: i128, max: i128) -> BindingError {
    BindingError::OutOfRange { field: path.to_owned(), value: render_for(spec, value), min, max }
}

fn render_for(spec: &FieldSpec, value: &Value) -> String {
    if spec.sensitive { REDACTED.to_owned() } else { render(value) }
}

/// Renders a value for an error message, truncated to a readable length.
#[must_use]
pub fn render(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_RENDERED_VALUE {
        rendered
    } else {
        let truncated: String = rendered.chars().take(MAX_RENDERED_VALUE).collect();
        format!("{truncated}...")
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() { key.to_owned() } else { format!("{prefix}.{key}") }
}
