//! Settings for a relational attribute repository.
//!
//! A [`JdbcAttributeRepositorySettings`] record tells the attribute
//! repository engine how to query a database for principal attributes: the
//! SQL template, the table shape (one row per subject or one row per
//! attribute), which attributes build the lookup predicate, and how result
//! columns are renamed.
//!
//! # Example
//!
//! ```
//! use casconf_model::{JdbcAttributeRepositorySettings, QueryType, Settings};
//! use serde_json::json;
//!
//! let settings = JdbcAttributeRepositorySettings::bind_from(&json!({
//!     "sql": "SELECT * FROM people WHERE {0}",
//!     "single-row": "false",
//!     "columnMappings": { "attr_name": "attr_value" },
//!     "username": "uid",
//!     "queryType": "or",
//! }))?;
//!
//! assert!(!settings.single_row());
//! assert_eq!(settings.query_type(), QueryType::Or);
//! assert!(settings.validate().is_valid());
//! # Ok::<(), casconf_model::BindingError>(())
//! ```

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    connection::{CONNECTION_FIELDS, RelationalConnectionSettings},
    error::UnknownLiteral,
    schema::{FieldKind, FieldSpec, ModuleRequirement, Settings},
    validation::{ValidationReport, ViolationKind},
};

/// Substitution point the engine replaces with the generated predicate.
pub const PREDICATE_PLACEHOLDER: &str = "{0}";

/// Separator between a query attribute and its canonicalization override.
pub const QUERY_ATTRIBUTE_SEPARATOR: &str = "->";

/// How the principal's identifying attribute is canonicalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaseCanonicalizationMode {
    /// Leave values untouched.
    #[default]
    None,
    /// Lower-case values.
    Lower,
    /// Upper-case values.
    Upper,
}

impl CaseCanonicalizationMode {
    /// Declared literals, in declaration order.
    pub const LITERALS: &'static [&'static str] = &["NONE", "LOWER", "UPPER"];

    /// Returns the canonical literal.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Lower => "LOWER",
            Self::Upper => "UPPER",
        }
    }

    /// Applies the canonicalization to `value`.
    #[must_use]
    pub fn canonicalize(&self, value: &str) -> String {
        match self {
            Self::None => value.to_owned(),
            Self::Lower => value.to_lowercase(),
            Self::Upper => value.to_uppercase(),
        }
    }
}

impl fmt::Display for CaseCanonicalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseCanonicalizationMode {
    type Err = UnknownLiteral;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "LOWER" => Ok(Self::Lower),
            "UPPER" => Ok(Self::Upper),
            _ => Err(UnknownLiteral { value: s.to_owned(), expected: Self::LITERALS }),
        }
    }
}

/// Boolean combinator applied when several lookup attributes are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    /// All attributes must match.
    #[default]
    And,
    /// Any attribute may match.
    Or,
}

impl QueryType {
    /// Declared literals, in declaration order.
    pub const LITERALS: &'static [&'static str] = &["AND", "OR"];

    /// Returns the canonical literal.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = UnknownLiteral;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            _ => Err(UnknownLiteral { value: s.to_owned(), expected: Self::LITERALS }),
        }
    }
}

/// A malformed `caseInsensitiveQueryAttributes` entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryAttributeError {
    /// The attribute part is empty.
    #[error("query attribute name must not be blank")]
    BlankAttribute,

    /// The override is not a canonicalization mode.
    #[error("invalid canonicalization override: {0}")]
    UnknownMode(#[from] UnknownLiteral),
}

/// Parses a `caseInsensitiveQueryAttributes` entry.
///
/// `attr->MODE` yields the override; a bare `attr` yields `fallback`.
///
/// # Errors
///
/// Returns [`QueryAttributeError`] for a blank attribute or an unknown mode.
pub fn parse_query_attribute(
    entry: &str,
    fallback: CaseCanonicalizationMode,
) -> Result<(String, CaseCanonicalizationMode), QueryAttributeError> {
    let (attribute, mode) = match entry.split_once(QUERY_ATTRIBUTE_SEPARATOR) {
        Some((attribute, mode)) => (attribute.trim(), mode.parse()?),
        None => (entry.trim(), fallback),
    };
    if attribute.is_empty() {
        return Err(QueryAttributeError::BlankAttribute);
    }
    Ok((attribute.to_owned(), mode))
}

const JDBC_FIELDS: &[FieldSpec] = &[
    FieldSpec::new(
        "sql",
        FieldKind::String,
        "Query template; the generated predicate replaces {0}, e.g. SELECT * FROM table WHERE {0}.",
    ),
    FieldSpec::new(
        "singleRow",
        FieldKind::Boolean,
        "One row per subject (true) or one row per attribute (false).",
    ),
    FieldSpec::new(
        "requireAllAttributes",
        FieldKind::Boolean,
        "Only run the query if all mapped attributes are present.",
    ),
    FieldSpec::new(
        "caseCanonicalization",
        FieldKind::Enum(CaseCanonicalizationMode::LITERALS),
        "Canonicalization of the principal's identifying attribute.",
    ),
    FieldSpec::new(
        "queryType",
        FieldKind::Enum(QueryType::LITERALS),
        "How multiple lookup attributes are combined.",
    ),
    FieldSpec::new(
        "columnMappings",
        FieldKind::StringMap,
        "Attribute-name column to attribute-value column, for one-row-per-attribute tables.",
    ),
    FieldSpec::new("username", FieldKind::StringList, "Attributes used to build the query."),
    FieldSpec::new("order", FieldKind::I32, "Position of this repository in the chain."),
    FieldSpec::new("id", FieldKind::String, "Unique identifier of this repository."),
    FieldSpec::new(
        "attributes",
        FieldKind::StringMap,
        "Source column to exposed attribute name (virtual rename).",
    ),
    FieldSpec::new(
        "caseInsensitiveQueryAttributes",
        FieldKind::StringList,
        "Query attributes to canonicalize, as attr or attr->NONE|LOWER|UPPER.",
    ),
];

/// Settings of one relational attribute repository.
///
/// Serialized under the filter name `JdbcPrincipalAttributesProperties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default, rename_all = "camelCase")]
pub struct JdbcAttributeRepositorySettings {
    /// Connection settings, flattened into the same document section.
    #[serde(flatten)]
    #[builder(default)]
    pub(crate) connection: RelationalConnectionSettings,

    #[builder(into)]
    pub(crate) sql: Option<String>,

    #[builder(default = true)]
    pub(crate) single_row: bool,

    #[builder(default = true)]
    pub(crate) require_all_attributes: bool,

    #[builder(default)]
    pub(crate) case_canonicalization: CaseCanonicalizationMode,

    #[builder(default)]
    pub(crate) query_type: QueryType,

    #[builder(default)]
    pub(crate) column_mappings: BTreeMap<String, String>,

    #[builder(default)]
    pub(crate) username: Vec<String>,

    #[builder(default)]
    pub(crate) order: i32,

    #[builder(into)]
    pub(crate) id: Option<String>,

    #[builder(default)]
    pub(crate) attributes: BTreeMap<String, String>,

    #[builder(default)]
    pub(crate) case_insensitive_query_attributes: Vec<String>,
}

impl Default for JdbcAttributeRepositorySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl JdbcAttributeRepositorySettings {
    /// Returns the embedded connection settings.
    #[must_use]
    pub fn connection(&self) -> &RelationalConnectionSettings {
        &self.connection
    }

    /// Returns the query template, if configured.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    /// Returns `true` for one-row-per-subject tables.
    #[must_use]
    pub fn single_row(&self) -> bool {
        self.single_row
    }

    /// Returns whether every mapped attribute must be present.
    #[must_use]
    pub fn require_all_attributes(&self) -> bool {
        self.require_all_attributes
    }

    /// Returns the canonicalization of the identifying attribute.
    #[must_use]
    pub fn case_canonicalization(&self) -> CaseCanonicalizationMode {
        self.case_canonicalization
    }

    /// Returns the lookup attribute combinator.
    #[must_use]
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// Returns the name-column to value-column mappings.
    #[must_use]
    pub fn column_mappings(&self) -> &BTreeMap<String, String> {
        &self.column_mappings
    }

    /// Returns the lookup attributes, in order.
    #[must_use]
    pub fn username(&self) -> &[String] {
        &self.username
    }

    /// Returns the chain position.
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Returns the repository identifier, if configured.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the source-column to attribute-name renames.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Returns the raw `caseInsensitiveQueryAttributes` entries.
    #[must_use]
    pub fn case_insensitive_query_attributes(&self) -> &[String] {
        &self.case_insensitive_query_attributes
    }

    /// Resolves `caseInsensitiveQueryAttributes` into `(attribute, mode)`
    /// pairs, in declaration order.
    ///
    /// Entries without an override take [`case_canonicalization`](Self::case_canonicalization).
    /// Malformed entries are skipped; [`Settings::validate`] reports them.
    #[must_use]
    pub fn query_attribute_canonicalization(&self) -> Vec<(String, CaseCanonicalizationMode)> {
        self.case_insensitive_query_attributes
            .iter()
            .filter_map(|entry| match parse_query_attribute(entry, self.case_canonicalization) {
                Ok(pair) => Some(pair),
                Err(err) => {
                    tracing::warn!(entry = %entry, error = %err, "Skipping query attribute");
                    None
                },
            })
            .collect()
    }
}

impl Settings for JdbcAttributeRepositorySettings {
    const FILTER_NAME: &'static str = "JdbcPrincipalAttributesProperties";
    const MODULE: ModuleRequirement =
        ModuleRequirement::new("cas-server-support-person-directory", true);

    fn fields() -> Vec<&'static FieldSpec> {
        CONNECTION_FIELDS.iter().chain(JDBC_FIELDS).collect()
    }

    fn validate(&self) -> ValidationReport {
        let mut report = self.connection.validate();

        if let Some(sql) = &self.sql {
            let placeholders = sql.matches(PREDICATE_PLACEHOLDER).count();
            if sql.trim().is_empty() {
                report.push("sql", ViolationKind::Required, "must not be blank when set");
            } else if placeholders != 1 {
                report.push(
                    "sql",
                    ViolationKind::Malformed,
                    format!(
                        "must contain exactly one {PREDICATE_PLACEHOLDER} placeholder, found {placeholders}"
                    ),
                );
            }
        }

        if !self.single_row {
            if self.column_mappings.is_empty() {
                report.push(
                    "columnMappings",
                    ViolationKind::Incomplete,
                    "singleRow=false requires a mapping from the attribute-name column to the \
                     attribute-value column",
                );
            } else if self
                .column_mappings
                .iter()
                .any(|(name, value)| name.trim().is_empty() || value.trim().is_empty())
            {
                report.push(
                    "columnMappings",
                    ViolationKind::Incomplete,
                    "attribute-name and attribute-value column names must not be blank",
                );
            }
        }

        for (i, attribute) in self.username.iter().enumerate() {
            if attribute.trim().is_empty() {
                report.push(format!("username[{i}]"), ViolationKind::Malformed, "must not be blank");
            }
        }

        if self.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            report.push("id", ViolationKind::Required, "must not be blank when set");
        }

        for (source, alias) in &self.attributes {
            if source.trim().is_empty() {
                report.push("attributes", ViolationKind::Malformed, "source column must not be blank");
            } else if alias.trim().is_empty() {
                report.push(
                    format!("attributes.{source}"),
                    ViolationKind::Malformed,
                    "attribute name must not be blank",
                );
            }
        }

        for (i, entry) in self.case_insensitive_query_attributes.iter().enumerate() {
            if let Err(err) = parse_query_attribute(entry, self.case_canonicalization) {
                report.push(
                    format!("caseInsensitiveQueryAttributes[{i}]"),
                    ViolationKind::Malformed,
                    err.to_string(),
                );
            }
        }

        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::{BindingError, FieldFilter, connection::ConnectionPoolSettings};

    #[test]
    fn test_defaults() {
        let settings = JdbcAttributeRepositorySettings::load_defaults();
        assert!(settings.sql().is_none());
        assert!(settings.single_row());
        assert!(settings.require_all_attributes());
        assert_eq!(settings.case_canonicalization(), CaseCanonicalizationMode::None);
        assert_eq!(settings.query_type(), QueryType::And);
        assert!(settings.column_mappings().is_empty());
        assert!(settings.username().is_empty());
        assert_eq!(settings.order(), 0);
        assert!(settings.id().is_none());
        assert!(settings.attributes().is_empty());
        assert!(settings.case_insensitive_query_attributes().is_empty());
        assert!(settings.validate().is_valid());
    }

    #[test]
    fn test_empty_document_binds_to_defaults() {
        let settings = JdbcAttributeRepositorySettings::bind_from(&json!({})).unwrap();
        assert_eq!(settings, JdbcAttributeRepositorySettings::load_defaults());
    }

    #[test]
    fn test_defaults_round_trip() {
        let defaults = JdbcAttributeRepositorySettings::load_defaults();
        let document = serde_json::Value::Object(defaults.to_document(None));
        let bound = JdbcAttributeRepositorySettings::bind_from(&document).unwrap();
        assert_eq!(bound, defaults);
    }

    #[test]
    fn test_eav_without_mappings_reports_one_violation() {
        let settings =
            JdbcAttributeRepositorySettings::bind_from(&json!({ "singleRow": false, "columnMappings": {} }))
                .unwrap();
        let report = settings.validate();
        assert_eq!(report.len(), 1, "{report}");
        assert_eq!(report.violations()[0].field(), "columnMappings");
        assert_eq!(report.violations()[0].kind(), ViolationKind::Incomplete);
    }

    #[rstest]
    #[case::complete(json!({ "attr_name": "attr_value" }), true)]
    #[case::blank_value(json!({ "attr_name": " " }), false)]
    #[case::blank_name(json!({ "": "attr_value" }), false)]
    #[case::empty(json!({}), false)]
    fn test_eav_column_mappings(#[case] mappings: serde_json::Value, #[case] valid: bool) {
        let settings = JdbcAttributeRepositorySettings::bind_from(
            &json!({ "singleRow": false, "columnMappings": mappings }),
        )
        .unwrap();
        assert_eq!(!settings.validate().mentions("columnMappings"), valid);
    }

    #[test]
    fn test_single_row_ignores_column_mappings() {
        let settings = JdbcAttributeRepositorySettings::bind_from(&json!({ "columnMappings": {} })).unwrap();
        assert!(settings.validate().is_valid());
    }

    #[rstest]
    #[case::one("SELECT * FROM people WHERE {0}", true)]
    #[case::none("SELECT * FROM people", false)]
    #[case::two("SELECT * FROM people WHERE {0} OR {0}", false)]
    #[case::blank("   ", false)]
    fn test_sql_placeholder(#[case] sql: &str, #[case] valid: bool) {
        let settings = JdbcAttributeRepositorySettings::builder().sql(sql).build();
        assert_eq!(settings.validate().is_valid(), valid);
    }

    #[rstest]
    #[case::bare("uid", CaseCanonicalizationMode::Upper, ("uid", CaseCanonicalizationMode::Upper))]
    #[case::override_mode("uid->lower", CaseCanonicalizationMode::Upper, ("uid", CaseCanonicalizationMode::Lower))]
    #[case::spaced(" mail -> NONE ", CaseCanonicalizationMode::Lower, ("mail", CaseCanonicalizationMode::None))]
    fn test_parse_query_attribute(
        #[case] entry: &str,
        #[case] fallback: CaseCanonicalizationMode,
        #[case] expected: (&str, CaseCanonicalizationMode),
    ) {
        let (attribute, mode) = parse_query_attribute(entry, fallback).unwrap();
        assert_eq!((attribute.as_str(), mode), expected);
    }

    #[test]
    fn test_parse_query_attribute_errors() {
        assert_eq!(
            parse_query_attribute("->LOWER", CaseCanonicalizationMode::None),
            Err(QueryAttributeError::BlankAttribute)
        );
        assert!(matches!(
            parse_query_attribute("uid->TITLE", CaseCanonicalizationMode::None),
            Err(QueryAttributeError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_query_attribute_canonicalization_falls_back_and_skips_malformed() {
        let settings = JdbcAttributeRepositorySettings::builder()
            .case_canonicalization(CaseCanonicalizationMode::Lower)
            .case_insensitive_query_attributes(vec![
                "username".into(),
                "mail->UPPER".into(),
                "bad->SIDEWAYS".into(),
            ])
            .build();

        assert_eq!(
            settings.query_attribute_canonicalization(),
            vec![
                ("username".to_owned(), CaseCanonicalizationMode::Lower),
                ("mail".to_owned(), CaseCanonicalizationMode::Upper),
            ]
        );
        let report = settings.validate();
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].field(), "caseInsensitiveQueryAttributes[2]");
    }

    #[test]
    fn test_blank_entries_are_reported() {
        let settings = JdbcAttributeRepositorySettings::builder()
            .username(vec!["uid".into(), " ".into()])
            .id("")
            .attributes(BTreeMap::from([("cn".to_owned(), String::new())]))
            .build();
        let report = settings.validate();
        assert!(report.mentions("username[1]"));
        assert!(report.mentions("id"));
        assert!(report.mentions("attributes.cn"));
        assert_eq!(report.len(), 3);
    }

    #[rstest]
    #[case::query_type("queryType", json!("XOR"))]
    #[case::canonicalization("caseCanonicalization", json!("TITLE"))]
    fn test_unknown_enum_literal_names_field(#[case] field: &str, #[case] value: serde_json::Value) {
        let err = JdbcAttributeRepositorySettings::bind_from(&json!({ field: value })).unwrap_err();
        assert!(matches!(err, BindingError::UnknownVariant { .. }));
        assert_eq!(err.field(), Some(field));
    }

    #[test]
    fn test_type_mismatch_names_field() {
        let err = JdbcAttributeRepositorySettings::bind_from(&json!({ "singleRow": [true] })).unwrap_err();
        assert!(matches!(err, BindingError::TypeMismatch { ref field, .. } if field == "singleRow"));
    }

    #[test]
    fn test_connection_fields_bind_alongside() {
        let settings = JdbcAttributeRepositorySettings::bind_from(&json!({
            "url": "jdbc:postgresql://db/cas",
            "password": "s3cret",
            "pool.max-size": "30",
            "sql": "SELECT * FROM people WHERE {0}",
        }))
        .unwrap();
        assert_eq!(settings.connection().url(), "jdbc:postgresql://db/cas");
        assert_eq!(settings.connection().password(), "s3cret");
        assert_eq!(settings.connection().pool().max_size(), 30);
        assert_eq!(settings.sql(), Some("SELECT * FROM people WHERE {0}"));
    }

    #[test]
    fn test_filter_projects_exact_subset() {
        let settings = JdbcAttributeRepositorySettings::builder()
            .sql("SELECT * FROM people WHERE {0}")
            .build();
        let document = settings.to_document(Some(&FieldFilter::only(["sql"])));
        assert_eq!(document.keys().collect::<Vec<_>>(), ["sql"]);
    }

    #[test]
    fn test_redacted_filter_drops_password() {
        let settings = JdbcAttributeRepositorySettings::bind_from(&json!({ "password": "s3cret" })).unwrap();
        let document =
            settings.to_document(Some(&FieldFilter::redacted::<JdbcAttributeRepositorySettings>()));
        assert!(!document.contains_key("password"));
        assert!(document.contains_key("url"));
        assert!(document.contains_key("singleRow"));
    }

    #[test]
    fn test_describe_lists_flattened_fields() {
        let schema = JdbcAttributeRepositorySettings::describe();
        assert_eq!(schema.filter_name, "JdbcPrincipalAttributesProperties");
        assert!(schema.module.automated);

        let names: Vec<_> = schema.fields.iter().map(|f| f.name).collect();
        assert!(names.contains(&"url"));
        assert!(names.contains(&"caseInsensitiveQueryAttributes"));

        let password = schema.fields.iter().find(|f| f.name == "password").unwrap();
        assert!(password.sensitive);
        assert!(password.default_value.is_none());

        let single_row = schema.fields.iter().find(|f| f.name == "singleRow").unwrap();
        assert_eq!(single_row.default_value, Some(json!(true)));

        let pool = schema.fields.iter().find(|f| f.name == "pool").unwrap();
        assert_eq!(pool.fields.len(), 5);
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(CaseCanonicalizationMode::None.canonicalize("CasUser"), "CasUser");
        assert_eq!(CaseCanonicalizationMode::Lower.canonicalize("CasUser"), "casuser");
        assert_eq!(CaseCanonicalizationMode::Upper.canonicalize("CasUser"), "CASUSER");
    }

    #[test]
    fn test_unsigned_fields_rebind_at_upper_bound() {
        let settings = JdbcAttributeRepositorySettings::builder()
            .connection(
                RelationalConnectionSettings::builder()
                    .leak_threshold(u64::MAX)
                    .pool(ConnectionPoolSettings::builder().timeout_millis(u64::MAX).build())
                    .build(),
            )
            .build();
        let document = serde_json::Value::Object(settings.to_document(None));
        assert_eq!(document["leakThreshold"], json!(u64::MAX));
        assert_eq!(JdbcAttributeRepositorySettings::bind_from(&document).unwrap(), settings);
    }

    proptest! {
        /// Connection fields survive projection and rebinding across their
        /// full numeric ranges.
        #[test]
        fn connection_fields_rebind_identically(
            leak_threshold in any::<u64>(),
            batch_size in any::<u32>(),
            fail_fast_timeout in any::<i64>(),
            min_size in any::<u32>(),
            max_size in any::<u32>(),
            timeout_millis in any::<u64>(),
            idle_millis in 0_u64..10_000_000,
            default_schema in proptest::option::of("[a-z]{1,8}"),
        ) {
            let connection = RelationalConnectionSettings::builder()
                .leak_threshold(leak_threshold)
                .batch_size(batch_size)
                .fail_fast_timeout(fail_fast_timeout)
                .idle_timeout(Duration::from_millis(idle_millis))
                .maybe_default_schema(default_schema)
                .pool(
                    ConnectionPoolSettings::builder()
                        .min_size(min_size)
                        .max_size(max_size)
                        .timeout_millis(timeout_millis)
                        .build(),
                )
                .build();
            let settings = JdbcAttributeRepositorySettings::builder().connection(connection).build();
            let document = serde_json::Value::Object(settings.to_document(None));
            prop_assert_eq!(JdbcAttributeRepositorySettings::bind_from(&document).unwrap(), settings);
        }

        /// With singleRow=false, a violation on columnMappings is reported
        /// exactly when some mapping is missing or blank.
        #[test]
        fn eav_violation_iff_mapping_incomplete(
            mappings in proptest::collection::btree_map("[a-z_ ]{0,6}", "[a-z_ ]{0,6}", 0..3),
        ) {
            let complete = !mappings.is_empty()
                && mappings.iter().all(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty());
            let settings = JdbcAttributeRepositorySettings::builder()
                .single_row(false)
                .column_mappings(mappings)
                .build();
            prop_assert_eq!(settings.validate().mentions("columnMappings"), !complete);
        }

        /// Any literal outside the declared domain is rejected naming the field.
        #[test]
        fn unknown_query_type_rejected(literal in "[A-Za-z]{1,8}") {
            prop_assume!(!["AND", "OR"].contains(&literal.to_ascii_uppercase().as_str()));
            let err = JdbcAttributeRepositorySettings::bind_from(&json!({ "queryType": literal }))
                .unwrap_err();
            prop_assert_eq!(err.field(), Some("queryType"));
        }

        /// Binding the full projection of a bound record yields the same record.
        #[test]
        fn projection_rebinds_identically(
            order in any::<i32>(),
            single_row in any::<bool>(),
            username in proptest::collection::vec("[a-z]{1,8}", 0..4),
        ) {
            let settings = JdbcAttributeRepositorySettings::builder()
                .order(order)
                .single_row(single_row)
                .username(username)
                .build();
            let document = serde_json::Value::Object(settings.to_document(None));
            prop_assert_eq!(JdbcAttributeRepositorySettings::bind_from(&document).unwrap(), settings);
        }
    }
}
