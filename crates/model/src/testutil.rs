//! Shared fixtures for settings tests.
//!
//! Feature-gated behind `testutil` so fixtures never reach production builds.
//!
//! ```toml
//! [dev-dependencies]
//! casconf-model = { path = "../model", features = ["testutil"] }
//! ```

use serde_json::{Value, json};

use crate::{
    JdbcAttributeRepositorySettings, SamlMetadataLocationSettings, Settings,
    jdbc::CaseCanonicalizationMode,
};

/// SQL template with a single predicate placeholder.
pub const SAMPLE_SQL: &str = "SELECT * FROM people WHERE {0}";

/// A valid one-row-per-subject repository with the given id and order.
#[must_use]
pub fn single_row_repository(id: &str, order: i32) -> JdbcAttributeRepositorySettings {
    JdbcAttributeRepositorySettings::builder()
        .id(id)
        .order(order)
        .sql(SAMPLE_SQL)
        .username(vec!["uid".to_owned()])
        .build()
}

/// A valid attribute-per-row repository mapping `attr_name` to `attr_value`.
#[must_use]
pub fn eav_repository(id: &str, order: i32) -> JdbcAttributeRepositorySettings {
    JdbcAttributeRepositorySettings::builder()
        .id(id)
        .order(order)
        .sql(SAMPLE_SQL)
        .single_row(false)
        .column_mappings([("attr_name".to_owned(), "attr_value".to_owned())].into())
        .username(vec!["uid".to_owned()])
        .case_canonicalization(CaseCanonicalizationMode::Lower)
        .build()
}

/// A repository document written the way a properties source would supply
/// it: kebab-case keys, string-encoded scalars and dotted sections.
#[must_use]
pub fn relaxed_repository_document(id: &str, order: i32) -> Value {
    json!({
        "id": id,
        "order": order.to_string(),
        "sql": SAMPLE_SQL,
        "single-row": "false",
        "column-mappings.attr_name": "attr_value",
        "username": "uid,mail",
        "query-type": "or",
        "case-insensitive-query-attributes": "uid->lower",
        "url": "jdbc:postgresql://db.example.org/cas",
        "user": "cas",
        "password": "s3cret",
        "pool.max-size": "24",
    })
}

/// A SAML location document pointing at `location`.
#[must_use]
pub fn saml_document(location: &str) -> Value {
    json!({ "location": location })
}

/// Binds `document`, panicking with the binding error on failure.
#[must_use]
pub fn bind<T: Settings>(document: &Value) -> T {
    T::bind_from(document).expect("fixture document should bind")
}

/// Default SAML settings.
#[must_use]
pub fn default_saml() -> SamlMetadataLocationSettings {
    SamlMetadataLocationSettings::load_defaults()
}
