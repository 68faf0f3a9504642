//! The settings registry.
//!
//! [`SettingsRegistry`] binds a root document holding every section the
//! server reads and publishes the result as one [`RegistrySnapshot`]:
//!
//! ```json
//! {
//!   "jdbc": [ { "id": "people", "sql": "SELECT * FROM people WHERE {0}" } ],
//!   "samlMetadata": { "location": "file:/etc/cas/saml" }
//! }
//! ```
//!
//! A load either publishes a complete new snapshot or leaves the previous one
//! in place.

use std::sync::Arc;

use casconf_model::{
    BindingError, Document, FieldFilter, JdbcAttributeRepositorySettings,
    SamlMetadataLocationSettings, Settings, ValidationReport,
    binding::{relaxed_eq, render},
    error::ROOT_FIELD,
};
use serde_json::Value;

use crate::{
    chain::RepositoryChain,
    config::RegistryConfig,
    error::Result,
    handle::{self, ReloadOutcome, SettingsHandle},
};

/// Root key of the relational repository sections.
pub const JDBC_SECTION: &str = "jdbc";

/// Root key of the SAML metadata location section.
pub const SAML_SECTION: &str = "samlMetadata";

/// Name reported for problems spanning the whole root document.
pub const ROOT_DOCUMENT: &str = "settings";

/// Every settings record, as published together by one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    repositories: RepositoryChain,
    saml_metadata: SamlMetadataLocationSettings,
}

impl RegistrySnapshot {
    /// Assembles a snapshot.
    #[must_use]
    pub fn new(repositories: RepositoryChain, saml_metadata: SamlMetadataLocationSettings) -> Self {
        Self { repositories, saml_metadata }
    }

    /// Returns the repository chain.
    #[must_use]
    pub fn repositories(&self) -> &RepositoryChain {
        &self.repositories
    }

    /// Returns the SAML metadata location.
    #[must_use]
    pub fn saml_metadata(&self) -> &SamlMetadataLocationSettings {
        &self.saml_metadata
    }

    /// Validates every record, anchoring violations at their root key.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = self.repositories.validate();
        report.extend(handle::validate(&self.saml_metadata).prefixed(SAML_SECTION));
        report
    }

    /// Projects the snapshot back to a root document with sensitive fields
    /// removed.
    #[must_use]
    pub fn export(&self) -> Document {
        let jdbc_filter = FieldFilter::redacted::<JdbcAttributeRepositorySettings>();
        let saml_filter = FieldFilter::redacted::<SamlMetadataLocationSettings>();

        let repositories = self
            .repositories
            .registered()
            .iter()
            .map(|repository| Value::Object(repository.to_document(Some(&jdbc_filter))))
            .collect();

        let mut document = Document::new();
        document.insert(JDBC_SECTION.to_owned(), Value::Array(repositories));
        document.insert(
            SAML_SECTION.to_owned(),
            Value::Object(self.saml_metadata.to_document(Some(&saml_filter))),
        );
        document
    }
}

/// Publishes settings snapshots and applies [`RegistryConfig`] to every load.
///
/// # Cloning
///
/// `SettingsRegistry` is cheaply cloneable. All clones share the published
/// snapshot.
#[derive(Debug, Clone)]
pub struct SettingsRegistry {
    config: RegistryConfig,
    state: SettingsHandle<RegistrySnapshot>,
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl SettingsRegistry {
    /// Creates a registry publishing default settings as generation 0.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self { config, state: SettingsHandle::new(RegistrySnapshot::default()) }
    }

    /// Returns the registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.state.current()
    }

    /// Returns the number of successful loads.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.generation()
    }

    /// Returns the published repositories, sorted by `order`.
    ///
    /// Repositories with equal `order` keep their registration order.
    #[must_use]
    pub fn repositories(&self) -> Vec<JdbcAttributeRepositorySettings> {
        self.snapshot().repositories().ordered().into_iter().cloned().collect()
    }

    /// Returns the published SAML metadata location.
    #[must_use]
    pub fn saml_metadata(&self) -> SamlMetadataLocationSettings {
        self.snapshot().saml_metadata().clone()
    }

    /// Binds `document`, screens it and publishes it as the new snapshot.
    ///
    /// The `jdbc` section may be a list of repository sections or a single
    /// section. Absent sections take their defaults. Root keys are matched
    /// with the same relaxed rules as record fields.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Binding`](crate::RegistryError::Binding) if any section fails to bind;
    ///   the field path starts at the root, e.g. `jdbc[1].queryType`
    /// - [`RegistryError::UnknownFields`](crate::RegistryError::UnknownFields) if unknown keys are
    ///   rejected
    /// - [`RegistryError::Rejected`](crate::RegistryError::Rejected) if any record is invalid, or two
    ///   repositories share an id, and invalid settings are rejected
    #[tracing::instrument(skip_all)]
    pub fn load(&self, document: &Value) -> Result<ReloadOutcome> {
        let empty = Document::new();
        let root = match document {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(BindingError::NotAnObject {
                    field: ROOT_FIELD.to_owned(),
                    value: render(other),
                }
                .into());
            },
        };

        let mut unknown_fields = Vec::new();
        let mut jdbc = None;
        let mut saml = None;
        for (key, value) in root {
            if relaxed_eq(key, JDBC_SECTION) {
                jdbc = Some(value);
            } else if relaxed_eq(key, SAML_SECTION) {
                saml = Some(value);
            } else {
                unknown_fields.push(key.clone());
            }
        }

        let mut repositories = Vec::new();
        for (i, section) in jdbc_sections(jdbc)?.into_iter().enumerate() {
            let prefix = format!("{JDBC_SECTION}[{i}]");
            let bound = JdbcAttributeRepositorySettings::bind_detailed(section)
                .map_err(|err| err.prefixed(&prefix))?;
            unknown_fields.extend(bound.unknown_fields.iter().map(|field| format!("{prefix}.{field}")));
            repositories.push(bound.record);
        }

        let saml_metadata = match saml {
            Some(section) => {
                let bound = SamlMetadataLocationSettings::bind_detailed(section)
                    .map_err(|err| err.prefixed(SAML_SECTION))?;
                unknown_fields
                    .extend(bound.unknown_fields.iter().map(|field| format!("{SAML_SECTION}.{field}")));
                bound.record
            },
            None => SamlMetadataLocationSettings::load_defaults(),
        };

        self.config.screen_unknown(ROOT_DOCUMENT, &unknown_fields)?;

        let snapshot = RegistrySnapshot::new(RepositoryChain::new(repositories), saml_metadata);
        let warnings = self.config.screen_report(ROOT_DOCUMENT, snapshot.validate())?;

        let supplied = [
            (!snapshot.repositories.is_empty(), JdbcAttributeRepositorySettings::MODULE),
            (saml.is_some(), SamlMetadataLocationSettings::MODULE),
        ];
        let inactive_modules: Vec<_> = supplied
            .into_iter()
            .filter(|(present, module)| *present && !self.config.is_active(module))
            .map(|(_, module)| module.name)
            .collect();
        for module in &inactive_modules {
            tracing::warn!(module = %module, "Settings loaded but required module is not active");
        }

        let repository_count = snapshot.repositories.len();
        let generation = self.state.replace(snapshot);
        tracing::info!(generation, repositories = repository_count, "Published settings");

        Ok(ReloadOutcome { generation, warnings, unknown_fields, inactive_modules })
    }
}

fn jdbc_sections(section: Option<&Value>) -> Result<Vec<&Value>> {
    match section {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(single @ Value::Object(_)) => Ok(vec![single]),
        Some(other) => Err(BindingError::TypeMismatch {
            field: JDBC_SECTION.to_owned(),
            expected: "list of repository sections".to_owned(),
            value: render(other),
        }
        .into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use casconf_model::{QueryType, ViolationKind, testutil};
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::{RegistryError, ReloadPolicy, UnknownFieldPolicy};

    fn active_config() -> RegistryConfig {
        RegistryConfig::builder()
            .active_modules(["cas-server-support-saml-idp".to_owned()].into())
            .build()
    }

    fn registry() -> SettingsRegistry {
        SettingsRegistry::new(active_config())
    }

    #[test]
    fn test_new_registry_publishes_defaults() {
        let registry = SettingsRegistry::default();
        assert_eq!(registry.generation(), 0);
        assert!(registry.repositories().is_empty());
        assert_eq!(registry.saml_metadata(), testutil::default_saml());
    }

    #[test]
    fn test_load_binds_every_section() {
        let registry = registry();
        let outcome = registry
            .load(&json!({
                "jdbc": [
                    testutil::relaxed_repository_document("people", 2),
                    { "id": "groups", "order": 1, "sql": testutil::SAMPLE_SQL },
                ],
                "saml-metadata": testutil::saml_document("file:/srv/saml"),
            }))
            .unwrap();

        assert_eq!(outcome.generation, 1);
        assert!(outcome.warnings.is_valid());
        assert!(outcome.unknown_fields.is_empty());
        assert!(outcome.inactive_modules.is_empty());

        let repositories = registry.repositories();
        let ids: Vec<_> = repositories.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, ["groups", "people"]);
        assert_eq!(repositories[1].query_type(), QueryType::Or);
        assert_eq!(registry.saml_metadata().location(), "file:/srv/saml");
    }

    #[test]
    fn test_single_jdbc_section_is_accepted() {
        let registry = registry();
        registry.load(&json!({ "jdbc": { "id": "people", "sql": testutil::SAMPLE_SQL } })).unwrap();
        assert_eq!(registry.snapshot().repositories().len(), 1);
    }

    #[rstest]
    #[case::null(json!(null))]
    #[case::empty(json!({}))]
    fn test_empty_document_publishes_defaults(#[case] document: Value) {
        let registry = registry();
        let outcome = registry.load(&document).unwrap();
        assert_eq!(outcome.generation, 1);
        assert_eq!(*registry.snapshot(), RegistrySnapshot::default());
    }

    #[test]
    fn test_binding_error_names_section_and_index() {
        let registry = registry();
        let err = registry
            .load(&json!({ "jdbc": [{ "sql": testutil::SAMPLE_SQL }, { "queryType": "XOR" }] }))
            .unwrap_err();

        let RegistryError::Binding(err) = err else { unreachable!("expected a binding error") };
        assert_eq!(err.field(), Some("jdbc[1].queryType"));
        assert_eq!(registry.generation(), 0);
    }

    #[rstest]
    #[case::root_scalar(json!("jdbc"), "<root>")]
    #[case::jdbc_scalar(json!({ "jdbc": 5 }), "jdbc")]
    #[case::saml_scalar(json!({ "samlMetadata": "/srv/saml" }), "samlMetadata")]
    fn test_shape_errors_name_section(#[case] document: Value, #[case] field: &str) {
        let err = registry().load(&document).unwrap_err();
        let RegistryError::Binding(err) = err else { unreachable!("expected a binding error") };
        assert_eq!(err.field(), Some(field));
    }

    #[rstest]
    #[case::number(json!(42))]
    #[case::string(json!("jdbc"))]
    #[case::list(json!([{ "id": "people" }]))]
    fn test_root_shape_error_matches_record_binding(#[case] document: Value) {
        let err = registry().load(&document).unwrap_err();
        let RegistryError::Binding(err) = err else { unreachable!("expected a binding error") };
        assert_eq!(err, SamlMetadataLocationSettings::bind_from(&document).unwrap_err());
        assert_eq!(err, BindingError::NotAnObject { field: ROOT_FIELD.to_owned(), value: render(&document) });
    }

    #[test]
    fn test_jdbc_scalar_renders_value() {
        let err = registry().load(&json!({ "jdbc": 5 })).unwrap_err();
        let RegistryError::Binding(BindingError::TypeMismatch { value, .. }) = err else {
            unreachable!("expected a type mismatch")
        };
        assert_eq!(value, "5");
    }

    #[test]
    fn test_invalid_load_keeps_previous_snapshot() {
        let registry = registry();
        registry.load(&json!({ "jdbc": [testutil::relaxed_repository_document("people", 0)] })).unwrap();
        let before = registry.snapshot();

        let err = registry
            .load(&json!({
                "jdbc": [{ "id": "eav", "singleRow": false }],
                "samlMetadata": { "location": "/srv/other" },
            }))
            .unwrap_err();

        let report = err.report().unwrap();
        assert_eq!(report.violations()[0].field(), "jdbc[0].columnMappings");
        assert_eq!(registry.generation(), 1);
        assert_eq!(registry.snapshot(), before);
        assert_eq!(registry.saml_metadata(), testutil::default_saml());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = registry()
            .load(&json!({
                "jdbc": [
                    { "id": "people", "sql": testutil::SAMPLE_SQL },
                    { "id": "people", "sql": testutil::SAMPLE_SQL, "order": 1 },
                ],
            }))
            .unwrap_err();
        let violation = &err.report().unwrap().violations()[0];
        assert_eq!(violation.field(), "jdbc[1].id");
        assert_eq!(violation.kind(), ViolationKind::Duplicate);
    }

    #[test]
    fn test_warn_only_publishes_with_warnings() {
        let config = RegistryConfig::builder().reload_policy(ReloadPolicy::WarnOnly).build();
        let registry = SettingsRegistry::new(config);
        let outcome = registry.load(&json!({ "samlMetadata": { "location": "" } })).unwrap();

        assert!(outcome.warnings.mentions("samlMetadata.location"));
        assert_eq!(outcome.inactive_modules, ["cas-server-support-saml-idp"]);
        assert_eq!(registry.saml_metadata().location(), "");
    }

    #[test]
    fn test_unknown_fields_are_collected_with_paths() {
        let outcome = registry()
            .load(&json!({
                "ldap": {},
                "jdbc": [{ "fetchSize": 5 }],
                "samlMetadata": { "watch": true },
            }))
            .unwrap();
        assert_eq!(outcome.unknown_fields, ["ldap", "jdbc[0].fetchSize", "samlMetadata.watch"]);
    }

    #[test]
    fn test_unknown_fields_rejected_when_strict() {
        let config = RegistryConfig::builder().unknown_fields(UnknownFieldPolicy::Reject).build();
        let registry = SettingsRegistry::new(config);
        let err = registry.load(&json!({ "ldap": {} })).unwrap_err();
        assert_eq!(err, RegistryError::UnknownFields { filter: ROOT_DOCUMENT, fields: vec!["ldap".into()] });
        assert_eq!(registry.generation(), 0);
    }

    #[test]
    fn test_export_redacts_passwords() {
        let registry = registry();
        registry.load(&json!({ "jdbc": [testutil::relaxed_repository_document("people", 0)] })).unwrap();

        let exported = registry.snapshot().export();
        assert_eq!(exported[JDBC_SECTION][0]["id"], "people");
        assert!(exported[JDBC_SECTION][0].get("password").is_none());
        assert_eq!(exported[SAML_SECTION]["location"], "file:/etc/cas/saml");
    }

    #[test]
    fn test_export_reloads_to_same_snapshot_without_secrets() {
        let registry = registry();
        registry
            .load(&json!({
                "jdbc": [testutil::single_row_repository("people", 0).to_document(None)],
            }))
            .unwrap();
        let exported = Value::Object(registry.snapshot().export());

        let other = SettingsRegistry::new(active_config());
        other.load(&exported).unwrap();
        assert_eq!(other.snapshot(), registry.snapshot());
    }
}
