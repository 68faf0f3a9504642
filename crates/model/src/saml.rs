//! File-system location of SAML metadata and key material.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    schema::{FieldKind, FieldSpec, ModuleRequirement, Settings},
    validation::{ValidationReport, ViolationKind},
};

/// Default metadata directory.
pub const DEFAULT_LOCATION: &str = "file:/etc/cas/saml";

const FILE_SCHEME: &str = "file";

const SAML_FIELDS: &[FieldSpec] = &[FieldSpec::new(
    "location",
    FieldKind::String,
    "Directory holding SAML metadata and signing/encryption keys.",
)
.required()];

/// Where the SAML metadata engine keeps metadata and signing/encryption keys.
///
/// Serialized under the filter name `FileSystemSamlMetadataProperties`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default, rename_all = "camelCase")]
pub struct SamlMetadataLocationSettings {
    #[builder(into, default = DEFAULT_LOCATION.to_owned())]
    pub(crate) location: String,
}

impl Default for SamlMetadataLocationSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SamlMetadataLocationSettings {
    /// Returns the configured location as written.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Resolves the location to a directory path.
    ///
    /// Accepts `file:/dir`, `file:///dir` and bare paths. Returns `None` for
    /// blank locations and non-`file` schemes. The filesystem is not touched.
    #[must_use]
    pub fn directory(&self) -> Option<PathBuf> {
        let location = self.location.trim();
        if location.is_empty() {
            return None;
        }
        match scheme(location) {
            None => Some(PathBuf::from(location)),
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case(FILE_SCHEME) => {
                let path = rest.strip_prefix("//").unwrap_or(rest);
                (!path.is_empty()).then(|| PathBuf::from(path))
            },
            Some(_) => None,
        }
    }
}

/// Splits a URI scheme off `location`.
///
/// Single-letter prefixes are treated as drive letters, not schemes.
fn scheme(location: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = location.split_once(':')?;
    let is_scheme = scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    is_scheme.then_some((scheme, rest))
}

impl Settings for SamlMetadataLocationSettings {
    const FILTER_NAME: &'static str = "FileSystemSamlMetadataProperties";
    const MODULE: ModuleRequirement = ModuleRequirement::new("cas-server-support-saml-idp", false);

    fn fields() -> Vec<&'static FieldSpec> {
        SAML_FIELDS.iter().collect()
    }

    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let location = self.location.trim();

        if location.is_empty() {
            report.push("location", ViolationKind::Required, "must not be blank");
        } else if let Some((scheme, _)) = scheme(location) {
            if !scheme.eq_ignore_ascii_case(FILE_SCHEME) {
                report.push(
                    "location",
                    ViolationKind::Unsupported,
                    format!("expected a file: location, found scheme '{scheme}'"),
                );
            } else if self.directory().is_none() {
                report.push("location", ViolationKind::Malformed, "file: location has no path");
            }
        }

        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::FieldFilter;

    #[test]
    fn test_absent_location_takes_default() {
        let settings = SamlMetadataLocationSettings::bind_from(&json!({})).unwrap();
        assert_eq!(settings.location(), "file:/etc/cas/saml");
        assert_eq!(settings, SamlMetadataLocationSettings::load_defaults());
    }

    #[test]
    fn test_null_location_takes_default() {
        let settings = SamlMetadataLocationSettings::bind_from(&json!({ "location": null })).unwrap();
        assert_eq!(settings.location(), DEFAULT_LOCATION);
    }

    #[test]
    fn test_defaults_round_trip() {
        let defaults = SamlMetadataLocationSettings::load_defaults();
        let document = serde_json::Value::Object(defaults.to_document(None));
        assert_eq!(SamlMetadataLocationSettings::bind_from(&document).unwrap(), defaults);
    }

    #[rstest]
    #[case::single_slash("file:/etc/cas/saml", Some("/etc/cas/saml"))]
    #[case::triple_slash("file:///srv/saml", Some("/srv/saml"))]
    #[case::upper_scheme("FILE:/srv/saml", Some("/srv/saml"))]
    #[case::bare("/opt/saml", Some("/opt/saml"))]
    #[case::drive_letter("C:/saml", Some("C:/saml"))]
    #[case::remote("https://example.org/saml", None)]
    #[case::empty_path("file:", None)]
    #[case::blank("  ", None)]
    fn test_directory(#[case] location: &str, #[case] expected: Option<&str>) {
        let settings = SamlMetadataLocationSettings::builder().location(location).build();
        assert_eq!(settings.directory().as_deref(), expected.map(Path::new));
    }

    #[rstest]
    #[case::default(DEFAULT_LOCATION, None)]
    #[case::bare("/opt/saml", None)]
    #[case::blank("", Some(ViolationKind::Required))]
    #[case::remote("classpath:saml", Some(ViolationKind::Unsupported))]
    #[case::no_path("file:", Some(ViolationKind::Malformed))]
    fn test_validate(#[case] location: &str, #[case] expected: Option<ViolationKind>) {
        let report = SamlMetadataLocationSettings::builder().location(location).build().validate();
        assert_eq!(report.violations().first().map(|v| v.kind()), expected);
        assert!(report.len() <= 1);
    }

    #[test]
    fn test_location_must_be_string() {
        let err = SamlMetadataLocationSettings::bind_from(&json!({ "location": { "path": "/x" } }))
            .unwrap_err();
        assert_eq!(err.field(), Some("location"));
    }

    #[test]
    fn test_schema_marks_location_required() {
        let schema = SamlMetadataLocationSettings::describe();
        assert_eq!(schema.filter_name, "FileSystemSamlMetadataProperties");
        assert_eq!(schema.module.name, "cas-server-support-saml-idp");
        assert!(!schema.module.automated);
        assert_eq!(schema.fields.len(), 1);
        assert!(schema.fields[0].required);
        assert_eq!(schema.fields[0].default_value, Some(json!(DEFAULT_LOCATION)));
    }

    #[test]
    fn test_filter_can_hide_location() {
        let document = SamlMetadataLocationSettings::default()
            .to_document(Some(&FieldFilter::only(Vec::<String>::new())));
        assert!(document.is_empty());
    }
}
