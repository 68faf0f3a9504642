//! The ordered chain of relational attribute repositories.

use std::collections::BTreeMap;

use casconf_model::{JdbcAttributeRepositorySettings, ValidationReport, ViolationKind};

/// Repositories in registration order, with lookup by `order` and `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryChain {
    repositories: Vec<JdbcAttributeRepositorySettings>,
}

impl RepositoryChain {
    /// Creates a chain from repositories in registration order.
    #[must_use]
    pub fn new(repositories: Vec<JdbcAttributeRepositorySettings>) -> Self {
        Self { repositories }
    }

    /// Returns the repositories sorted by `order`.
    ///
    /// Repositories with equal `order` keep their registration order.
    #[must_use]
    pub fn ordered(&self) -> Vec<&JdbcAttributeRepositorySettings> {
        let mut ordered: Vec<_> = self.repositories.iter().collect();
        ordered.sort_by_key(|repository| repository.order());
        ordered
    }

    /// Returns the repositories in registration order.
    #[must_use]
    pub fn registered(&self) -> &[JdbcAttributeRepositorySettings] {
        &self.repositories
    }

    /// Returns the first repository registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&JdbcAttributeRepositorySettings> {
        self.repositories.iter().find(|repository| repository.id() == Some(id))
    }

    /// Returns the number of repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    /// Returns `true` when no repository is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Validates every repository, anchoring violations at `jdbc[i]`, then
    /// flags repeated ids.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for (i, repository) in self.repositories.iter().enumerate() {
            report.extend(crate::handle::validate(repository).prefixed(&format!("jdbc[{i}]")));
        }

        let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, repository) in self.repositories.iter().enumerate() {
            let Some(id) = repository.id().map(str::trim).filter(|id| !id.is_empty()) else {
                continue;
            };
            if let Some(first) = first_seen.get(id) {
                report.push(
                    format!("jdbc[{i}].id"),
                    ViolationKind::Duplicate,
                    format!("'{id}' is already used by jdbc[{first}]"),
                );
            } else {
                first_seen.insert(id, i);
            }
        }

        report
    }
}

impl FromIterator<JdbcAttributeRepositorySettings> for RepositoryChain {
    fn from_iter<I: IntoIterator<Item = JdbcAttributeRepositorySettings>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
