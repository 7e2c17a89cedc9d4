//! Extension name to repository lookup, derived from the repository map.

use std::collections::HashMap;

use log::warn;

use crate::repository_map::RepositoryMap;

/// Read-only `extension name -> owner/repo` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionCatalog {
    repositories: HashMap<String, String>,
}

impl ExtensionCatalog {
    /// Every record declaring an extension name contributes one entry. When
    /// two repositories declare the same name the later record wins.
    pub fn from_map(map: &RepositoryMap) -> Self {
        Self::from_pairs(map.iter().filter_map(|record| {
            record
                .declared_extension()
                .map(|name| (name.to_string(), record.id()))
        }))
    }

    pub fn from_pairs<I, N, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, R)>,
        N: Into<String>,
        R: Into<String>,
    {
        let mut repositories = HashMap::new();
        for (name, repository) in pairs {
            let name = name.into();
            let repository = repository.into();
            if let Some(previous) = repositories.insert(name.clone(), repository.clone()) {
                if previous != repository {
                    warn!(
                        "Extension {} is declared by both {} and {}; using {}",
                        name, previous, repository, repository
                    );
                }
            }
        }
        Self { repositories }
    }

    /// Repository hosting `extension_name`.
    pub fn lookup(&self, extension_name: &str) -> Option<&str> {
        self.repositories.get(extension_name).map(String::as_str)
    }

    /// Extension hosted by `repository_id`, if the catalog knows one.
    pub fn extension_for(&self, repository_id: &str) -> Option<&str> {
        let mut names: Vec<&str> = self
            .repositories
            .iter()
            .filter(|(_, repository)| repository.as_str() == repository_id)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names.first().copied()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}
