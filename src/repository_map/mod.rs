//! # Repository Map
//!
//! The repository map is the offline cache of everything known about an
//! organization's repositories: privacy, default branch, the extension name
//! each repository declares, its composer package name, whether it is
//! published on the package registry, and the per-branch content of the two
//! tracked files.
//!
//! The map is persisted as a single JSON object keyed by `owner/name`. It is
//! always read whole, mutated in memory and written back whole; the stored
//! key order is preserved across a read/write cycle.
//!
//! ## Lifecycle of a record
//!
//! 1. Created with blank analysis fields by `RepositoryMapUpdater::refresh_list`.
//! 2. Filled in by `RepositoryMapUpdater::analyze_outstanding`. A repository
//!    where no extension name could be found gets [`NOT_FOUND`] so that it is
//!    not analyzed again.
//! 3. Never deleted.

pub mod csv;
pub mod updater;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::repository::RemoteRepository;
use crate::store::FileStore;

pub use updater::{AnalysisReport, RepositoryMapUpdater, TrackedFiles};

/// Extension name stored when analysis ran but found no declared name.
pub const NOT_FOUND: &str = "__NOT_FOUND__";

/// Branches every repository is checked for, in order.
pub const CANONICAL_BRANCHES: [&str; 2] = ["develop", "master"];

/// Declarative data read from one tracked file on one branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileRecord {
    pub name: String,
    pub composer_package_name: String,
    pub extension_name: String,
    pub requires: Vec<String>,
}

impl FileRecord {
    /// A record for a file that exists but yielded nothing.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Tracked files found on one branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BranchRecord {
    pub name: String,
    pub files: BTreeMap<String, FileRecord>,
}

impl BranchRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn file(&self, filename: &str) -> Option<&FileRecord> {
        self.files.get(filename)
    }

    pub fn add_file(&mut self, file: FileRecord) {
        self.files.insert(file.name.clone(), file);
    }
}

/// Everything known about one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepositoryRecord {
    pub owner: String,
    pub name: String,
    pub is_private: bool,
    pub default_branch: String,
    pub extension_name: String,
    pub composer_package_name: String,
    pub on_package_registry: bool,
    pub branches: BTreeMap<String, BranchRecord>,
}

impl RepositoryRecord {
    /// A freshly listed repository, not analyzed yet.
    pub fn discovered(owner: &str, repository: RemoteRepository) -> Self {
        Self {
            owner: owner.to_string(),
            name: repository.name,
            is_private: repository.is_private,
            default_branch: repository.default_branch,
            ..Self::default()
        }
    }

    /// `owner/name`
    pub fn id(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Whether the analysis procedure has run for this repository.
    pub fn is_analyzed(&self) -> bool {
        !self.extension_name.is_empty()
    }

    /// The declared extension name, if analysis found one.
    pub fn declared_extension(&self) -> Option<&str> {
        match self.extension_name.as_str() {
            "" | NOT_FOUND => None,
            name => Some(name),
        }
    }

    /// Analyzed branches in canonical order: develop, master, then the rest
    /// by name.
    pub fn ordered_branches(&self) -> Vec<&BranchRecord> {
        let mut ordered: Vec<&BranchRecord> = CANONICAL_BRANCHES
            .iter()
            .filter_map(|name| self.branches.get(*name))
            .collect();
        ordered.extend(
            self.branches
                .iter()
                .filter(|(name, _)| !CANONICAL_BRANCHES.contains(&name.as_str()))
                .map(|(_, branch)| branch),
        );
        ordered
    }
}

/// Aggregate counts over a map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapSummary {
    pub total: usize,
    pub analyzed: usize,
    pub with_extension: usize,
    pub not_found: usize,
    pub private: usize,
    pub on_package_registry: usize,
}

/// Ordered table of repository records keyed by `owner/name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryMap {
    records: Vec<RepositoryRecord>,
    index: HashMap<String, usize>,
}

impl RepositoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the map persisted at `path`; a missing file is an empty map.
    pub fn read(store: &dyn FileStore, path: &Path) -> Result<Self> {
        let Some(content) = store.read(path)? else {
            return Ok(Self::new());
        };
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        Self::from_json(&content).map_err(|e| Error::RepositoryMapParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Persist the whole map to `path`.
    pub fn write(&self, store: &dyn FileStore, path: &Path) -> Result<()> {
        store.write(path, &self.to_json()?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add `record` unless its id is already present. Existing records are
    /// never overwritten.
    pub fn insert_new(&mut self, record: RepositoryRecord) -> bool {
        let id = record.id();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, id: &str) -> Option<&RepositoryRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut RepositoryRecord> {
        self.index
            .get(id)
            .map(|&position| &mut self.records[position])
    }

    /// Look a record up ignoring ASCII case, as registry names are lowercase.
    pub fn find_mut_ignore_case(&mut self, id: &str) -> Option<&mut RepositoryRecord> {
        if let Some(&position) = self.index.get(id) {
            return Some(&mut self.records[position]);
        }
        self.records
            .iter_mut()
            .find(|record| record.id().eq_ignore_ascii_case(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Records in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &RepositoryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> MapSummary {
        self.records.iter().fold(
            MapSummary {
                total: self.records.len(),
                ..MapSummary::default()
            },
            |mut summary, record| {
                if record.is_analyzed() {
                    summary.analyzed += 1;
                }
                if record.declared_extension().is_some() {
                    summary.with_extension += 1;
                }
                if record.extension_name == NOT_FOUND {
                    summary.not_found += 1;
                }
                if record.is_private {
                    summary.private += 1;
                }
                if record.on_package_registry {
                    summary.on_package_registry += 1;
                }
                summary
            },
        )
    }
}

impl Serialize for RepositoryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.id(), record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RepositoryMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = RepositoryMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of repository records keyed by owner/name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut map = RepositoryMap::new();
                while let Some((key, record)) = access.next_entry::<String, RepositoryRecord>()? {
                    if record.id() != key {
                        return Err(serde::de::Error::custom(format!(
                            "key {} does not match record {}",
                            key,
                            record.id()
                        )));
                    }
                    if !map.insert_new(record) {
                        return Err(serde::de::Error::custom(format!("duplicate repository {}", key)));
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}
