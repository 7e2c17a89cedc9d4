//! Populating the repository map from the hosted service and the package
//! registry.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{BranchRecord, FileRecord, RepositoryMap, RepositoryRecord, CANONICAL_BRANCHES, NOT_FOUND};
use crate::composer::ComposerFile;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::repository::{BranchLookup, PackageRegistry, RepositoryManager};
use crate::store::FileStore;

/// Repositories requested per listing page.
pub const PAGE_SIZE: usize = 100;

/// Names of the two files analysis reads on each branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFiles {
    pub manifest: String,
    pub composer: String,
}

impl Default for TrackedFiles {
    fn default() -> Self {
        Self {
            manifest: "manifest.php".to_string(),
            composer: "composer.json".to_string(),
        }
    }
}

/// Outcome of an analysis batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub analyzed: usize,
    /// Records met during the batch that had already been analyzed.
    pub skipped: usize,
}

/// Reads the persisted map, updates it from remote services and writes it
/// back whole.
pub struct RepositoryMapUpdater<'a> {
    repositories: &'a RepositoryManager,
    registry: &'a dyn PackageRegistry,
    store: &'a dyn FileStore,
    map_path: PathBuf,
    files: TrackedFiles,
}

impl<'a> RepositoryMapUpdater<'a> {
    pub fn new(
        repositories: &'a RepositoryManager,
        registry: &'a dyn PackageRegistry,
        store: &'a dyn FileStore,
        map_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repositories,
            registry,
            store,
            map_path: map_path.into(),
            files: TrackedFiles::default(),
        }
    }

    pub fn with_tracked_files(mut self, files: TrackedFiles) -> Self {
        self.files = files;
        self
    }

    pub fn map_path(&self) -> &Path {
        &self.map_path
    }

    /// Add every repository of `owner` not yet in the map and flag those
    /// published on the package registry. Returns how many were added.
    pub fn refresh_list(&self, owner: &str) -> Result<usize> {
        let mut map = RepositoryMap::read(self.store, &self.map_path)?;
        let previous = map.len();

        let mut page = 1;
        loop {
            let listing = self
                .repositories
                .source()
                .list_repositories(owner, page, PAGE_SIZE)?;
            let page_len = listing.len();
            debug!("Page {} of {} listed {} repositories", page, owner, page_len);
            for repository in listing {
                map.insert_new(RepositoryRecord::discovered(owner, repository));
            }
            if page_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        let packages = self.registry.list_packages(owner)?;
        let mut published = 0;
        for package in &packages {
            if let Some(record) = map.find_mut_ignore_case(package) {
                record.on_package_registry = true;
                published += 1;
            }
        }
        debug!("{} of {} registry packages matched a repository", published, packages.len());

        map.write(self.store, &self.map_path)?;
        let added = map.len() - previous;
        info!("Added {} repositories of {} to the map", added, owner);
        Ok(added)
    }

    /// Analyze every record whose extension name is still unknown, at most
    /// `limit` of them when `limit > 0`.
    pub fn analyze_outstanding(&self, limit: usize) -> Result<AnalysisReport> {
        self.analyze_outstanding_with(limit, |_| {})
    }

    /// Like `analyze_outstanding`, calling `on_analyze` with each repository
    /// identifier before it is analyzed.
    pub fn analyze_outstanding_with<F>(&self, limit: usize, mut on_analyze: F) -> Result<AnalysisReport>
    where
        F: FnMut(&str),
    {
        let mut map = RepositoryMap::read(self.store, &self.map_path)?;
        let ids: Vec<String> = map.iter().map(RepositoryRecord::id).collect();
        let mut report = AnalysisReport::default();

        for id in ids {
            if limit > 0 && report.analyzed >= limit {
                break;
            }
            let Some(record) = map.get_mut(&id) else {
                continue;
            };
            if record.is_analyzed() {
                report.skipped += 1;
                continue;
            }

            on_analyze(&id);
            self.analyze(record).map_err(|e| Error::AnalysisAborted {
                repository: id.clone(),
                analyzed: report.analyzed,
                source: Box::new(e),
            })?;
            info!("Analyzed {}: {}", id, record.extension_name);
            report.analyzed += 1;
        }

        map.write(self.store, &self.map_path)?;
        Ok(report)
    }

    /// Fill in the branches, extension name and composer package name of
    /// one record.
    pub fn analyze(&self, record: &mut RepositoryRecord) -> Result<()> {
        for branch in candidate_branches(&record.default_branch) {
            match self
                .repositories
                .lookup_branch(&record.owner, &record.name, &branch)?
            {
                BranchLookup::Found(reference) => {
                    let analyzed = self.analyze_branch(record, &branch, &reference)?;
                    record.branches.insert(branch, analyzed);
                }
                BranchLookup::Missing => {
                    debug!("{} has no {} branch", record.id(), branch);
                }
                BranchLookup::EmptyRepository => {
                    debug!("{} is empty", record.id());
                    break;
                }
            }
        }

        let files = in_precedence_order(record, &self.files.manifest);
        let extension_name = first_non_empty(&files, |file| &file.extension_name)
            .unwrap_or_else(|| NOT_FOUND.to_string());
        let composer_package_name =
            first_non_empty(&files, |file| &file.composer_package_name).unwrap_or_default();
        record.extension_name = extension_name;
        record.composer_package_name = composer_package_name;
        Ok(())
    }

    fn analyze_branch(&self, record: &RepositoryRecord, branch: &str, reference: &str) -> Result<BranchRecord> {
        let mut analyzed = BranchRecord::new(branch);

        let manifest_name = &self.files.manifest;
        if let Some(text) = self
            .repositories
            .read_file(&record.owner, &record.name, reference, manifest_name)?
        {
            let origin = format!("{}@{}:{}", record.id(), branch, manifest_name);
            let file = match Manifest::parse_named(&text, &origin) {
                Ok(manifest) => FileRecord {
                    name: manifest_name.clone(),
                    extension_name: manifest.extension_name,
                    requires: manifest.dependency_names,
                    ..FileRecord::default()
                },
                Err(e) => {
                    warn!("{}", e);
                    FileRecord::empty(manifest_name.as_str())
                }
            };
            analyzed.add_file(file);
        }

        let composer_name = &self.files.composer;
        if let Some(text) = self
            .repositories
            .read_file(&record.owner, &record.name, reference, composer_name)?
        {
            let file = match ComposerFile::parse(&text) {
                Ok(composer) => FileRecord {
                    name: composer_name.clone(),
                    composer_package_name: composer.package_name().to_string(),
                    extension_name: composer.extension_name().to_string(),
                    requires: composer.requires_from(&record.owner),
                },
                Err(e) => {
                    warn!("Invalid {} in {}@{}: {}", composer_name, record.id(), branch, e);
                    FileRecord::empty(composer_name.as_str())
                }
            };
            analyzed.add_file(file);
        }

        Ok(analyzed)
    }
}

/// develop, master, then the default branch when it is neither.
fn candidate_branches(default_branch: &str) -> Vec<String> {
    let mut branches: Vec<String> = CANONICAL_BRANCHES.iter().map(|b| b.to_string()).collect();
    if !default_branch.is_empty() && !CANONICAL_BRANCHES.contains(&default_branch) {
        branches.push(default_branch.to_string());
    }
    branches
}

/// Default branch first, then develop, master and the rest; manifest before
/// composer file within a branch.
fn in_precedence_order<'r>(record: &'r RepositoryRecord, manifest_name: &str) -> Vec<&'r FileRecord> {
    let mut branches: Vec<&BranchRecord> = Vec::new();
    if let Some(default) = record.branches.get(&record.default_branch) {
        branches.push(default);
    }
    branches.extend(
        record
            .ordered_branches()
            .into_iter()
            .filter(|branch| branch.name != record.default_branch),
    );

    branches
        .into_iter()
        .flat_map(|branch| {
            let mut files: Vec<&FileRecord> = branch.files.values().collect();
            files.sort_by_key(|file| file.name != manifest_name);
            files
        })
        .collect()
}

fn first_non_empty<F>(files: &[&FileRecord], field: F) -> Option<String>
where
    F: Fn(&FileRecord) -> &String,
{
    files
        .iter()
        .map(|file| field(file))
        .find(|value| !value.is_empty())
        .cloned()
}
