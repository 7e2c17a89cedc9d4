//! # Repository Access
//!
//! This module defines how the rest of the crate talks to hosted
//! repositories and to the package registry, and provides
//! `RepositoryManager`, a thin layer that turns the expected "not there"
//! answers of a source into plain values.
//!
//! ## Design
//!
//! Access is split across two traits so that both can be replaced in tests:
//!
//! - **`RepositorySource`**: branch lookup, file retrieval, repository
//!   listing and organization metadata on a hosted git service. The
//!   production implementation is `crate::github::GitHubSource`.
//!
//! - **`PackageRegistry`**: the list of packages a vendor publishes on a
//!   public registry. The production implementation is
//!   `crate::packagist::Packagist`.
//!
//! Sources report absence through dedicated error variants
//! (`BranchNotFound`, `EmptyRepository`, `FileNotFound`) so that callers can
//! tell a confirmed absence apart from a failed request.

use log::debug;

use crate::error::{Error, Result};

/// Repository counts for an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizationInfo {
    pub public_repo_count: usize,
    pub private_repo_count: usize,
}

impl OrganizationInfo {
    pub fn total(&self) -> usize {
        self.public_repo_count + self.private_repo_count
    }
}

/// One entry of an organization's repository listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub name: String,
    pub is_private: bool,
    pub default_branch: String,
}

/// Read access to a hosted git service.
pub trait RepositorySource {
    /// Public and private repository counts of `owner`.
    fn organization_info(&self, owner: &str) -> Result<OrganizationInfo>;

    /// One page (1-based) of `owner`'s repositories.
    fn list_repositories(
        &self,
        owner: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<RemoteRepository>>;

    /// Resolve a branch to an opaque reference usable with `file_content`.
    ///
    /// Fails with `BranchNotFound` or `EmptyRepository` when the branch
    /// cannot exist.
    fn branch_reference(&self, owner: &str, repo: &str, branch: &str) -> Result<String>;

    /// Content of `filename` at `reference` (a branch name or a reference
    /// returned by `branch_reference`). Fails with `FileNotFound` when absent.
    fn file_content(&self, owner: &str, repo: &str, reference: &str, filename: &str)
        -> Result<String>;
}

/// Read access to a public package registry.
pub trait PackageRegistry {
    /// Every package name published under `vendor`.
    fn list_packages(&self, vendor: &str) -> Result<Vec<String>>;
}

/// Outcome of asking whether a branch exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchLookup {
    /// The branch exists; carries the reference to read files at.
    Found(String),
    /// The repository has commits but not this branch.
    Missing,
    /// The repository has no commits at all.
    EmptyRepository,
}

/// The main entry point for reading repositories.
///
/// Wraps a `RepositorySource` and converts confirmed absences into `Option`
/// or `BranchLookup` values, leaving only real failures as errors.
pub struct RepositoryManager {
    source: Box<dyn RepositorySource>,
}

impl RepositoryManager {
    /// Creates a `RepositoryManager` reading through `source`.
    pub fn with_source(source: Box<dyn RepositorySource>) -> Self {
        Self { source }
    }

    /// The underlying source, for operations that need no translation.
    pub fn source(&self) -> &dyn RepositorySource {
        self.source.as_ref()
    }

    /// Reads a file, returning `None` when the source confirms it is absent.
    pub fn read_file(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        filename: &str,
    ) -> Result<Option<String>> {
        match self.source.file_content(owner, repo, reference, filename) {
            Ok(content) => Ok(Some(content)),
            Err(Error::FileNotFound { .. }) => {
                debug!("{} not found in {}/{}@{}", filename, owner, repo, reference);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Checks whether `branch` exists in `owner/repo`.
    pub fn lookup_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<BranchLookup> {
        match self.source.branch_reference(owner, repo, branch) {
            Ok(reference) => Ok(BranchLookup::Found(reference)),
            Err(Error::BranchNotFound { .. }) => Ok(BranchLookup::Missing),
            Err(Error::EmptyRepository { .. }) => Ok(BranchLookup::EmptyRepository),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory `RepositorySource` and `PackageRegistry` for unit tests.

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// Mock source backed by maps, recording every file request.
    #[derive(Default)]
    pub struct MockSource {
        /// `owner/repo@branch:filename` -> content
        pub files: HashMap<String, String>,
        /// `owner/repo@branch` that exist
        pub branches: HashSet<String>,
        /// `owner/repo` without any commit
        pub empty: HashSet<String>,
        /// owner -> listing
        pub repositories: HashMap<String, Vec<RemoteRepository>>,
        /// `owner/repo` whose requests fail with a network error
        pub failing: HashSet<String>,
        pub file_calls: Arc<Mutex<Vec<String>>>,
        pub page_calls: Arc<Mutex<Vec<(usize, usize)>>>,
    }

    impl MockSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a branch holding a manifest with the given name and requires.
        pub fn with_manifest(self, repository: &str, branch: &str, name: &str, requires: &[&str]) -> Self {
            let requires = requires
                .iter()
                .map(|dependency| format!("'{}' => '*'", dependency))
                .collect::<Vec<_>>()
                .join(", ");
            let content = format!(
                "<?php\nreturn array(\n    'name' => '{}',\n    'requires' => array({}),\n);\n",
                name, requires
            );
            self.with_file(repository, branch, "manifest.php", &content)
        }

        pub fn with_file(mut self, repository: &str, branch: &str, filename: &str, content: &str) -> Self {
            self.branches.insert(format!("{}@{}", repository, branch));
            self.files
                .insert(format!("{}@{}:{}", repository, branch, filename), content.to_string());
            self
        }

        pub fn with_branch(mut self, repository: &str, branch: &str) -> Self {
            self.branches.insert(format!("{}@{}", repository, branch));
            self
        }

        pub fn with_empty(mut self, repository: &str) -> Self {
            self.empty.insert(repository.to_string());
            self
        }

        pub fn with_failing(mut self, repository: &str) -> Self {
            self.failing.insert(repository.to_string());
            self
        }

        pub fn with_repositories(mut self, owner: &str, names: &[&str]) -> Self {
            let listing = names
                .iter()
                .map(|name| RemoteRepository {
                    name: name.to_string(),
                    is_private: false,
                    default_branch: "develop".to_string(),
                })
                .collect();
            self.repositories.insert(owner.to_string(), listing);
            self
        }

        fn check_failing(&self, repository: &str) -> Result<()> {
            if self.failing.contains(repository) {
                return Err(Error::Network {
                    url: format!("mock://{}", repository),
                    message: "connection reset".to_string(),
                });
            }
            Ok(())
        }
    }

    impl RepositorySource for MockSource {
        fn organization_info(&self, owner: &str) -> Result<OrganizationInfo> {
            let listing = self.repositories.get(owner).cloned().unwrap_or_default();
            let private = listing.iter().filter(|r| r.is_private).count();
            Ok(OrganizationInfo {
                public_repo_count: listing.len() - private,
                private_repo_count: private,
            })
        }

        fn list_repositories(
            &self,
            owner: &str,
            page: usize,
            page_size: usize,
        ) -> Result<Vec<RemoteRepository>> {
            self.page_calls.lock().unwrap().push((page, page_size));
            let listing = self.repositories.get(owner).cloned().unwrap_or_default();
            Ok(listing
                .into_iter()
                .skip((page - 1) * page_size)
                .take(page_size)
                .collect())
        }

        fn branch_reference(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
            let repository = format!("{}/{}", owner, repo);
            self.check_failing(&repository)?;
            if self.empty.contains(&repository) {
                return Err(Error::EmptyRepository { repository });
            }
            if self.branches.contains(&format!("{}@{}", repository, branch)) {
                Ok(branch.to_string())
            } else {
                Err(Error::BranchNotFound {
                    repository,
                    branch: branch.to_string(),
                })
            }
        }

        fn file_content(
            &self,
            owner: &str,
            repo: &str,
            reference: &str,
            filename: &str,
        ) -> Result<String> {
            let repository = format!("{}/{}", owner, repo);
            self.check_failing(&repository)?;
            let key = format!("{}@{}:{}", repository, reference, filename);
            self.file_calls.lock().unwrap().push(key.clone());
            self.files.get(&key).cloned().ok_or(Error::FileNotFound {
                repository,
                branch: reference.to_string(),
                path: filename.to_string(),
            })
        }
    }

    /// Mock registry returning a fixed package list.
    #[derive(Default)]
    pub struct MockRegistry {
        pub packages: Vec<String>,
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockRegistry {
        pub fn with_packages(packages: &[&str]) -> Self {
            Self {
                packages: packages.iter().map(|p| p.to_string()).collect(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl PackageRegistry for MockRegistry {
        fn list_packages(&self, vendor: &str) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push(vendor.to_string());
            Ok(self
                .packages
                .iter()
                .filter(|package| package.starts_with(&format!("{}/", vendor)))
                .cloned()
                .collect())
        }
    }
}
