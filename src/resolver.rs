//! # Dependency Resolution
//!
//! Starting from a root extension, the resolver reads each extension's
//! manifest, maps every required extension name to its repository through
//! the `ExtensionCatalog`, and recurses.
//!
//! ## Process
//!
//! 1. Fetch the manifest of the extension being visited. A manifest that
//!    does not exist means the extension requires nothing.
//! 2. Walk the declared dependency names in order. Names already in the
//!    result, and the root's own names, are skipped; this is what makes
//!    cycles terminate.
//! 3. Each new name gets its branch (an override, or the default branch) and
//!    its repository, is inserted, and is visited immediately.
//!
//! The result is in depth-first pre-order of first discovery and does not
//! include the root.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::catalog::ExtensionCatalog;
use crate::error::{Error, Result};
use crate::extension::{split_repository_id, ExtensionRef, ExtensionSet};
use crate::manifest::Manifest;
use crate::repository::RepositoryManager;

/// Per-extension branch overrides, keyed by extension name.
pub type BranchOverrides = HashMap<String, String>;

/// Parse one `EXTENSION=BRANCH` override.
pub fn parse_branch_override(value: &str) -> Result<(String, String)> {
    match value.split_once('=') {
        Some((name, branch)) if !name.trim().is_empty() && !branch.trim().is_empty() => {
            Ok((name.trim().to_string(), branch.trim().to_string()))
        }
        _ => Err(Error::InvalidBranchOverride {
            value: value.to_string(),
        }),
    }
}

/// Where manifests live and which branch to read when none is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub default_branch: String,
    pub manifest_file: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            default_branch: "develop".to_string(),
            manifest_file: "manifest.php".to_string(),
        }
    }
}

/// Resolves the transitive dependencies of an extension.
pub struct DependencyResolver<'a> {
    repositories: &'a RepositoryManager,
    catalog: &'a ExtensionCatalog,
    settings: ResolverSettings,
}

struct Walk<'o> {
    found: ExtensionSet,
    root_names: HashSet<String>,
    overrides: &'o BranchOverrides,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(repositories: &'a RepositoryManager, catalog: &'a ExtensionCatalog) -> Self {
        Self {
            repositories,
            catalog,
            settings: ResolverSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The root reference for `repository_id`, named after the extension the
    /// catalog maps to it, or after the repository when unmapped.
    pub fn root_for(&self, repository_id: &str, branch: Option<&str>) -> Result<ExtensionRef> {
        let (_, repository_name) = split_repository_id(repository_id)?;
        let name = self
            .catalog
            .extension_for(repository_id)
            .unwrap_or(repository_name);
        let branch = branch.unwrap_or(&self.settings.default_branch);
        ExtensionRef::new(name, repository_id, branch)
    }

    /// Every extension `root` depends on, directly or not.
    pub fn resolve(&self, root: &ExtensionRef, overrides: &BranchOverrides) -> Result<ExtensionSet> {
        let manifest = self.fetch_manifest(root)?;

        let mut root_names = HashSet::from([root.extension_name().to_string()]);
        if !manifest.extension_name.is_empty() {
            root_names.insert(manifest.extension_name.clone());
        }

        let mut walk = Walk {
            found: ExtensionSet::new(),
            root_names,
            overrides,
        };
        self.expand(root, manifest, &mut walk)?;
        Ok(walk.found)
    }

    fn visit(&self, extension: &ExtensionRef, walk: &mut Walk) -> Result<()> {
        let manifest = self.fetch_manifest(extension)?;
        self.expand(extension, manifest, walk)
    }

    fn expand(&self, parent: &ExtensionRef, manifest: Manifest, walk: &mut Walk) -> Result<()> {
        for name in manifest.dependency_names {
            if walk.found.contains(&name) || walk.root_names.contains(&name) {
                continue;
            }

            let repository = self
                .catalog
                .lookup(&name)
                .ok_or_else(|| Error::UnmappedExtension {
                    name: name.clone(),
                    required_by: format!("{}@{}", parent.repository_id(), parent.branch_name()),
                })?;
            let branch = walk
                .overrides
                .get(&name)
                .unwrap_or(&self.settings.default_branch);

            let extension = ExtensionRef::new(name, repository, branch.as_str())?;
            walk.found
                .insert(extension.clone(), parent.extension_name());
            self.visit(&extension, walk)?;
        }
        Ok(())
    }

    fn fetch_manifest(&self, extension: &ExtensionRef) -> Result<Manifest> {
        debug!("Visiting {}", extension);
        let origin = format!("{}@{}", extension.repository_id(), extension.branch_name());
        match self.repositories.read_file(
            extension.owner(),
            extension.repository_name(),
            extension.branch_name(),
            &self.settings.manifest_file,
        )? {
            Some(text) => Manifest::parse_named(&text, &origin),
            None => {
                warn!(
                    "No {} in {}; assuming no dependencies",
                    self.settings.manifest_file, origin
                );
                Ok(Manifest::default())
            }
        }
    }
}
