//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `tao-dependency-resolver` command-line tool. Each subcommand is defined in
//! its own file.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args`, the loaded settings
//!   and the output configuration, and performs the command's logic.
//!
//! The helpers below build the remote adapters and run a resolution; they are
//! shared by `resolve` and `tree`.

pub mod completions;
pub mod map;
pub mod resolve;
pub mod tree;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::warn;

use tao_dependency_resolver::catalog::ExtensionCatalog;
use tao_dependency_resolver::config::Settings;
use tao_dependency_resolver::extension::{ExtensionRef, ExtensionSet};
use tao_dependency_resolver::github::GitHubSource;
use tao_dependency_resolver::repository::RepositoryManager;
use tao_dependency_resolver::repository_map::RepositoryMap;
use tao_dependency_resolver::resolver::{parse_branch_override, BranchOverrides, DependencyResolver};
use tao_dependency_resolver::store::DiskStore;

/// What to resolve, shared by `resolve` and `tree`.
#[derive(Args, Debug)]
pub struct ResolveInput {
    /// Root repository, as owner/repo (e.g. oat-sa/extension-tao-backoffice)
    #[arg(value_name = "REPOSITORY")]
    pub repository: String,

    /// Branch of the root repository [default: the configured default branch]
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Use BRANCH for EXTENSION instead of the default branch (repeatable)
    #[arg(
        short = 'e',
        long = "extension-branch",
        value_name = "EXTENSION=BRANCH",
        value_parser = parse_branch_override
    )]
    pub extension_branches: Vec<(String, String)>,

    /// Repository map to read [default: the configured repository map]
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,
}

/// A root and everything it depends on.
pub struct Resolution {
    pub root: ExtensionRef,
    pub extensions: ExtensionSet,
}

/// `RepositoryManager` reading from the configured GitHub API.
pub fn repository_manager(settings: &Settings) -> Result<RepositoryManager> {
    let source = GitHubSource::new(&settings.api_url, settings.github_token.clone())
        .with_context(|| format!("Invalid API URL {}", settings.api_url))?;
    Ok(RepositoryManager::with_source(Box::new(source)))
}

/// Read the repository map at `path`.
pub fn load_map(path: &std::path::Path) -> Result<RepositoryMap> {
    RepositoryMap::read(&DiskStore, path)
        .with_context(|| format!("Failed to read repository map {}", path.display()))
}

/// Run a resolution for `input`.
pub fn resolve(input: &ResolveInput, settings: &Settings) -> Result<Resolution> {
    let map_path = input
        .map
        .clone()
        .unwrap_or_else(|| settings.repository_map.clone());
    let map = load_map(&map_path)?;
    if map.is_empty() {
        warn!(
            "Repository map {} is empty; run `map refresh` and `map analyze` first",
            map_path.display()
        );
    }
    let catalog = ExtensionCatalog::from_map(&map);

    let repositories = repository_manager(settings)?;
    let resolver =
        DependencyResolver::new(&repositories, &catalog).with_settings(settings.resolver_settings());

    let root = resolver.root_for(&input.repository, input.branch.as_deref())?;
    let overrides: BranchOverrides = input.extension_branches.iter().cloned().collect();
    let extensions = resolver
        .resolve(&root, &overrides)
        .with_context(|| format!("Failed to resolve dependencies of {}", root))?;

    Ok(Resolution { root, extensions })
}
