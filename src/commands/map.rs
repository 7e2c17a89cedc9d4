//! # Map Command Implementation
//!
//! This module implements the `map` subcommand and its actions on the
//! repository map:
//!
//! - **`refresh`**: list the organization's repositories and add new ones.
//! - **`analyze`**: read manifests and composer files of repositories not
//!   analyzed yet.
//! - **`info`**: summarize the map.
//! - **`export-csv`**: write a CSV report of the map.
//!
//! `info` and `export-csv` work offline on the persisted map.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use super::{load_map, repository_manager};
use tao_dependency_resolver::config::Settings;
use tao_dependency_resolver::output::{OutputConfig, Status};
use tao_dependency_resolver::packagist::Packagist;
use tao_dependency_resolver::repository_map::{csv, MapSummary, RepositoryMapUpdater};
use tao_dependency_resolver::store::{DiskStore, FileStore};

/// Maintain the repository map
#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(subcommand)]
    pub command: MapCommand,

    /// Repository map file [default: the configured repository map]
    #[arg(long, global = true, value_name = "FILE")]
    pub map: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum MapCommand {
    /// Add repositories of the organization that are not in the map yet
    Refresh {
        /// Organization to list [default: the configured organization]
        #[arg(long, value_name = "OWNER")]
        owner: Option<String>,
    },

    /// Analyze repositories whose extension name is still unknown
    Analyze {
        /// Stop after analyzing NUM repositories (0 means no limit)
        #[arg(long, value_name = "NUM", default_value_t = 0)]
        limit: usize,
    },

    /// Show counts of mapped, analyzed and published repositories
    Info,

    /// Export the map as CSV
    ExportCsv {
        /// Write the report to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Execute the `map` command.
pub fn execute(args: MapArgs, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let map_path = args
        .map
        .unwrap_or_else(|| settings.repository_map.clone());

    match args.command {
        MapCommand::Refresh { owner } => {
            let owner = owner.unwrap_or_else(|| settings.organization.clone());
            refresh(&owner, &map_path, settings, output)
        }
        MapCommand::Analyze { limit } => analyze(limit, &map_path, settings, output),
        MapCommand::Info => info(&map_path, output),
        MapCommand::ExportCsv { output: file } => export_csv(file.as_deref(), &map_path, settings, output),
    }
}

fn refresh(owner: &str, map_path: &Path, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let repositories = repository_manager(settings)?;
    let registry = Packagist::new(&settings.registry_url)
        .with_context(|| format!("Invalid registry URL {}", settings.registry_url))?;

    let organization = repositories
        .source()
        .organization_info(owner)
        .with_context(|| format!("Failed to read organization {}", owner))?;
    println!(
        "{} {} has {} repositories ({} public, {} private)",
        output.marker(Status::Info),
        output.emphasis(owner),
        organization.total(),
        organization.public_repo_count,
        organization.private_repo_count
    );

    let updater = RepositoryMapUpdater::new(&repositories, &registry, &DiskStore, map_path)
        .with_tracked_files(settings.tracked_files());
    let spinner = output.spinner(format!("Listing repositories of {}", owner));
    let added = updater.refresh_list(owner);
    spinner.finish_and_clear();
    let added = added.with_context(|| format!("Failed to refresh {}", map_path.display()))?;

    println!(
        "{} Added {} repositories to {}",
        output.marker(Status::Success),
        added,
        map_path.display()
    );
    Ok(())
}

fn analyze(limit: usize, map_path: &Path, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let repositories = repository_manager(settings)?;
    let registry = Packagist::new(&settings.registry_url)
        .with_context(|| format!("Invalid registry URL {}", settings.registry_url))?;
    let updater = RepositoryMapUpdater::new(&repositories, &registry, &DiskStore, map_path)
        .with_tracked_files(settings.tracked_files());

    let spinner = output.spinner("Analyzing repositories");
    let report = updater.analyze_outstanding_with(limit, |id| {
        spinner.set_message(format!("Analyzing {}", id));
    });
    spinner.finish_and_clear();
    let report = report.with_context(|| format!("Failed to analyze {}", map_path.display()))?;

    println!(
        "{} Analyzed {} repositories ({} already analyzed)",
        output.marker(Status::Success),
        report.analyzed,
        report.skipped
    );
    Ok(())
}

fn info(map_path: &Path, output: &OutputConfig) -> Result<()> {
    let map = load_map(map_path)?;
    println!(
        "{} Repository map: {}",
        output.marker(Status::Info),
        map_path.display()
    );
    print!("{}", format_summary(&map.summary()));
    Ok(())
}

fn format_summary(summary: &MapSummary) -> String {
    format!(
        "  Repositories:        {}\n  Analyzed:            {}\n  With extension:      {}\n  Without extension:   {}\n  Not analyzed:        {}\n  Private:             {}\n  On package registry: {}\n",
        summary.total,
        summary.analyzed,
        summary.with_extension,
        summary.not_found,
        summary.total - summary.analyzed,
        summary.private,
        summary.on_package_registry
    )
}

fn export_csv(file: Option<&Path>, map_path: &Path, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let map = load_map(map_path)?;
    let report = csv::export(&map, &settings.manifest_file);

    match file {
        Some(path) => {
            DiskStore
                .write(path, &report)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Exported {} repositories to {}",
                output.marker(Status::Success),
                map.len(),
                path.display()
            );
        }
        None => print!("{}", report),
    }
    Ok(())
}
