//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which computes every
//! extension a repository transitively depends on and prints them as a
//! composer `require` document:
//!
//! ```json
//! {
//!   "require": {
//!     "oat-sa/tao-core": "dev-develop",
//!     "oat-sa/generis": "dev-develop"
//!   }
//! }
//! ```
//!
//! The root itself is left out unless `--include-root` is given.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::ResolveInput;
use tao_dependency_resolver::composer::RequireManifest;
use tao_dependency_resolver::config::Settings;
use tao_dependency_resolver::output::{OutputConfig, Status};
use tao_dependency_resolver::store::{DiskStore, FileStore};

/// Resolve every extension a repository depends on
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: ResolveInput,

    /// List the root repository first in the output
    #[arg(long)]
    pub include_root: bool,

    /// Write the result to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let resolution = super::resolve(&args.input, settings)?;
    let root = args.include_root.then_some(&resolution.root);
    let json = RequireManifest::new(root, &resolution.extensions).to_pretty_json()?;

    match args.output {
        Some(path) => {
            DiskStore
                .write(&path, &format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Wrote {} dependencies of {} to {}",
                output.marker(Status::Success),
                resolution.extensions.len(),
                output.emphasis(resolution.root.extension_name()),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
