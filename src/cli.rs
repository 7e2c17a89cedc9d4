//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;
use tao_dependency_resolver::config::Settings;
use tao_dependency_resolver::output::{ColorChoice, OutputConfig};

/// TAO dependency resolver - Resolve the extensions a TAO extension depends on
#[derive(Parser, Debug)]
#[command(name = "tao-dependency-resolver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output
    #[arg(long, global = true, value_enum, value_name = "WHEN", default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: LevelFilter,

    /// Settings file (YAML)
    #[arg(long, global = true, value_name = "FILE", env = "TAO_RESOLVER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve every extension a repository depends on
    Resolve(commands::resolve::ResolveArgs),

    /// Show the dependency tree of a repository
    Tree(commands::tree::TreeArgs),

    /// Maintain the repository map
    Map(commands::map::MapArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level);
        let output = OutputConfig::new(self.color);

        let config = self.config.as_deref();
        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args, &load_settings(config)?, &output),
            Commands::Tree(args) => commands::tree::execute(args, &load_settings(config)?, &output),
            Commands::Map(args) => commands::map::execute(args, &load_settings(config)?, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn load_settings(config: Option<&std::path::Path>) -> Result<Settings> {
    Settings::load(config).context("Failed to load settings")
}

/// Log to stderr at `level` unless `RUST_LOG` says otherwise.
fn init_logging(level: LevelFilter) {
    let env = env_logger::Env::default().default_filter_or(level.to_string());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
