//! # TAO Dependency Resolver CLI
//!
//! This is the binary entry point for the `tao-dependency-resolver`
//! command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors and translating them into user-friendly
//!   output.
//!
//! The resolution and map maintenance logic lives in the library crate; the
//! binary only wires settings, remote adapters and output together.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
