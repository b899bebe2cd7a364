//! # git-source CLI
//!
//! Binary entry point for the `git-source` command-line tool. It parses the
//! arguments with `clap`, sets up logging, and dispatches to a command. All
//! synchronization and record logic lives in the `git_source` library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
