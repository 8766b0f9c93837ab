//! # packmap CLI
//!
//! Binary entry point for the `packmap` command-line tool. It parses the
//! arguments with `clap`, sets up logging and dispatches to a command; all
//! real work lives in the library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
