//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// packmap - Apply declarative asset rules to a resource/behavior pack
#[derive(Parser, Debug)]
#[command(name = "packmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply every declaration unit to the working directory
    Apply(commands::apply::ApplyArgs),

    /// Load and validate declaration units without writing anything
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Apply(args) => commands::apply::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
        }
    }
}

/// `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["packmap", "validate", "--color", "never", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.color, "never");
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn test_apply_positional_settings() {
        let cli = Cli::try_parse_from(["packmap", "apply", r#"{"scope": {}}"#]).unwrap();
        match cli.command {
            Commands::Apply(args) => assert_eq!(args.settings.as_deref(), Some(r#"{"scope": {}}"#)),
            _ => panic!("expected apply"),
        }
    }
}
