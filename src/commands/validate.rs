//! # Validate Command Implementation
//!
//! Loads every declaration unit and the auto-map table without touching the
//! output package. Reported problems:
//!
//! - declaration units that do not parse or contain invalid rules;
//! - glob sources that match nothing;
//! - an auto-map table that does not parse;
//! - auto-mapped targets that no pattern matches.
//!
//! Every unit is checked even after a failure so one run lists all issues.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use packmap::auto_map::AutoMapResolver;
use packmap::defaults;
use packmap::output::{emoji, OutputConfig};
use packmap::rules::{self, ApplyContext, RuleSet};

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Working directory holding RP/, BP/ and data/ (defaults to current directory)
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Modules directory, relative to the working directory
    #[arg(long, value_name = "PATH", env = "PACKMAP_MODULES", default_value = defaults::MODULES_DIR)]
    pub modules: PathBuf,

    /// Auto-map table (defaults to auto_map.yaml in the modules directory)
    #[arg(long, value_name = "PATH", env = "PACKMAP_AUTO_MAP")]
    pub auto_map: Option<PathBuf>,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let working_dir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let modules_dir = working_dir.join(&args.modules);
    let auto_map_path = match &args.auto_map {
        Some(path) => working_dir.join(path),
        None => defaults::default_auto_map_path(&modules_dir),
    };

    println!(
        "{} Validating declaration units in {}",
        emoji(&out, "🔍", "[SCAN]"),
        modules_dir.display()
    );

    let mut problems = Vec::new();
    let mut sets = Vec::new();
    for unit in rules::discover_units(&modules_dir)? {
        match RuleSet::load(&unit, &working_dir) {
            Ok(set) => sets.push(set),
            Err(err) => problems.push(err.to_string()),
        }
    }

    let ctx = ApplyContext::new(&working_dir, AutoMapResolver::new(&auto_map_path));
    let uses_auto_map = sets
        .iter()
        .flat_map(RuleSet::entries)
        .any(|entry| entry.target.uses_auto_map());
    if auto_map_path.exists() || uses_auto_map {
        match ctx.auto_map().table() {
            Ok(table) => {
                println!(
                    "{} Auto-map table has {} pattern(s)",
                    emoji(&out, "🗺️", "[MAP]"),
                    table.len()
                );
                for set in &sets {
                    for entry in set.entries() {
                        if let Err(err) = entry.resolve_target(&ctx) {
                            problems.push(format!("{}: {}", set.path(), err));
                        }
                    }
                }
            }
            Err(err) => problems.push(err.to_string()),
        }
    }

    let entry_count: usize = sets.iter().map(|set| set.entries().len()).sum();
    let script_count: usize = sets.iter().map(|set| set.scripts().len()).sum();
    println!("\n{} Summary:", emoji(&out, "📊", "[INFO]"));
    println!("   Declaration units: {}", sets.len());
    println!("   Rules: {}", entry_count);
    println!("   Scripts: {}", script_count);

    if problems.is_empty() {
        println!("\n{} Validation passed", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }

    println!();
    for problem in &problems {
        println!("{} {}", emoji(&out, "❌", "[ERR]"), problem);
    }
    anyhow::bail!("Validation failed with {} problem(s)", problems.len())
}
