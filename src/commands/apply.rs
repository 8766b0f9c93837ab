//! Apply command implementation
//!
//! The apply command runs the whole engine:
//! 1. Discover and load every declaration unit under the modules directory
//! 2. Hand declared scripts to the bundler
//! 3. Apply each rule set in discovery order

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use packmap::auto_map::AutoMapResolver;
use packmap::config;
use packmap::defaults;
use packmap::output::{emoji, summary_line, OutputConfig};
use packmap::rules::{self, ApplyContext};
use packmap::scripts;

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Settings JSON, as passed by a build pipeline
    #[arg(value_name = "SETTINGS")]
    pub settings: Option<String>,

    /// Working directory holding RP/, BP/ and data/ (defaults to current directory)
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Modules directory, relative to the working directory
    #[arg(long, value_name = "PATH", env = "PACKMAP_MODULES", default_value = defaults::MODULES_DIR)]
    pub modules: PathBuf,

    /// Auto-map table (defaults to auto_map.yaml in the modules directory)
    #[arg(long, value_name = "PATH", env = "PACKMAP_AUTO_MAP")]
    pub auto_map: Option<PathBuf>,

    /// Global template scope as a JSON object, layered over the settings scope
    #[arg(long, value_name = "JSON")]
    pub scope: Option<String>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let working_dir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let settings = config::parse_settings(args.settings.as_deref().unwrap_or_default())?;
    let mut scope = settings.scope.clone();
    if let Some(json) = &args.scope {
        scope.extend(config::parse_scope(json)?);
    }

    let modules_dir = working_dir.join(&args.modules);
    let auto_map_path = match (&args.auto_map, &settings.auto_map) {
        (Some(path), _) => working_dir.join(path),
        (None, Some(path)) => working_dir.join(path),
        (None, None) => defaults::default_auto_map_path(&modules_dir),
    };

    let sets = rules::load_rule_sets(&modules_dir, &working_dir)?;

    if let Some(bundle) = scripts::compile_scripts(&sets, settings.bundler.as_ref(), &working_dir)
        .context("Error during script path resolution or compilation")?
    {
        if !args.quiet {
            println!("{} Scripts bundled into {}", emoji(&out, "📦", "[JS]"), bundle.display());
        }
    }

    let ctx = ApplyContext::new(&working_dir, AutoMapResolver::new(auto_map_path)).with_scope(scope);
    let set_count = sets.len();
    for set in sets {
        let report = set
            .apply(&ctx)
            .context("Error during evaluation of the map files")?;
        if !args.quiet {
            println!("{}", summary_line(&out, &report));
        }
    }

    if !args.quiet {
        println!(
            "{} Applied {} declaration unit(s) to {}",
            emoji(&out, "✅", "[OK]"),
            set_count,
            working_dir.display()
        );
    }
    Ok(())
}
