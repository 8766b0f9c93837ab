//! Script hand-off to an external bundler
//!
//! Declaration units may list script files next to their rules. The scripts
//! themselves are never transformed here: their paths are resolved back to
//! the original project (the working directory is a temporary copy), an
//! entry file importing all of them is written, and the configured bundler
//! command turns it into a single output file.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::config::BundlerSettings;
use crate::defaults::BUNDLER_ENTRY_FILE;
use crate::error::{Error, Result};
use crate::filesystem;
use crate::path;
use crate::project;
use crate::rules::RuleSet;

/// Paths of a set's scripts inside the original project.
///
/// A unit at `<working>/data/<dir>/_map.yaml` declaring `main.ts` resolves
/// to `<root>/<data_path>/<dir>/main.ts`.
pub fn resolve_script_paths(set: &RuleSet, working_dir: &str, root_dir: &str, data_path: &str) -> Result<Vec<String>> {
    let working_data = path::join(&[working_dir, "data"]);
    let unit_in_data = path::relative(&working_data, set.unit_dir())?;
    let project_data = path::resolve(root_dir, data_path);

    Ok(set
        .scripts()
        .iter()
        .map(|script| path::join(&[project_data.as_str(), unit_in_data.as_str(), script.as_str()]))
        .collect())
}

/// Content of the bundler entry file
pub fn entry_file_content(scripts: &[String]) -> String {
    scripts
        .iter()
        .map(|script| format!("import \"{}\";\n", script))
        .collect()
}

/// Run the bundler over `scripts` and return the bundle location.
///
/// With `build_path` set the bundle is written there (relative to
/// `root_dir`) and then copied to `outfile`.
pub fn run_bundler(
    scripts: &[String],
    settings: Option<&BundlerSettings>,
    working_dir: &Path,
    root_dir: &str,
) -> Result<PathBuf> {
    let settings = settings.ok_or_else(|| Error::Bundler {
        message: "Scripts are declared but no bundler command is configured".to_string(),
    })?;

    let outfile = working_dir.join(&settings.outfile);
    let bundle = match &settings.build_path {
        Some(build_path) => PathBuf::from(path::resolve(root_dir, build_path)),
        None => outfile.clone(),
    };
    filesystem::ensure_parent(&bundle)?;

    let entry = working_dir.join(BUNDLER_ENTRY_FILE);
    filesystem::write(&entry, entry_file_content(scripts))?;

    let output = Command::new(&settings.command)
        .args(&settings.args)
        .arg(&entry)
        .arg(format!("--outfile={}", path::as_posix(&bundle.to_string_lossy())))
        .current_dir(working_dir)
        .output();
    if let Err(err) = filesystem::remove_file(&entry) {
        warn!("{}", err);
    }

    let output = output.map_err(|err| Error::Bundler {
        message: format!("Failed to run '{}': {}", settings.command, err),
    })?;
    if !output.status.success() {
        return Err(Error::Bundler {
            message: format!(
                "'{}' exited with {}: {}",
                settings.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    info!("Compiled {} script(s) to {}", scripts.len(), bundle.display());

    if settings.build_path.is_some() {
        filesystem::copy_file(&bundle, &outfile)?;
        info!("Copied compiled file to {}", settings.outfile);
    }
    Ok(bundle)
}

/// Resolve and bundle the scripts of every set, if any declare scripts
pub fn compile_scripts(sets: &[RuleSet], settings: Option<&BundlerSettings>, working_dir: &Path) -> Result<Option<PathBuf>> {
    if sets.iter().all(|set| set.scripts().is_empty()) {
        return Ok(None);
    }

    let root = project::root_dir()?;
    let data_path = project::data_path(&root)?;
    let working = path::as_posix(&working_dir.to_string_lossy());

    let mut scripts = Vec::new();
    for set in sets {
        scripts.extend(resolve_script_paths(set, &working, &root, &data_path)?);
    }

    info!("Compiling scripts:");
    for script in &scripts {
        info!("  {}", script);
    }
    run_bundler(&scripts, settings, working_dir, &root).map(Some)
}
