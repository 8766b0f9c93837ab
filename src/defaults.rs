//! Default values for packmap.
//!
//! Centralized so the CLI, the library and the tests agree on file names
//! and locations.

use std::path::{Path, PathBuf};

use crate::auto_map;

/// Modules directory, relative to the working directory
pub const MODULES_DIR: &str = "data/modular_mc";

/// File names recognized as declaration units, in lookup order
pub const UNIT_FILE_NAMES: &[&str] = &["_map.yaml", "_map.yml", "_map.json"];

/// Bundle written when the settings name no output
pub const DEFAULT_OUTFILE: &str = "BP/scripts/main.js";

/// Temporary bundler entry file, created in the working directory
pub const BUNDLER_ENTRY_FILE: &str = "_packmap_scripts_entry.js";

/// Environment variable pointing at the project root
pub const ROOT_DIR_ENV: &str = "ROOT_DIR";

/// Prefixes every literal target must start with
pub const TARGET_ROOTS: &[&str] = &["RP/", "BP/", "data/"];

/// Returns the default auto-map table location inside `modules_dir`.
///
/// This can be overridden by the `--auto-map` CLI flag, the
/// `PACKMAP_AUTO_MAP` environment variable or the `autoMap` setting.
pub fn default_auto_map_path(modules_dir: &Path) -> PathBuf {
    modules_dir.join(auto_map::DEFAULT_FILE_NAME)
}

/// Whether a file name is one of [`UNIT_FILE_NAMES`]
pub fn is_unit_file_name(name: &str) -> bool {
    UNIT_FILE_NAMES.contains(&name)
}
