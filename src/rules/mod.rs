//! # Rules
//!
//! Declaration units are discovered under the modules directory, loaded into
//! [`RuleSet`]s and applied against an [`ApplyContext`].
//!
//! - [`target`]: target forms and their resolution
//! - [`entry`]: one rule and its conflict handling
//! - [`schedule`]: parallel and sequential batches of a set
//! - [`module`]: loading a unit, glob expansion and apply reports

pub mod entry;
pub mod module;
pub mod schedule;
pub mod target;

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::{Map, Value as JsonValue};
use walkdir::WalkDir;

use crate::auto_map::AutoMapResolver;
use crate::defaults;
use crate::error::{Error, Result};

pub use entry::{Outcome, RuleEntry};
pub use module::{ApplyReport, RuleSet};
pub use target::{Target, TargetPart};

/// Everything an entry needs besides its own declaration
#[derive(Debug)]
pub struct ApplyContext {
    working_dir: PathBuf,
    scope: Map<String, JsonValue>,
    auto_map: AutoMapResolver,
}

impl ApplyContext {
    pub fn new(working_dir: impl Into<PathBuf>, auto_map: AutoMapResolver) -> Self {
        Self {
            working_dir: working_dir.into(),
            scope: Map::new(),
            auto_map,
        }
    }

    /// Set the global template scope
    pub fn with_scope(mut self, scope: Map<String, JsonValue>) -> Self {
        self.scope = scope;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn scope(&self) -> &Map<String, JsonValue> {
        &self.scope
    }

    pub fn auto_map(&self) -> &AutoMapResolver {
        &self.auto_map
    }

    /// Host path of a target relative to the working directory
    pub fn resolve(&self, target: &str) -> PathBuf {
        self.working_dir.join(target)
    }
}

/// Declaration units under `modules_dir`, sorted by path.
///
/// A missing modules directory yields no units.
pub fn discover_units(modules_dir: &Path) -> Result<Vec<PathBuf>> {
    if !modules_dir.is_dir() {
        warn!("Modules directory {} does not exist", modules_dir.display());
        return Ok(Vec::new());
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(modules_dir).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Filesystem {
            message: format!("Failed to walk {}: {}", modules_dir.display(), err),
        })?;
        let is_unit = entry.file_type().is_file()
            && entry.file_name().to_str().is_some_and(defaults::is_unit_file_name);
        if is_unit {
            debug!("Found declaration unit {}", entry.path().display());
            units.push(entry.into_path());
        }
    }
    Ok(units)
}

/// Discover and load every declaration unit under `modules_dir`
pub fn load_rule_sets(modules_dir: &Path, working_dir: &Path) -> Result<Vec<RuleSet>> {
    discover_units(modules_dir)?
        .iter()
        .map(|unit| RuleSet::load(unit, working_dir))
        .collect()
}

/// Apply rule sets in order, stopping at the first that fails
pub fn apply_rule_sets(sets: Vec<RuleSet>, ctx: &ApplyContext) -> Result<Vec<ApplyReport>> {
    sets.into_iter().map(|set| set.apply(ctx)).collect()
}
