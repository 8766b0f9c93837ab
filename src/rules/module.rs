//! Rule sets: the validated contents of one declaration unit

use std::path::Path;

use log::warn;

use super::entry::{Outcome, RuleEntry};
use super::{schedule, ApplyContext};
use crate::config::{self, DeclarationUnit, RuleDecl};
use crate::error::{Error, Result};
use crate::path;

/// Entries and script references of one declaration unit
#[derive(Debug, Clone)]
pub struct RuleSet {
    path: String,
    unit_dir: String,
    entries: Vec<RuleEntry>,
    scripts: Vec<String>,
}

impl RuleSet {
    /// Read, parse and validate the declaration unit at `unit_path`
    pub fn load(unit_path: &Path, working_dir: &Path) -> Result<Self> {
        let unit_posix = path::as_posix(&unit_path.to_string_lossy());
        let working_posix = path::as_posix(&working_dir.to_string_lossy());
        let declared_at = path::relative(&working_posix, &unit_posix)
            .ok()
            .filter(|rel| !rel.starts_with(".."))
            .unwrap_or_else(|| unit_posix.clone());

        let content = std::fs::read_to_string(unit_path).map_err(|err| Error::Declaration {
            path: declared_at.clone(),
            message: err.to_string(),
            hint: None,
        })?;
        let unit = config::parse_unit(&content, &declared_at)?;
        Self::from_unit(unit, &path::dirname(&unit_posix), &working_posix, &declared_at)
    }

    /// Validate a parsed unit whose directory is `unit_dir`.
    ///
    /// Glob sources are expanded here, so the set holds one entry per
    /// matched file.
    pub fn from_unit(unit: DeclarationUnit, unit_dir: &str, working_dir: &str, declared_at: &str) -> Result<Self> {
        if unit.is_empty() {
            warn!("No rules or scripts declared in {}", declared_at);
        }

        let mut entries = Vec::with_capacity(unit.map.len());
        for decl in &unit.map {
            if path::has_glob_chars(&decl.source) {
                for source in expand_glob(unit_dir, &decl.source, declared_at)? {
                    let concrete = RuleDecl {
                        source,
                        ..decl.clone()
                    };
                    entries.push(RuleEntry::from_decl(&concrete, unit_dir, working_dir, declared_at)?);
                }
            } else {
                entries.push(RuleEntry::from_decl(decl, unit_dir, working_dir, declared_at)?);
            }
        }

        Ok(Self {
            path: declared_at.to_string(),
            unit_dir: path::normalize(unit_dir),
            entries,
            scripts: unit.scripts,
        })
    }

    /// Declaration unit path, relative to the working directory when possible
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute posix path of the unit's directory
    pub fn unit_dir(&self) -> &str {
        &self.unit_dir
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Apply every entry; consumes the set.
    pub fn apply(self, ctx: &ApplyContext) -> Result<ApplyReport> {
        match schedule::run(&self.entries, ctx) {
            Ok(outcomes) => Ok(ApplyReport::new(self.path, &outcomes)),
            Err(failures) => Err(Error::RuleSet {
                path: self.path,
                failures,
            }),
        }
    }
}

/// Files matched by a glob source, relative to `unit_dir` unless the
/// pattern is absolute
fn expand_glob(unit_dir: &str, raw: &str, declared_at: &str) -> Result<Vec<String>> {
    let absolute = path::is_absolute(raw);
    let pattern = if absolute {
        path::as_posix(raw)
    } else {
        format!("{}/{}", glob::Pattern::escape(unit_dir), path::as_posix(raw))
    };

    let mut matches = Vec::new();
    for found in glob::glob(&pattern)? {
        let found = found?;
        if !found.is_file() {
            continue;
        }
        let found = path::as_posix(&found.to_string_lossy());
        matches.push(if absolute {
            found
        } else {
            path::relative(unit_dir, &found)?
        });
    }

    if matches.is_empty() {
        return Err(Error::Validation {
            declared_at: declared_at.to_string(),
            message: format!("Glob pattern matched no files: {}", raw),
        });
    }
    matches.sort();
    Ok(matches)
}

/// Counts of what applying a rule set did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub path: String,
    pub written: usize,
    pub overwritten: usize,
    pub merged: usize,
    pub appended: usize,
    pub skipped: usize,
    pub omitted: usize,
}

impl ApplyReport {
    pub fn new(path: impl Into<String>, outcomes: &[Outcome]) -> Self {
        let mut report = Self {
            path: path.into(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Written => report.written += 1,
                Outcome::Overwritten => report.overwritten += 1,
                Outcome::Merged => report.merged += 1,
                Outcome::Appended => report.appended += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Omitted => report.omitted += 1,
            }
        }
        report
    }

    pub fn total(&self) -> usize {
        self.written + self.overwritten + self.merged + self.appended + self.skipped + self.omitted
    }
}
