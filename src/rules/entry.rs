//! A single rule: one source file transformed into one target
//!
//! Applying an entry walks a small state machine keyed on the conflict
//! policy and on what currently occupies the resolved target:
//!
//! | target      | policy                     | action                              |
//! |-------------|----------------------------|-------------------------------------|
//! | directory   | any                        | conflict error                      |
//! | missing     | any                        | fresh write                         |
//! | file        | `stop`                     | conflict error                      |
//! | file        | `skip`                     | nothing, logged                     |
//! | file        | `overwrite`                | fresh write                         |
//! | file        | `merge`                    | deep merge (mergeable types only)   |
//! | file        | `appendStart`/`appendEnd`  | text concat (non-mergeable only)    |
//!
//! A fresh write expands JSON or text templates when enabled and otherwise
//! copies the source byte for byte.

use std::fmt;
use std::path::Path;

use log::{debug, info};
use serde_json::{Map, Value as JsonValue};

use super::target::Target;
use super::ApplyContext;
use crate::config::{ConflictPolicy, RuleDecl};
use crate::error::{Error, Result};
use crate::filesystem::{self, TargetState};
use crate::merge::{self, json};
use crate::path;
use crate::template::{self, Scope};

/// What applying an entry did to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target did not exist and was created
    Written,
    /// An existing target was replaced
    Overwritten,
    /// The source was deep merged into the existing target
    Merged,
    /// The source text was added before or after the existing target text
    Appended,
    /// The target existed and the entry asked to skip it
    Skipped,
    /// The template evaluated to `noValue`; nothing was written
    Omitted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Written => "written",
            Outcome::Overwritten => "overwritten",
            Outcome::Merged => "merged",
            Outcome::Appended => "appended",
            Outcome::Skipped => "skipped",
            Outcome::Omitted => "omitted",
        };
        f.write_str(name)
    }
}

/// A validated rule, ready to apply
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    /// Absolute posix path of the source file
    pub source: String,
    /// Source path relative to the declaration unit's directory
    pub source_relative: String,
    pub target: Target,
    pub json_template: bool,
    pub text_template: bool,
    pub on_conflict: ConflictPolicy,
    pub file_type: Option<String>,
    pub scope: Map<String, JsonValue>,
    /// Declaration unit the entry came from
    pub declared_at: String,
}

impl RuleEntry {
    /// Validate a declared rule whose `source` names a single file.
    ///
    /// `unit_dir` and `working_dir` are absolute posix paths.
    pub fn from_decl(decl: &RuleDecl, unit_dir: &str, working_dir: &str, declared_at: &str) -> Result<Self> {
        let invalid = |message: String| Error::Validation {
            declared_at: declared_at.to_string(),
            message,
        };

        if decl.json_template && decl.text_template {
            return Err(invalid(format!(
                "jsonTemplate and textTemplate cannot both be enabled (source: {})",
                decl.source
            )));
        }

        let (source, source_relative) = if path::is_absolute(&decl.source) {
            let source = path::normalize(&decl.source);
            if !path::is_within(working_dir, &source) {
                return Err(invalid(format!(
                    "Absolute source paths must be inside the working directory. Got: {}",
                    decl.source
                )));
            }
            let relative = path::relative(unit_dir, &source)?;
            (source, relative)
        } else {
            let relative = path::normalize(&decl.source);
            if relative == ".." || relative.starts_with("../") {
                return Err(invalid(format!(
                    "Paths cannot contain parent directory references (..). Got: {}",
                    decl.source
                )));
            }
            (path::join(&[unit_dir, relative.as_str()]), relative)
        };

        let target = Target::from_decl(&decl.target);
        target.validate().map_err(invalid)?;

        Ok(Self {
            source,
            source_relative,
            target,
            json_template: decl.json_template,
            text_template: decl.text_template,
            on_conflict: decl.on_conflict,
            file_type: decl.file_type.clone(),
            scope: decl.scope.clone(),
            declared_at: declared_at.to_string(),
        })
    }

    /// Whether the entry may run alongside other entries of its set.
    ///
    /// Only `stop` entries that are not JSON templates qualify; every other
    /// policy reads or depends on what earlier entries wrote.
    pub fn is_concurrent(&self) -> bool {
        self.on_conflict == ConflictPolicy::Stop && !self.json_template
    }

    /// File type of `file`: the `fileType` override or the lowercase extension
    pub fn file_type_of(&self, file: &str) -> String {
        match &self.file_type {
            Some(file_type) if !file_type.is_empty() => file_type.to_lowercase(),
            _ => path::extension(file),
        }
    }

    /// The global scope with the entry's own scope layered on top
    pub fn template_scope(&self, ctx: &ApplyContext) -> Scope {
        Scope::from_json(ctx.scope()).overlay_json(&self.scope)
    }

    /// Target path relative to the working directory
    pub fn resolve_target(&self, ctx: &ApplyContext) -> Result<String> {
        // sources outside the unit directory map by file name alone
        let mapped_source = if self.source_relative.starts_with("..") {
            path::basename(&self.source_relative)
        } else {
            self.source_relative.clone()
        };
        self.target.resolve(&mapped_source, ctx.auto_map())
    }

    /// Apply the entry; failures are tagged with its source and target
    pub fn apply(&self, ctx: &ApplyContext) -> Result<Outcome> {
        let target = self
            .resolve_target(ctx)
            .map_err(|err| err.in_rule(&self.source_relative, self.target.to_string()))?;
        self.apply_to(&target, ctx)
            .map_err(|err| err.in_rule(&self.source_relative, &target))
    }

    fn apply_to(&self, target: &str, ctx: &ApplyContext) -> Result<Outcome> {
        let target_path = ctx.resolve(target);

        match (TargetState::of(&target_path), self.on_conflict) {
            (TargetState::Directory, _) => Err(Error::Conflict {
                target: target.to_string(),
                message: "Target is a directory".to_string(),
                hint: Some("end the target with '/' to copy the source into it".to_string()),
            }),
            (TargetState::Missing, _) => self.write_fresh(&target_path, target, ctx, Outcome::Written),
            (TargetState::File, ConflictPolicy::Stop) => Err(Error::Conflict {
                target: target.to_string(),
                message: "Target file already exists".to_string(),
                hint: Some(
                    "use onConflict: skip, merge, overwrite, appendStart or appendEnd to handle it".to_string(),
                ),
            }),
            (TargetState::File, ConflictPolicy::Skip) => {
                info!(
                    "Skipped exporting {} to {}. Target already exists.",
                    self.source_relative, target
                );
                Ok(Outcome::Skipped)
            }
            (TargetState::File, ConflictPolicy::Overwrite) => {
                self.write_fresh(&target_path, target, ctx, Outcome::Overwritten)
            }
            (TargetState::File, ConflictPolicy::Merge) => self.merge_into(&target_path, target, ctx),
            (TargetState::File, ConflictPolicy::AppendStart) => {
                self.append_to(&target_path, target, ctx, true)
            }
            (TargetState::File, ConflictPolicy::AppendEnd) => {
                self.append_to(&target_path, target, ctx, false)
            }
        }
    }

    fn ensure_source(&self) -> Result<&Path> {
        let source = Path::new(&self.source);
        if source.is_file() {
            Ok(source)
        } else {
            Err(Error::MissingSource {
                path: self.source_relative.clone(),
            })
        }
    }

    fn read_source(&self) -> Result<String> {
        filesystem::read_text(self.ensure_source()?)
    }

    /// Source parsed as JSON and expanded when it is a JSON template
    fn source_document(&self, ctx: &ApplyContext) -> Result<Option<JsonValue>> {
        let mut content = self.read_source()?;
        if self.text_template {
            content = template::expand_text(&content, &self.template_scope(ctx))?;
        }
        let document = json::parse_document(&content, &self.source_relative)?;
        if self.json_template {
            template::expand(&document, &self.template_scope(ctx))
        } else {
            Ok(Some(document))
        }
    }

    fn write_fresh(&self, target_path: &Path, target: &str, ctx: &ApplyContext, done: Outcome) -> Result<Outcome> {
        if self.json_template {
            match self.source_document(ctx)? {
                Some(document) => filesystem::write(target_path, json::to_pretty_string(&document)?)?,
                None => {
                    debug!("Template {} evaluated to noValue, {} not written", self.source_relative, target);
                    return Ok(Outcome::Omitted);
                }
            }
        } else if self.text_template {
            let content = template::expand_text(&self.read_source()?, &self.template_scope(ctx))?;
            filesystem::write(target_path, content)?;
        } else {
            filesystem::copy_file(self.ensure_source()?, target_path)?;
        }
        debug!("Exported {} to {}", self.source_relative, target);
        Ok(done)
    }

    fn merge_into(&self, target_path: &Path, target: &str, ctx: &ApplyContext) -> Result<Outcome> {
        let source_type = self.file_type_of(&self.source);
        let target_type = self.file_type_of(target);
        if !merge::is_mergeable(&source_type) || !merge::is_mergeable(&target_type) {
            return Err(Error::Conflict {
                target: target.to_string(),
                message: format!(
                    "Cannot merge files with types {} and {}. Only json and material files can be merged.",
                    source_type, target_type
                ),
                hint: None,
            });
        }

        let Some(incoming) = self.source_document(ctx)? else {
            debug!("Template {} evaluated to noValue, {} left unchanged", self.source_relative, target);
            return Ok(Outcome::Omitted);
        };
        let existing = filesystem::read_text(target_path)?;
        let merged = json::merge_into_document(&existing, &incoming, target)?;
        filesystem::write(target_path, merged)?;
        debug!("Merged {} into {}", self.source_relative, target);
        Ok(Outcome::Merged)
    }

    fn append_to(&self, target_path: &Path, target: &str, ctx: &ApplyContext, at_start: bool) -> Result<Outcome> {
        let source_type = self.file_type_of(&self.source);
        let target_type = self.file_type_of(target);
        if merge::is_mergeable(&source_type) || merge::is_mergeable(&target_type) {
            return Err(Error::Conflict {
                target: target.to_string(),
                message: format!(
                    "Cannot append files with types {} and {}. json and material files must use merge.",
                    source_type, target_type
                ),
                hint: None,
            });
        }

        let addition = if self.json_template {
            match self.source_document(ctx)? {
                Some(document) => json::to_pretty_string(&document)?,
                None => return Ok(Outcome::Omitted),
            }
        } else if self.text_template {
            template::expand_text(&self.read_source()?, &self.template_scope(ctx))?
        } else {
            self.read_source()?
        };

        let existing = filesystem::read_text(target_path)?;
        let combined = if at_start {
            addition + &existing
        } else {
            existing + &addition
        };
        filesystem::write(target_path, combined)?;
        debug!("Appended {} to {}", self.source_relative, target);
        Ok(Outcome::Appended)
    }
}
