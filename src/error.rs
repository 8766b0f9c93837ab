//! # Error Handling
//!
//! This module defines the centralized error type for `packmap`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! the engine can report, so that a failing rule always surfaces with enough
//! context (declaration unit, source, target) to be fixed.
//!
//! ## Taxonomy
//!
//! - **Validation** (`Validation`, `Declaration`): malformed rule shape,
//!   illegal target prefix, illegal source traversal, unknown conflict
//!   policy, incompatible template flags. Raised while loading, before any
//!   file is touched.
//! - **Resolution** (`Resolution`, `AutoMap`, `MissingSource`): a rule asked
//!   for automatic mapping and no pattern matched, the auto-map table itself
//!   is broken, or the source file is gone.
//! - **Conflict** (`Conflict`): the target exists under `stop`, the file
//!   types are incompatible with `merge`/`append*`, or the target is a
//!   directory.
//! - **Content** (`Content`, `Expression`, `Template`): malformed JSON in a
//!   source or existing target, or a template that failed to expand.
//!
//! `Rule` and `RuleSet` wrap the errors above with the entry and declaration
//! unit they came from. The remaining variants wrap infrastructure errors
//! from the standard library and the crates we depend on.

use thiserror::Error;

/// Main error type for packmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// A declaration unit contains a rule that does not pass validation.
    #[error("Invalid rule in {declared_at}: {message}")]
    Validation {
        /// Declaration unit the rule came from
        declared_at: String,
        message: String,
    },

    /// A declaration unit could not be read or does not have the expected shape.
    #[error("Failed to load declaration unit {path}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Declaration {
        path: String,
        message: String,
        /// Optional hint for how to fix the declaration
        hint: Option<String>,
    },

    /// The auto-map table could not be loaded.
    #[error("Auto-map error: {message}")]
    AutoMap { message: String },

    /// A target path could not be resolved for a rule.
    #[error("Cannot resolve target for {source_path}: {message}")]
    Resolution {
        source_path: String,
        message: String,
    },

    /// A rule's source file does not exist; `path` is relative to the
    /// declaration unit.
    #[error("Missing file: {path}")]
    MissingSource { path: String },

    /// A rule cannot be applied because of the state of its target.
    #[error("Conflict at {target}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Conflict {
        target: String,
        message: String,
        /// Optional hint for how to resolve the conflict
        hint: Option<String>,
    },

    /// A source or existing target has content that cannot be processed.
    #[error("Invalid content in {location}: {message}")]
    Content { location: String, message: String },

    /// An embedded expression failed to parse or evaluate.
    #[error("Error evaluating expression `{expression}`: {message}")]
    Expression { expression: String, message: String },

    /// A template has a structural problem (bad key type, bad fan-out).
    #[error("Template processing error: {message}")]
    Template { message: String },

    /// A single rule failed while being applied.
    #[error("{source_path} -> {target}: {error}")]
    Rule {
        source_path: String,
        target: String,
        #[source]
        error: Box<Error>,
    },

    /// One or more rules of a declaration unit failed.
    #[error("Error in map file {path}:{}", failures.iter().map(|f| format!("\n  {}", f)).collect::<String>())]
    RuleSet { path: String, failures: Vec<Error> },

    /// A file operation on the host filesystem failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// Project discovery (root directory, data path) failed.
    #[error("Project configuration error: {message}")]
    Project { message: String },

    /// Handing scripts to the external bundler failed.
    #[error("Script bundling error: {message}")]
    Bundler { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// An error while walking the matches of a glob pattern.
    #[error("Glob iteration error: {0}")]
    GlobIteration(#[from] glob::GlobError),
}

impl Error {
    /// Wrap an error with the source and target of the rule that produced it.
    pub fn in_rule(self, source_path: impl Into<String>, target: impl Into<String>) -> Self {
        Error::Rule {
            source_path: source_path.into(),
            target: target.into(),
            error: Box::new(self),
        }
    }

    /// Errors collected from a rule set, if this is one.
    pub fn failures(&self) -> &[Error] {
        match self {
            Error::RuleSet { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
