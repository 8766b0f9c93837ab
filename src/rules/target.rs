//! Rule targets
//!
//! A declared target takes one of three forms:
//!
//! - a literal path such as `BP/items/sword.json`; a trailing `/` or a final
//!   `.`/`..` segment makes it a directory the source file is copied into;
//! - `:auto` or `:autoFlat`, resolved through the auto-map table;
//! - a structured `{path, subpath, name}` target whose parts are literals or
//!   auto keywords.
//!
//! Resolution yields a normalized posix path relative to the working
//! directory.

use std::fmt;

use crate::auto_map::{AutoMapResolver, AutoMapping};
use crate::config::TargetDecl;
use crate::defaults::TARGET_ROOTS;
use crate::error::{Error, Result};
use crate::path;

const AUTO: &str = ":auto";
const AUTO_FLAT: &str = ":autoFlat";

/// One part of a structured target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPart {
    Literal(String),
    Auto,
    AutoFlat,
}

impl TargetPart {
    pub fn parse(raw: &str) -> Self {
        match raw {
            AUTO => TargetPart::Auto,
            AUTO_FLAT => TargetPart::AutoFlat,
            other => TargetPart::Literal(other.to_string()),
        }
    }

    fn is_auto(&self) -> bool {
        !matches!(self, TargetPart::Literal(_))
    }
}

impl fmt::Display for TargetPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetPart::Literal(text) => f.write_str(text),
            TargetPart::Auto => f.write_str(AUTO),
            TargetPart::AutoFlat => f.write_str(AUTO_FLAT),
        }
    }
}

/// Where a rule writes its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A fixed path; `directory` targets receive the source file name
    Literal { path: String, directory: bool },
    /// Auto-mapped from the source file name
    Auto { flatten: bool },
    Structured {
        path: TargetPart,
        subpath: Option<TargetPart>,
        name: TargetPart,
    },
}

impl Target {
    pub fn from_decl(decl: &TargetDecl) -> Self {
        match decl {
            TargetDecl::Path(raw) => match raw.as_str() {
                AUTO => Target::Auto { flatten: false },
                AUTO_FLAT => Target::Auto { flatten: true },
                _ => Target::Literal {
                    path: path::normalize(raw),
                    directory: is_directory_target(raw),
                },
            },
            TargetDecl::Structured(parts) => Target::Structured {
                path: parts.path.as_deref().map(TargetPart::parse).unwrap_or(TargetPart::Auto),
                subpath: parts.subpath.as_deref().map(TargetPart::parse),
                name: parts.name.as_deref().map(TargetPart::parse).unwrap_or(TargetPart::Auto),
            },
        }
    }

    /// Check literal paths against the allowed output roots
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Target::Literal { path, directory } => check_root(path, *directory),
            Target::Structured {
                path: TargetPart::Literal(path),
                ..
            } => check_root(&path::normalize(path), true),
            _ => Ok(()),
        }
    }

    /// Whether resolving this target needs the auto-map table
    pub fn uses_auto_map(&self) -> bool {
        match self {
            Target::Literal { .. } => false,
            Target::Auto { .. } => true,
            Target::Structured { path, name, .. } => path.is_auto() || name.is_auto(),
        }
    }

    /// Resolve against `source`, the source path relative to its
    /// declaration unit (or just its file name when it lies outside)
    pub fn resolve(&self, source: &str, auto_map: &AutoMapResolver) -> Result<String> {
        let resolved = match self {
            Target::Literal { path, directory } => {
                if *directory {
                    path::join(&[path.clone(), path::basename(source)])
                } else {
                    path.clone()
                }
            }
            Target::Auto { flatten } => mapping(source, auto_map)?.target(*flatten),
            Target::Structured { path, subpath, name } => {
                let mapped = if self.uses_auto_map() {
                    Some(mapping(source, auto_map)?)
                } else {
                    None
                };
                resolve_structured(path, subpath.as_ref(), name, source, mapped.as_ref())
            }
        };

        let resolved = path::normalize(&resolved);
        if path::is_absolute(&resolved) || resolved == ".." || resolved.starts_with("../") {
            return Err(Error::Resolution {
                source_path: source.to_string(),
                message: format!("Target {} lies outside the working directory", resolved),
            });
        }
        Ok(resolved)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Literal { path, directory: true } => write!(f, "{}/", path),
            Target::Literal { path, .. } => f.write_str(path),
            Target::Auto { flatten: false } => f.write_str(AUTO),
            Target::Auto { flatten: true } => f.write_str(AUTO_FLAT),
            Target::Structured { path, subpath, name } => {
                write!(f, "{{path: {}", path)?;
                if let Some(subpath) = subpath {
                    write!(f, ", subpath: {}", subpath)?;
                }
                write!(f, ", name: {}}}", name)
            }
        }
    }
}

/// A trailing slash or a final `.`/`..` segment marks a directory
fn is_directory_target(raw: &str) -> bool {
    let raw = path::as_posix(raw);
    raw.ends_with('/') || matches!(raw.rsplit('/').next(), Some(".") | Some(".."))
}

fn check_root(normalized: &str, directory: bool) -> std::result::Result<(), String> {
    let allowed = TARGET_ROOTS.iter().any(|root| {
        normalized.starts_with(root) || (directory && normalized == root.trim_end_matches('/'))
    });
    if allowed {
        Ok(())
    } else {
        Err(format!(
            "Target must start with RP/, BP/, or data/. Got: {}",
            normalized
        ))
    }
}

fn mapping(source: &str, auto_map: &AutoMapResolver) -> Result<AutoMapping> {
    auto_map.resolve_parts(source)?.ok_or_else(|| Error::Resolution {
        source_path: source.to_string(),
        message: format!(
            "No auto-map pattern matches '{}' (table: {})",
            path::basename(source),
            path::as_posix(&auto_map.path().to_string_lossy())
        ),
    })
}

fn source_structure(source: &str) -> Option<String> {
    match path::dirname(source).as_str() {
        "." | "/" => None,
        dir => Some(dir.to_string()),
    }
}

fn resolve_structured(
    path_part: &TargetPart,
    subpath: Option<&TargetPart>,
    name: &TargetPart,
    source: &str,
    mapped: Option<&AutoMapping>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    match (path_part, mapped) {
        (TargetPart::Literal(dir), _) => parts.push(dir.clone()),
        (TargetPart::Auto, Some(mapped)) => {
            parts.push(mapped.directory.clone());
            parts.extend(mapped.structure.clone());
        }
        (TargetPart::AutoFlat, Some(mapped)) => parts.push(mapped.directory.clone()),
        _ => {}
    }

    match subpath {
        Some(TargetPart::Literal(sub)) => parts.push(sub.clone()),
        Some(TargetPart::Auto) => parts.extend(source_structure(source)),
        Some(TargetPart::AutoFlat) | None => {}
    }

    match (name, mapped) {
        (TargetPart::Literal(file_name), _) => parts.push(file_name.clone()),
        (_, Some(mapped)) => parts.push(mapped.file_name.clone()),
        (_, None) => parts.push(path::basename(source)),
    }

    path::join(&parts)
}
