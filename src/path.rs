//! Path manipulation utilities for packmap
//!
//! Every path that flows through the engine is a posix string: backslashes
//! are turned into forward slashes and `.`/`..` segments are collapsed
//! lexically, so target paths compare and print the same on every platform.

use std::path::Path;

use crate::error::{Error, Result};

/// Ensure a path uses forward slashes regardless of platform
pub fn as_posix(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lexically normalize a path.
///
/// Collapses `.` segments and duplicate separators, resolves `..` against the
/// preceding segment where possible and drops any trailing slash. An empty
/// result becomes `"."`.
pub fn normalize(path: &str) -> String {
    let path = as_posix(path);
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `/..` stays at the root
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join path segments and normalize the result
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    normalize(&joined)
}

/// Resolve `path` against `base` unless it is already absolute
pub fn resolve(base: &str, path: &str) -> String {
    if is_absolute(path) {
        normalize(path)
    } else {
        join(&[base, path])
    }
}

/// Return the relative path from `from` to `to` as a posix path
pub fn relative(from: &str, to: &str) -> Result<String> {
    pathdiff::diff_paths(Path::new(to), Path::new(from))
        .map(|p| {
            let rel = as_posix(&p.to_string_lossy());
            if rel.is_empty() {
                ".".to_string()
            } else {
                rel
            }
        })
        .ok_or_else(|| Error::Path {
            message: format!("Cannot express {} relative to {}", to, from),
        })
}

/// Return the directory part of a path
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Return the last segment of a path
pub fn basename(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

/// Lowercase extension of the last segment, without the leading dot
pub fn extension(path: &str) -> String {
    Path::new(&basename(path))
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Whether a path is absolute (posix root or a platform-absolute path)
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || Path::new(path).is_absolute()
}

/// Whether `path` is `base` or lies underneath it, compared lexically
pub fn is_within(base: &str, path: &str) -> bool {
    let base = normalize(base);
    let path = normalize(path);
    if base == "/" {
        return path.starts_with('/');
    }
    path == base || path.starts_with(&format!("{}/", base))
}

/// Whether a declared path contains glob metacharacters
pub fn has_glob_chars(path: &str) -> bool {
    path.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("RP/textures/./items/"), "RP/textures/items");
        assert_eq!(normalize("BP/a/fake/../b"), "BP/a/b");
        assert_eq!(normalize("./a//b"), "a/b");
        assert_eq!(normalize("../a"), "../a");
        assert_eq!(normalize("a/../.."), "..");
        assert_eq!(normalize("/../a"), "/a");
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("a\\b\\c"), "a/b/c");
    }

    #[test]
    fn test_join_and_resolve() {
        assert_eq!(join(&["RP/models", "", "mobs/dragon", "d.json"]), "RP/models/mobs/dragon/d.json");
        assert_eq!(resolve("/work/data/m", "sub/x.json"), "/work/data/m/sub/x.json");
        assert_eq!(resolve("/work/data/m", "/abs/x.json"), "/abs/x.json");
    }

    #[test]
    fn test_relative() {
        assert_eq!(relative("/work/data", "/work/data/m/x.json").unwrap(), "m/x.json");
        assert_eq!(relative("/work/data/m", "/work/shared/x.json").unwrap(), "../../shared/x.json");
        assert_eq!(relative("/work", "/work").unwrap(), ".");
    }

    #[test]
    fn test_dirname_and_basename() {
        assert_eq!(dirname("mobs/dragon/dragon.geo.json"), "mobs/dragon");
        assert_eq!(dirname("dragon.geo.json"), ".");
        assert_eq!(dirname("/dragon.geo.json"), "/");
        assert_eq!(basename("mobs/dragon/dragon.geo.json"), "dragon.geo.json");
        assert_eq!(basename("dragon.geo.json"), "dragon.geo.json");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("mobs/dragon.geo.json"), "json");
        assert_eq!(extension("RP/materials/Entity.MATERIAL"), "material");
        assert_eq!(extension("README"), "");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("/work", "/work/data/x.json"));
        assert!(is_within("/work", "/work"));
        assert!(!is_within("/work", "/workshop/x.json"));
        assert!(!is_within("/work", "/work/../etc/passwd"));
    }

    #[test]
    fn test_has_glob_chars() {
        assert!(has_glob_chars("**/*.json"));
        assert!(has_glob_chars("item_?.json"));
        assert!(has_glob_chars("[ab].json"));
        assert!(!has_glob_chars("items/sword.json"));
    }
}
