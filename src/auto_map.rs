//! Auto-map resolution
//!
//! Rules whose target is `:auto` or `:autoFlat` have their destination
//! derived from the source file name. The auto-map table is an ordered list
//! of suffix patterns; the first pattern that the file name ends with picks
//! the target directory and, optionally, a replacement extension.
//!
//! ```yaml
//! .geo.json: RP/models/entity
//! .item.png:
//!   path: RP/textures/items
//!   extension: .png
//! ```
//!
//! With this table `mobs/dragon/dragon.geo.json` maps to
//! `RP/models/entity/mobs/dragon/dragon.geo.json` (structure preserved) or
//! `RP/models/entity/dragon.geo.json` (flattened), and `sword.item.png` maps
//! to `RP/textures/items/sword.png`.
//!
//! Patterns are tried in declaration order, so a general pattern such as
//! `.json` listed before `.geo.json` shadows it.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::path;

/// File name of the table inside the modules directory
pub const DEFAULT_FILE_NAME: &str = "auto_map.yaml";

/// Target of one auto-map pattern
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AutoMapSpec {
    /// Target directory; the matched suffix is kept
    Directory(String),
    /// Target directory plus a replacement for the matched suffix
    Entry {
        #[serde(alias = "target", alias = "directory")]
        path: String,
        #[serde(default)]
        extension: Option<String>,
    },
}

impl AutoMapSpec {
    fn directory(&self) -> &str {
        match self {
            AutoMapSpec::Directory(dir) => dir,
            AutoMapSpec::Entry { path, .. } => path,
        }
    }

    fn extension(&self) -> Option<&str> {
        match self {
            AutoMapSpec::Directory(_) => None,
            AutoMapSpec::Entry { extension, .. } => extension.as_deref().filter(|e| !e.is_empty()),
        }
    }
}

/// The pieces an auto-mapped target is assembled from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoMapping {
    /// Directory from the matching table entry
    pub directory: String,
    /// Parent directory of the source, if it has one
    pub structure: Option<String>,
    /// Source stem plus the replacement (or matched) suffix
    pub file_name: String,
}

impl AutoMapping {
    /// Assemble the target path, keeping the source structure unless `flatten`
    pub fn target(&self, flatten: bool) -> String {
        match (&self.structure, flatten) {
            (Some(structure), false) => path::join(&[&self.directory, structure, &self.file_name]),
            _ => path::join(&[&self.directory, &self.file_name]),
        }
    }
}

/// Ordered suffix pattern table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoMapTable {
    patterns: Vec<(String, AutoMapSpec)>,
}

impl AutoMapTable {
    pub fn new(patterns: Vec<(String, AutoMapSpec)>) -> Self {
        Self { patterns }
    }

    /// Parse a YAML (or JSON) mapping, keeping the declared pattern order
    pub fn parse(content: &str, location: &str) -> Result<Self> {
        let document: serde_yaml::Value = serde_yaml::from_str(content).map_err(|err| Error::AutoMap {
            message: format!("Failed to parse {}: {}", location, err),
        })?;

        let mapping = match document {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => {
                return Err(Error::AutoMap {
                    message: format!("{} must contain a mapping of suffix patterns", location),
                })
            }
        };

        let mut patterns = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let pattern = key.as_str().map(str::to_string).ok_or_else(|| Error::AutoMap {
                message: format!("Pattern keys in {} must be strings", location),
            })?;
            let spec = serde_yaml::from_value::<AutoMapSpec>(value).map_err(|err| Error::AutoMap {
                message: format!("Invalid target for pattern '{}' in {}: {}", pattern, location, err),
            })?;
            patterns.push((pattern, spec));
        }
        Ok(Self { patterns })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::AutoMap {
            message: format!("Failed to load auto-map table from {}: {}", path.display(), err),
        })?;
        Self::parse(&content, &path::as_posix(&path.to_string_lossy()))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First pattern that `file_name` ends with
    fn find(&self, file_name: &str) -> Option<(&str, &AutoMapSpec)> {
        self.patterns
            .iter()
            .find(|(pattern, _)| file_name.ends_with(pattern.as_str()))
            .map(|(pattern, spec)| (pattern.as_str(), spec))
    }

    /// Split the mapped target of `source_path` into its parts
    pub fn resolve_parts(&self, source_path: &str) -> Option<AutoMapping> {
        let source_path = path::as_posix(source_path);
        let file_name = path::basename(&source_path);
        let (pattern, spec) = self.find(&file_name)?;

        let stem = &file_name[..file_name.len() - pattern.len()];
        let file_name = format!("{}{}", stem, spec.extension().unwrap_or(pattern));

        let parent = path::dirname(&source_path);
        let structure = match parent.as_str() {
            "." | "" | "/" => None,
            dir => Some(dir.to_string()),
        };

        Some(AutoMapping {
            directory: spec.directory().to_string(),
            structure,
            file_name,
        })
    }

    /// Mapped target path of `source_path`, or `None` if no pattern matches
    pub fn resolve(&self, source_path: &str, flatten: bool) -> Option<String> {
        self.resolve_parts(source_path).map(|parts| parts.target(flatten))
    }
}

/// Lazily loaded auto-map table.
///
/// The table file is read on first use and shared read-only afterwards;
/// concurrent first uses load it once. A load failure is remembered and
/// reported to every caller.
#[derive(Debug)]
pub struct AutoMapResolver {
    path: PathBuf,
    table: OnceLock<std::result::Result<AutoMapTable, String>>,
}

impl AutoMapResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceLock::new(),
        }
    }

    /// A resolver over an already loaded table
    pub fn from_table(table: AutoMapTable) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(table));
        Self {
            path: PathBuf::new(),
            table: cell,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> Result<&AutoMapTable> {
        self.table
            .get_or_init(|| {
                log::debug!("Loading auto-map table from {}", self.path.display());
                AutoMapTable::from_file(&self.path).map_err(|err| match err {
                    Error::AutoMap { message } => message,
                    other => other.to_string(),
                })
            })
            .as_ref()
            .map_err(|message| Error::AutoMap {
                message: message.clone(),
            })
    }

    pub fn resolve_parts(&self, source_path: &str) -> Result<Option<AutoMapping>> {
        Ok(self.table()?.resolve_parts(source_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TABLE: &str = r#"
.geo.json: RP/models/entity
.block.json: BP/blocks
.item.png:
  target: RP/textures/items
  extension: .png
.entity.tga:
  path: RP/textures/entity
  extension: .tga
.mc.language.json:
  directory: texts/languages
  extension: .lang
.special.json: data/special
.json: data/general
"#;

    fn table() -> AutoMapTable {
        AutoMapTable::parse(TABLE, "auto_map.yaml").unwrap()
    }

    #[test]
    fn test_basic_string_mapping() {
        assert_eq!(
            table().resolve("mymodel.geo.json", false),
            Some("RP/models/entity/mymodel.geo.json".to_string())
        );
    }

    #[test]
    fn test_preserve_structure() {
        assert_eq!(
            table().resolve("mobs/dragon/dragon.geo.json", false),
            Some("RP/models/entity/mobs/dragon/dragon.geo.json".to_string())
        );
    }

    #[test]
    fn test_flatten_structure() {
        assert_eq!(
            table().resolve("mobs/dragon/dragon.geo.json", true),
            Some("RP/models/entity/dragon.geo.json".to_string())
        );
    }

    #[test]
    fn test_extension_replacement() {
        assert_eq!(
            table().resolve("sword.item.png", false),
            Some("RP/textures/items/sword.png".to_string())
        );
        assert_eq!(
            table().resolve("en_US.mc.language.json", false),
            Some("texts/languages/en_US.lang".to_string())
        );
    }

    #[test]
    fn test_unknown_suffix() {
        assert_eq!(table().resolve("unknown.xyz", false), None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            table().resolve("config.special.json", false),
            Some("data/special/config.special.json".to_string())
        );
        assert_eq!(
            table().resolve("simple.json", false),
            Some("data/general/simple.json".to_string())
        );
    }

    #[test]
    fn test_general_pattern_first_shadows_specific() {
        let table = AutoMapTable::parse(".json: data/general\n.geo.json: RP/models\n", "t").unwrap();
        assert_eq!(
            table.resolve("a.geo.json", true),
            Some("data/general/a.geo.json".to_string())
        );
    }

    #[test]
    fn test_dot_segments_in_source_dir_are_collapsed() {
        assert_eq!(
            table().resolve("./mobs/./dragon/dragon.geo.json", false),
            Some("RP/models/entity/mobs/dragon/dragon.geo.json".to_string())
        );
    }

    #[test]
    fn test_resolve_parts() {
        let parts = table().resolve_parts("mobs/sword.item.png").unwrap();
        assert_eq!(parts.directory, "RP/textures/items");
        assert_eq!(parts.structure.as_deref(), Some("mobs"));
        assert_eq!(parts.file_name, "sword.png");
    }

    #[test]
    fn test_json_table() {
        let table = AutoMapTable::parse(r#"{".png": "RP/textures/misc"}"#, "auto_map.json").unwrap();
        assert_eq!(table.resolve("a.png", false), Some("RP/textures/misc/a.png".to_string()));
    }

    #[test]
    fn test_invalid_tables() {
        assert!(AutoMapTable::parse("- a\n- b\n", "t").is_err());
        let err = AutoMapTable::parse(".png: [1, 2]\n", "t").unwrap_err();
        assert!(err.to_string().contains("Invalid target for pattern '.png'"));
        assert!(AutoMapTable::parse("", "t").unwrap().is_empty());
    }

    #[test]
    fn test_resolver_loads_lazily_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_FILE_NAME);
        std::fs::write(&file, TABLE).unwrap();

        let resolver = AutoMapResolver::new(&file);
        assert_eq!(
            resolver.resolve_parts("sword.item.png").unwrap().map(|m| m.target(true)),
            Some("RP/textures/items/sword.png".to_string())
        );
        // later edits are not picked up once loaded
        std::fs::write(&file, ".png: elsewhere\n").unwrap();
        assert_eq!(resolver.table().unwrap().len(), 7);
    }

    #[test]
    fn test_resolver_reports_missing_file_every_time() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = AutoMapResolver::new(dir.path().join("missing.yaml"));
        assert!(matches!(resolver.table(), Err(Error::AutoMap { .. })));
        let err = resolver.resolve_parts("a.png").unwrap_err();
        assert!(err.to_string().contains("Failed to load auto-map table"));
    }

    #[test]
    fn test_resolver_shared_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(DEFAULT_FILE_NAME);
        std::fs::write(&file, TABLE).unwrap();
        let resolver = Arc::new(AutoMapResolver::new(&file));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                std::thread::spawn(move || resolver.resolve_parts("x.block.json").unwrap().map(|m| m.target(true)))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("BP/blocks/x.block.json".to_string()));
        }
    }
}
