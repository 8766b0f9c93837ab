//! # Declaration Schema and Settings
//!
//! This module defines the data structures that represent declaration units
//! (`_map.yaml`, `_map.yml`, `_map.json`) and the settings object a build
//! pipeline passes to `packmap apply`, together with the logic for parsing
//! them.
//!
//! ## Declaration units
//!
//! ```yaml
//! map:
//!   - source: sword.item.png
//!     target: ":autoFlat"
//!   - source: sword.json
//!     target: BP/items/sword.json
//!     jsonTemplate: true
//!     onConflict: merge
//!     scope:
//!       damage: 7
//! scripts:
//!   - sword.ts
//! ```
//!
//! `map` and `scripts` are also accepted in upper case (`MAP`, `SCRIPTS`).
//! A rule's `target` is either a string (a path, `:auto` or `:autoFlat`) or
//! a mapping with `path`, `subpath` and `name` parts (`directory` and
//! `filename` are accepted as aliases). Unknown fields are rejected so that
//! typos surface at load time instead of being silently ignored.
//!
//! ## Settings
//!
//! ```json
//! {"scope": {"namespace": "demo"}, "autoMap": "auto_map.yaml",
//!  "bundler": {"command": "esbuild", "args": ["--bundle"]}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::defaults;
use crate::error::{Error, Result};

/// What to do when a rule's target already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictPolicy {
    /// Fail the rule
    #[default]
    Stop,
    /// Leave the existing file alone
    Skip,
    /// Deep merge the source into the existing file
    Merge,
    /// Replace the existing file
    Overwrite,
    /// Insert the source text before the existing text
    AppendStart,
    /// Add the source text after the existing text
    AppendEnd,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Stop => "stop",
            ConflictPolicy::Skip => "skip",
            ConflictPolicy::Merge => "merge",
            ConflictPolicy::Overwrite => "overwrite",
            ConflictPolicy::AppendStart => "appendStart",
            ConflictPolicy::AppendEnd => "appendEnd",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `target` of a rule as written in a declaration unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetDecl {
    /// A path, `:auto` or `:autoFlat`
    Path(String),
    /// Separate path, subpath and name parts
    Structured(StructuredTargetDecl),
}

/// A target split into parts; missing `path` and `name` default to `:auto`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredTargetDecl {
    #[serde(default, alias = "directory", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    #[serde(default, alias = "filename", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One rule as written in a declaration unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleDecl {
    /// Source path or glob, relative to the declaration unit
    pub source: String,
    pub target: TargetDecl,
    #[serde(default)]
    pub json_template: bool,
    #[serde(default)]
    pub text_template: bool,
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
    /// Overrides the file type otherwise taken from the extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Variables for template expressions, layered over the global scope
    #[serde(default)]
    pub scope: Map<String, JsonValue>,
}

/// Contents of one declaration unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationUnit {
    #[serde(default, alias = "MAP")]
    pub map: Vec<RuleDecl>,
    /// Script references, relative to the declaration unit
    #[serde(default, alias = "SCRIPTS")]
    pub scripts: Vec<String>,
}

impl DeclarationUnit {
    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && self.scripts.is_empty()
    }
}

/// Settings passed to `packmap apply` as a JSON argument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Global scope for template expressions
    pub scope: Map<String, JsonValue>,
    /// Auto-map table location, relative to the working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_map: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundler: Option<BundlerSettings>,
}

/// External command that bundles the declared scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerSettings {
    pub command: String,
    /// Extra arguments placed before the entry file
    #[serde(default)]
    pub args: Vec<String>,
    /// Bundle location, relative to the working directory
    #[serde(default = "default_outfile")]
    pub outfile: String,
    /// Bundle location relative to `ROOT_DIR`; takes precedence over `outfile`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_path: Option<String>,
}

/// Default bundle location
///
/// ```
/// use packmap::config::default_outfile;
///
/// assert_eq!(default_outfile(), "BP/scripts/main.js");
/// ```
pub fn default_outfile() -> String {
    defaults::DEFAULT_OUTFILE.to_string()
}

/// Parse a declaration unit; `.json` files are read as JSON, others as YAML
pub fn parse_unit(content: &str, path: &str) -> Result<DeclarationUnit> {
    let parsed = if path.to_lowercase().ends_with(".json") {
        serde_json::from_str::<Option<DeclarationUnit>>(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<Option<DeclarationUnit>>(content).map_err(|e| e.to_string())
    };

    match parsed {
        Ok(unit) => Ok(unit.unwrap_or_default()),
        Err(message) => {
            let hint = if message.contains("unknown field") {
                Some(
                    "rule fields are source, target, jsonTemplate, textTemplate, onConflict, fileType and scope"
                        .to_string(),
                )
            } else if message.contains("unknown variant") {
                Some(
                    "onConflict must be one of stop, skip, merge, overwrite, appendStart, appendEnd"
                        .to_string(),
                )
            } else {
                None
            };
            Err(Error::Declaration {
                path: path.to_string(),
                message,
                hint,
            })
        }
    }
}

/// Parse the settings JSON
pub fn parse_settings(json: &str) -> Result<Settings> {
    if json.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_json::from_str(json).map_err(|err| Error::Declaration {
        path: "settings".to_string(),
        message: err.to_string(),
        hint: None,
    })
}

/// Parse a JSON object used as global scope
pub fn parse_scope(json: &str) -> Result<Map<String, JsonValue>> {
    match serde_json::from_str::<JsonValue>(json)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::Declaration {
            path: "scope".to_string(),
            message: format!("scope must be a JSON object, got {}", other),
            hint: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_unit_full_rule() {
        let yaml = r#"
map:
  - source: sword.json
    target: BP/items/sword.json
    jsonTemplate: true
    onConflict: appendEnd
    fileType: json
    scope:
      damage: 7
scripts:
  - sword.ts
"#;
        let unit = parse_unit(yaml, "_map.yaml").unwrap();
        assert_eq!(unit.map.len(), 1);
        let rule = &unit.map[0];
        assert_eq!(rule.source, "sword.json");
        assert_eq!(rule.target, TargetDecl::Path("BP/items/sword.json".into()));
        assert!(rule.json_template);
        assert!(!rule.text_template);
        assert_eq!(rule.on_conflict, ConflictPolicy::AppendEnd);
        assert_eq!(rule.file_type.as_deref(), Some("json"));
        assert_eq!(rule.scope.get("damage"), Some(&json!(7)));
        assert_eq!(unit.scripts, vec!["sword.ts"]);
    }

    #[test]
    fn test_parse_unit_defaults() {
        let unit = parse_unit("map:\n  - source: a.png\n    target: ':auto'\n", "_map.yml").unwrap();
        let rule = &unit.map[0];
        assert_eq!(rule.on_conflict, ConflictPolicy::Stop);
        assert!(rule.scope.is_empty());
        assert!(unit.scripts.is_empty());
    }

    #[test]
    fn test_parse_unit_upper_case_keys() {
        let unit = parse_unit("MAP: []\nSCRIPTS: [a.ts]\n", "_map.yaml").unwrap();
        assert_eq!(unit.scripts, vec!["a.ts"]);
    }

    #[test]
    fn test_parse_unit_structured_target() {
        let yaml = r#"
map:
  - source: a.geo.json
    target:
      directory: RP/models/custom
      subpath: ":auto"
  - source: b.png
    target:
      filename: b_renamed.png
"#;
        let unit = parse_unit(yaml, "_map.yaml").unwrap();
        assert_eq!(
            unit.map[0].target,
            TargetDecl::Structured(StructuredTargetDecl {
                path: Some("RP/models/custom".into()),
                subpath: Some(":auto".into()),
                name: None,
            })
        );
        assert_eq!(
            unit.map[1].target,
            TargetDecl::Structured(StructuredTargetDecl {
                path: None,
                subpath: None,
                name: Some("b_renamed.png".into()),
            })
        );
    }

    #[test]
    fn test_parse_unit_json() {
        let json = r#"{"map": [{"source": "a.json", "target": "BP/a.json", "onConflict": "merge"}]}"#;
        let unit = parse_unit(json, "_map.json").unwrap();
        assert_eq!(unit.map[0].on_conflict, ConflictPolicy::Merge);
    }

    #[test]
    fn test_parse_unit_empty_file() {
        let unit = parse_unit("", "_map.yaml").unwrap();
        assert!(unit.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected_with_hint() {
        let yaml = "map:\n  - source: a\n    target: BP/a\n    onConflit: merge\n";
        let err = parse_unit(yaml, "mod/_map.yaml").unwrap_err();
        let display = err.to_string();
        assert!(display.contains("mod/_map.yaml"));
        assert!(display.contains("unknown field"));
        assert!(display.contains("hint"));
    }

    #[test]
    fn test_unknown_conflict_policy_rejected() {
        let yaml = "map:\n  - source: a\n    target: BP/a\n    onConflict: replace\n";
        let err = parse_unit(yaml, "_map.yaml").unwrap_err();
        assert!(matches!(err, Error::Declaration { hint: Some(_), .. }));
    }

    #[test]
    fn test_missing_target_rejected() {
        assert!(parse_unit("map:\n  - source: a\n", "_map.yaml").is_err());
    }

    #[test]
    fn test_conflict_policy_names() {
        for policy in [
            ConflictPolicy::Stop,
            ConflictPolicy::Skip,
            ConflictPolicy::Merge,
            ConflictPolicy::Overwrite,
            ConflictPolicy::AppendStart,
            ConflictPolicy::AppendEnd,
        ] {
            let json = serde_json::to_string(&policy).unwrap();
            assert_eq!(json, format!("\"{}\"", policy));
        }
    }

    #[test]
    fn test_parse_settings() {
        let settings = parse_settings(
            r#"{"scope": {"ns": "demo"}, "autoMap": "maps/auto.yaml",
                "bundler": {"command": "esbuild", "args": ["--bundle"], "buildPath": "out/main.js"}}"#,
        )
        .unwrap();
        assert_eq!(settings.scope.get("ns"), Some(&json!("demo")));
        assert_eq!(settings.auto_map.as_deref(), Some("maps/auto.yaml"));
        let bundler = settings.bundler.unwrap();
        assert_eq!(bundler.command, "esbuild");
        assert_eq!(bundler.outfile, "BP/scripts/main.js");
        assert_eq!(bundler.build_path.as_deref(), Some("out/main.js"));
    }

    #[test]
    fn test_parse_settings_empty() {
        assert_eq!(parse_settings("  ").unwrap(), Settings::default());
        assert_eq!(parse_settings("{}").unwrap(), Settings::default());
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!(parse_scope(r#"{"a": 1}"#).unwrap().get("a"), Some(&json!(1)));
        assert!(parse_scope("[1]").is_err());
        assert!(parse_scope("{").is_err());
    }
}
