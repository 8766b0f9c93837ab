//! Project discovery
//!
//! Build pipelines run packmap inside a temporary copy of the project. The
//! original project root is passed in the `ROOT_DIR` environment variable
//! and its `config.json` names the data directory under `regolith.dataPath`.
//! Both are only needed to locate the original script files.

use std::env;
use std::path::Path;

use serde_json::Value as JsonValue;

use crate::defaults::ROOT_DIR_ENV;
use crate::error::{Error, Result};
use crate::path;

/// Project root from `ROOT_DIR`, as a posix path
pub fn root_dir() -> Result<String> {
    match env::var(ROOT_DIR_ENV) {
        Ok(root) if !root.is_empty() => Ok(path::as_posix(&root)),
        _ => Err(Error::Project {
            message: format!("{} environment variable is not set", ROOT_DIR_ENV),
        }),
    }
}

/// `regolith.dataPath` from `<root>/config.json`
pub fn data_path(root: &str) -> Result<String> {
    let config_path = path::join(&[root, "config.json"]);
    let content = std::fs::read_to_string(Path::new(&config_path)).map_err(|err| Error::Project {
        message: format!("Failed to read {}: {}", config_path, err),
    })?;
    let config: JsonValue = serde_json::from_str(&content).map_err(|err| Error::Project {
        message: format!("Failed to parse {}: {}", config_path, err),
    })?;

    config
        .get("regolith")
        .and_then(|regolith| regolith.get("dataPath"))
        .and_then(JsonValue::as_str)
        .filter(|data_path| !data_path.is_empty())
        .map(path::as_posix)
        .ok_or_else(|| Error::Project {
            message: "Could not find regolith.dataPath in config.json".to_string(),
        })
}
