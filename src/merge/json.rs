//! JSON document helpers
//!
//! Reading, writing and merging JSON documents as text. Parse failures are
//! reported as [`Error::Content`] carrying the location of the document so a
//! broken source or target can be found quickly.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value as JsonValue;

use super::{merge, ListMergePolicy};
use crate::error::{Error, Result};

/// Parse JSON text, attributing failures to `location`
pub fn parse_document(content: &str, location: &str) -> Result<JsonValue> {
    serde_json::from_str(content).map_err(|err| Error::Content {
        location: location.to_string(),
        message: format!("Failed to parse JSON: {}", err),
    })
}

/// Serialize a value as tab-indented JSON with a trailing newline
pub fn to_pretty_string(value: &JsonValue) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let content = String::from_utf8(buffer).map_err(|err| Error::Content {
        location: "<serialized JSON>".to_string(),
        message: err.to_string(),
    })?;
    Ok(ensure_trailing_newline(content))
}

/// Merge `incoming` over the JSON document in `existing`.
///
/// Lists are appended, which is how repeated rules accumulate entries in a
/// shared target.
pub fn merge_into_document(existing: &str, incoming: &JsonValue, location: &str) -> Result<String> {
    let existing = parse_document(existing, location)?;
    let merged = merge(&existing, incoming, ListMergePolicy::Append);
    to_pretty_string(&merged)
}

fn ensure_trailing_newline(mut content: String) -> String {
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content
}
