//! Structural merge of JSON-like data trees
//!
//! This module provides the deep merge used by `onConflict: merge` rules.
//! Two trees are combined recursively; wherever they cannot be combined the
//! value from the second tree (`b`) wins.
//!
//! ## Rules
//!
//! - Values of different kinds (scalar, object, list, absent): `b` wins.
//! - Objects: the union of keys, `a`'s key order first followed by the keys
//!   only present in `b`. Shared keys are merged recursively.
//! - Lists: combined according to a [`ListMergePolicy`].
//! - `null` is an ordinary scalar; it overwrites and is overwritten.
//!
//! ## Example
//!
//! ```
//! use packmap::merge::{merge, ListMergePolicy};
//! use serde_json::json;
//!
//! let a = json!({"tags": ["a"], "name": "old"});
//! let b = json!({"tags": ["b"], "size": 2});
//! let merged = merge(&a, &b, ListMergePolicy::Append);
//! assert_eq!(merged, json!({"tags": ["a", "b"], "name": "old", "size": 2}));
//! ```

pub mod json;

use serde_json::{Map, Value};

/// File types whose content can be deep merged
pub const MERGEABLE_TYPES: &[&str] = &["json", "material"];

/// Whether a file type tag belongs to the mergeable set
pub fn is_mergeable(file_type: &str) -> bool {
    MERGEABLE_TYPES.contains(&file_type)
}

/// Policy for combining two lists during a deep merge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListMergePolicy {
    /// Result has the length of the longer list
    #[default]
    GreaterLength,
    /// Result has the length of the shorter list
    SmallerLength,
    /// Result has the length of `b`
    BLength,
    /// Items of `b` are appended after the items of `a`
    Append,
}

/// Merge `b` into `a` and return the combined tree.
///
/// Neither input is modified.
pub fn merge(a: &Value, b: &Value, policy: ListMergePolicy) -> Value {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => Value::Object(merge_maps(a, b, policy)),
        (Value::Array(a), Value::Array(b)) => Value::Array(merge_lists(a, b, policy)),
        _ => b.clone(),
    }
}

/// Merge two values where either side may be absent.
///
/// An absent `b` keeps `a`; an absent `a` takes `b`; two absent values stay
/// absent.
pub fn merge_optional(a: Option<&Value>, b: Option<&Value>, policy: ListMergePolicy) -> Option<Value> {
    match (a, b) {
        (Some(a), Some(b)) => Some(merge(a, b, policy)),
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (None, None) => None,
    }
}

fn merge_maps(a: &Map<String, Value>, b: &Map<String, Value>, policy: ListMergePolicy) -> Map<String, Value> {
    let mut result = Map::new();

    for (key, a_value) in a {
        let merged = match b.get(key) {
            Some(b_value) => merge(a_value, b_value, policy),
            None => a_value.clone(),
        };
        result.insert(key.clone(), merged);
    }
    for (key, b_value) in b {
        if !a.contains_key(key) {
            result.insert(key.clone(), b_value.clone());
        }
    }

    result
}

fn merge_lists(a: &[Value], b: &[Value], policy: ListMergePolicy) -> Vec<Value> {
    let len = match policy {
        ListMergePolicy::GreaterLength => a.len().max(b.len()),
        ListMergePolicy::SmallerLength => a.len().min(b.len()),
        ListMergePolicy::BLength => b.len(),
        ListMergePolicy::Append => return a.iter().chain(b.iter()).cloned().collect(),
    };

    (0..len)
        .filter_map(|i| merge_optional(a.get(i), b.get(i), policy))
        .collect()
}
