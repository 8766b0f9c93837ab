//! # packmap
//!
//! A declarative transform-and-merge engine for game asset packs. Rules
//! declared in `_map.yaml` files next to the assets copy, rename, merge or
//! template-expand each file into the `RP/`, `BP/` and `data/` trees of the
//! output package.
//!
//! ## Quick Example
//!
//! ```
//! use packmap::merge::{merge, ListMergePolicy};
//! use packmap::template::{expand, Scope};
//! use serde_json::json;
//!
//! let scope = Scope::from_json(json!({"name": "pig"}).as_object().unwrap());
//! let expanded = expand(&json!({"id": "`'demo:' + name`"}), &scope).unwrap();
//! assert_eq!(expanded, Some(json!({"id": "demo:pig"})));
//!
//! let merged = merge(&json!({"a": [1]}), &json!({"a": [2]}), ListMergePolicy::Append);
//! assert_eq!(merged, json!({"a": [1, 2]}));
//! ```
//!
//! ## Core Concepts
//!
//! - **Declarations (`config`)**: the schema of declaration units and of the
//!   settings passed by a build pipeline.
//! - **Rules (`rules`)**: validated entries grouped per declaration unit,
//!   their target resolution, conflict handling and scheduling.
//! - **Auto-mapping (`auto_map`)**: suffix patterns that derive target paths
//!   from source file names.
//! - **Templates (`template`)**: a sandboxed expression language used in
//!   JSON trees and in `{expr: ... :}` text blocks.
//! - **Merging (`merge`)**: deep structural merge of JSON documents.
//!
//! ## Execution Flow
//!
//! 1. **Discovery**: find every declaration unit under the modules directory.
//! 2. **Loading**: parse and validate each unit into a rule set, expanding
//!    glob sources.
//! 3. **Scripts**: hand declared scripts to the configured bundler.
//! 4. **Apply**: run each set, parallel-safe entries first, then the
//!    order-sensitive ones in declaration order.

pub mod auto_map;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod merge;
pub mod output;
pub mod path;
pub mod project;
pub mod rules;
pub mod scripts;
pub mod template;

#[cfg(test)]
mod merge_proptest;
#[cfg(test)]
mod path_proptest;
