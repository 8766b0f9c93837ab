//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new()
//!     .with_auto_map(tables::BASIC)
//!     .with_unit("swords", "map:\n  - source: sword.item.png\n    target: ':autoFlat'\n")
//!     .with_source("swords", "sword.item.png", "png");
//! fixture.command().arg("apply").assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::tables;
    pub use super::TestFixture;
}

/// Auto-map tables used across tests.
#[allow(dead_code)]
pub mod tables {
    pub const BASIC: &str = r#"
.geo.json: RP/models/entity
.item.png:
  path: RP/textures/items
  extension: .png
.feature.json:
  path: BP/features
  extension: .json
.png: RP/textures/misc
"#;
}

/// A temporary working directory laid out like an output package.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the auto-map table into the default modules directory.
    pub fn with_auto_map(self, content: &str) -> Self {
        self.with_file("data/modular_mc/auto_map.yaml", content)
    }

    /// Write `_map.yaml` for the module `module`.
    pub fn with_unit(self, module: &str, content: &str) -> Self {
        self.with_file(&format!("data/modular_mc/{}/_map.yaml", module), content)
    }

    /// Write a source file next to the unit of `module`.
    pub fn with_source(self, module: &str, name: &str, content: &str) -> Self {
        self.with_file(&format!("data/modular_mc/{}/{}", module, name), content)
    }

    /// Write a file relative to the working directory.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Content of a file relative to the working directory.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// A `packmap` command running in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("packmap");
        cmd.current_dir(self.path()).env_remove("PACKMAP_MODULES").env_remove("PACKMAP_AUTO_MAP");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
