//! Host filesystem access
//!
//! Thin wrappers over `std::fs` used by rule application. Every failure is
//! reported as [`Error::Filesystem`] naming the operation and the path, and
//! writes create missing parent directories first.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// What currently occupies a target path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Missing,
    File,
    Directory,
}

impl TargetState {
    pub fn of(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => TargetState::Directory,
            Ok(_) => TargetState::File,
            Err(_) => TargetState::Missing,
        }
    }
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to read file '{}': {}", path.display(), e),
    })
}

/// Create the parent directories of `path` if needed
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                message: format!("Failed to create directory '{}': {}", parent.display(), e),
            })
        }
        _ => Ok(()),
    }
}

/// Write `content` to `path`, replacing any existing file
pub fn write(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, content).map_err(|e| Error::Filesystem {
        message: format!("Failed to write file '{}': {}", path.display(), e),
    })
}

/// Copy a file byte for byte, keeping its permissions
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    ensure_parent(to)?;
    fs::copy(from, to).map(|_| ()).map_err(|e| Error::Filesystem {
        message: format!(
            "Failed to copy '{}' to '{}': {}",
            from.display(),
            to.display(),
            e
        ),
    })
}

pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to remove file '{}': {}", path.display(), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_target_state() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        assert_eq!(TargetState::of(&file), TargetState::Missing);
        fs::write(&file, "x").unwrap();
        assert_eq!(TargetState::of(&file), TargetState::File);
        assert_eq!(TargetState::of(temp.path()), TargetState::Directory);
    }

    #[test]
    fn test_write_creates_parents() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("RP/textures/items/sword.png");
        write(&target, b"png").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"png");
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("src.bin");
        fs::write(&source, [0u8, 159, 146, 150]).unwrap();
        let target = temp.path().join("BP/deep/copy.bin");
        copy_file(&source, &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), vec![0u8, 159, 146, 150]);
    }

    #[test]
    fn test_read_text_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_text(&temp.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, Error::Filesystem { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let source = temp.path().join("run.sh");
        fs::write(&source, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o755)).unwrap();
        let target = temp.path().join("BP/run.sh");
        copy_file(&source, &target).unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_remove_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("entry.js");
        fs::write(&file, "").unwrap();
        remove_file(&file).unwrap();
        assert!(!file.exists());
        assert!(remove_file(&file).is_err());
    }
}
