//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::ToolchainError;

/// Remove a directory and all its contents, if it exists.
///
/// A symlink or plain file at `path` is removed without following it.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<(), ToolchainError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ToolchainError::directory(path, e)),
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| ToolchainError::directory(path, e))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<(), ToolchainError> {
    fs::create_dir_all(path).map_err(|e| ToolchainError::directory(path, e))
}

/// Resolve `path` against the current directory.
///
/// Paths handed to child processes must not depend on the child's working
/// directory. An empty path is returned unchanged.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Create an empty file at `path`, creating parent directories if needed.
pub fn touch(path: &Path) -> Result<(), ToolchainError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::File::create(path)
        .map(drop)
        .map_err(|e| ToolchainError::directory(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("build-tmp");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/file.o"), "obj").unwrap();

        remove_dir_all_if_exists(&dir).unwrap();
        assert!(!dir.exists());

        // Missing is fine.
        remove_dir_all_if_exists(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_symlink_does_not_follow() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("keep"), "").unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        remove_dir_all_if_exists(&link).unwrap();

        assert!(!link.exists());
        assert!(real.join("keep").exists());
    }

    #[test]
    fn test_absolute_resolves_against_current_dir() {
        let cwd = std::env::current_dir().unwrap();

        assert_eq!(absolute(Path::new("build/tools")), cwd.join("build/tools"));
        assert_eq!(absolute(Path::new("/opt/tc")), PathBuf::from("/opt/tc"));
    }

    #[test]
    fn test_touch_creates_empty_file() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("generic/.binutils-2.28.1-installed");

        touch(&marker).unwrap();

        assert_eq!(fs::metadata(&marker).unwrap().len(), 0);
    }
}
