//! The staging directory guard.

use std::path::{Path, PathBuf};

use crate::core::error::ToolchainError;
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};

/// Exclusively owned working directory for one component build.
///
/// [`close`](StagingDir::close) removes it and reports failures; if the
/// guard is dropped without being closed (a panic unwinding through a
/// build), the directory is still removed on a best-effort basis.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    closed: bool,
}

impl StagingDir {
    /// Create a fresh, empty staging directory at `path`.
    ///
    /// Anything left at `path` by an earlier process that died mid-build is
    /// removed first.
    pub fn create(path: &Path) -> Result<Self, ToolchainError> {
        if path.exists() {
            tracing::warn!("removing leftover staging directory {}", path.display());
            remove_dir_all_if_exists(path)?;
        }
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        std::fs::create_dir(path).map_err(|e| ToolchainError::directory(path, e))?;

        Ok(StagingDir {
            path: path.to_path_buf(),
            closed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything in it.
    pub fn close(mut self) -> Result<(), ToolchainError> {
        self.closed = true;
        remove_dir_all_if_exists(&self.path)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = remove_dir_all_if_exists(&self.path) {
            tracing::warn!("failed to remove staging directory: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_and_close() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tc/build-tmp");

        let staging = StagingDir::create(&path).unwrap();
        assert!(staging.path().is_dir());
        std::fs::write(staging.path().join("config.log"), "log").unwrap();

        staging.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_leftover_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("build-tmp");
        std::fs::create_dir_all(path.join("binutils-build")).unwrap();

        let staging = StagingDir::create(&path).unwrap();

        assert_eq!(std::fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_removes_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("build-tmp");

        {
            let _staging = StagingDir::create(&path).unwrap();
            assert!(path.exists());
        }

        assert!(!path.exists());
    }
}
