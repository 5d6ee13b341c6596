//! Destination directory layout.
//!
//! ```text
//! {destdir}/
//! ├── generic/              # architecture-independent installs + markers
//! ├── {target-triple}/
//! │   └── bin/              # target-specific installs
//! ├── build-tmp/            # staging, exists only during one component build
//! └── *.tar.{gz,bz2}        # downloaded sources (cache)
//! ```

use std::path::{Path, PathBuf};

use crate::core::component::{ComponentSpec, InstallScope};
use crate::core::error::ToolchainError;
use crate::util::config::ToolchainConfig;
use crate::util::fs::absolute;

/// Name of the transient staging directory under the destination root.
pub const STAGING_DIR_NAME: &str = "build-tmp";

/// Name of the architecture-independent install directory.
pub const GENERIC_DIR_NAME: &str = "generic";

/// Paths derived from the destination root and target triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    destdir: PathBuf,
    generic_dir: PathBuf,
    target_dir: PathBuf,
    build_dir: PathBuf,
}

impl Layout {
    /// Compute the layout for a destination root and target triple.
    ///
    /// A relative root is resolved against the current directory.
    pub fn new(destdir: impl Into<PathBuf>, target: &str) -> Self {
        let destdir = absolute(&destdir.into());
        Layout {
            generic_dir: destdir.join(GENERIC_DIR_NAME),
            target_dir: destdir.join(target),
            build_dir: destdir.join(STAGING_DIR_NAME),
            destdir,
        }
    }

    pub fn from_config(config: &ToolchainConfig) -> Self {
        Layout::new(&config.destdir, &config.target)
    }

    pub fn destdir(&self) -> &Path {
        &self.destdir
    }

    pub fn generic_dir(&self) -> &Path {
        &self.generic_dir
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// The staging directory (`{destdir}/build-tmp`).
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Downloaded sources are cached directly under the destination root.
    pub fn cache_dir(&self) -> &Path {
        &self.destdir
    }

    /// Install prefix for a component with the given scope.
    pub fn install_dir(&self, scope: InstallScope) -> &Path {
        match scope {
            InstallScope::Generic => &self.generic_dir,
            InstallScope::Target => &self.target_dir,
        }
    }

    /// Marker recording that this exact name+version has been installed.
    pub fn marker_path(&self, spec: &ComponentSpec) -> PathBuf {
        self.install_dir(spec.scope).join(spec.marker_name())
    }

    /// Whether the marker for `spec` exists.
    pub fn is_installed(&self, spec: &ComponentSpec) -> bool {
        self.marker_path(spec).exists()
    }

    /// Create `generic/` and `{triple}/bin/` if they are absent.
    pub fn create_install_dirs(&self) -> Result<(), ToolchainError> {
        for dir in [self.generic_dir.clone(), self.target_dir.join("bin")] {
            std::fs::create_dir_all(&dir).map_err(|e| ToolchainError::directory(&dir, e))?;
        }
        Ok(())
    }
}
