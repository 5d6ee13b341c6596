//! Archive unpacking, dispatched on file name suffix.

use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::core::error::ToolchainError;
use crate::util::fs::absolute;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Recognised source archive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    TarBz2,
}

impl ArchiveKind {
    /// Classify a file by its name. Anything unrecognised returns `None`
    /// and is left for the recipe to deal with.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".tar.gz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar.bz2") {
            Some(ArchiveKind::TarBz2)
        } else {
            None
        }
    }
}

/// Unpack `archive` into `dest` if it is a recognised archive kind.
///
/// Returns whether anything was unpacked.
pub fn unpack(
    archive: &Path,
    dest: &Path,
    runner: &dyn CommandRunner,
) -> Result<bool, ToolchainError> {
    match ArchiveKind::from_path(archive) {
        Some(ArchiveKind::TarGz) => {
            tracing::info!("Extracting {}", archive.display());
            extract_tar_gz(archive, dest)?;
            Ok(true)
        }
        Some(ArchiveKind::TarBz2) => {
            tracing::info!("Extracting {}", archive.display());
            // No bzip2 decoder in-process; the host tar handles it.
            let cmd = ProcessBuilder::new("tar")
                .arg("-xjf")
                .arg(absolute(archive))
                .cwd(dest);
            runner
                .execute(&cmd, 0)
                .map_err(|e| ToolchainError::Unpack {
                    path: archive.to_path_buf(),
                    message: e.to_string(),
                })?;
            Ok(true)
        }
        None => {
            tracing::debug!("not an archive, leaving as is: {}", archive.display());
            Ok(false)
        }
    }
}

/// Extract a gzip-compressed tarball into `dest`.
///
/// Entries whose paths would land outside `dest` are rejected.
pub fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<(), ToolchainError> {
    let unpack_err = |message: String| ToolchainError::Unpack {
        path: archive.to_path_buf(),
        message,
    };

    let file = File::open(archive).map_err(|e| unpack_err(e.to_string()))?;
    let mut tarball = Archive::new(GzDecoder::new(file));

    std::fs::create_dir_all(dest).map_err(|e| ToolchainError::directory(dest, e))?;

    let entries = tarball
        .entries()
        .map_err(|e| unpack_err(format!("failed to read entries: {}", e)))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| unpack_err(format!("failed to read entry: {}", e)))?;
        let entry_path = entry
            .path()
            .map_err(|e| unpack_err(format!("invalid entry path: {}", e)))?
            .into_owned();

        let unpacked = entry.unpack_in(dest).map_err(|e| {
            unpack_err(format!(
                "failed to extract {}: {}",
                entry_path.display(),
                e
            ))
        })?;
        if !unpacked {
            return Err(unpack_err(format!(
                "entry escapes destination directory: {}",
                entry_path.display()
            )));
        }
    }

    Ok(())
}
