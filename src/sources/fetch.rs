//! Source fetching.
//!
//! Sources are cached by file name. A file already present in the cache is
//! trusted as-is; fresh downloads go to `{name}.part` and are renamed into
//! place only once complete, so an interrupted transfer is never mistaken
//! for a finished one.

use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

use crate::core::error::ToolchainError;
use crate::sources::archive;
use crate::util::process::CommandRunner;

/// Suffix for in-progress downloads.
const PART_SUFFIX: &str = ".part";

/// Transfers one URL to a local file.
pub trait Fetcher {
    /// Fetch `url` into `dest`, overwriting it.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ToolchainError>;
}

/// HTTP(S) fetcher backed by a blocking reqwest client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    show_progress: bool,
}

impl HttpFetcher {
    /// Connect timeout for source downloads.
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Result<Self, ToolchainError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("crosstool/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Self::CONNECT_TIMEOUT)
            // Large tarballs over slow links; no overall deadline.
            .timeout(None)
            .build()
            .map_err(|e| ToolchainError::Download {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(HttpFetcher {
            client,
            show_progress: io::stderr().is_terminal(),
        })
    }

    fn progress_bar(&self, total: Option<u64>, name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(
                    "{msg:>12} [{bar:30}] {bytes}/{total_bytes} ({eta})",
                ) {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar.set_message(name.to_string());
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_message(name.to_string());
                bar
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), ToolchainError> {
        let download_err = |message: String| ToolchainError::Download {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| download_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_err(format!("HTTP {}", response.status())));
        }

        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(PART_SUFFIX).to_string())
            .unwrap_or_default();
        let bar = self.progress_bar(response.content_length(), &name);

        let mut file = File::create(dest).map_err(|e| download_err(e.to_string()))?;
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let n = response
                .read(&mut buffer)
                .map_err(|e| download_err(e.to_string()))?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])
                .map_err(|e| download_err(e.to_string()))?;
            bar.inc(n as u64);
        }
        file.sync_all().map_err(|e| download_err(e.to_string()))?;
        bar.finish_and_clear();

        Ok(())
    }
}

/// File name a URL is cached under: its last non-empty path segment.
pub fn url_filename(url: &str) -> Result<String, ToolchainError> {
    let invalid = |message: &str| ToolchainError::Download {
        url: url.to_string(),
        message: message.to_string(),
    };

    let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .ok_or_else(|| invalid("URL has no file name"))
}

/// Ensure `url` is present in `cache_dir`, fetching it if absent.
///
/// Returns the cached path.
pub fn fetch_to_cache(
    url: &str,
    cache_dir: &Path,
    fetcher: &dyn Fetcher,
) -> Result<PathBuf, ToolchainError> {
    let filename = url_filename(url)?;
    let path = cache_dir.join(&filename);

    if path.exists() {
        tracing::debug!("using cached source {}", path.display());
        return Ok(path);
    }

    std::fs::create_dir_all(cache_dir).map_err(|e| ToolchainError::directory(cache_dir, e))?;

    tracing::info!("Downloading source file: {}", filename);
    let part = cache_dir.join(format!("{}{}", filename, PART_SUFFIX));
    if let Err(e) = fetcher.fetch(url, &part) {
        let _ = std::fs::remove_file(&part);
        return Err(e);
    }

    std::fs::rename(&part, &path).map_err(|e| ToolchainError::Download {
        url: url.to_string(),
        message: format!("failed to move {} into place: {}", part.display(), e),
    })?;

    Ok(path)
}

/// Fetch every source into `cache_dir` and unpack archives into `staging_dir`.
pub fn download(
    sources: &[String],
    cache_dir: &Path,
    staging_dir: &Path,
    fetcher: &dyn Fetcher,
    runner: &dyn CommandRunner,
) -> Result<Vec<PathBuf>, ToolchainError> {
    let mut fetched = Vec::with_capacity(sources.len());
    for url in sources {
        let path = fetch_to_cache(url, cache_dir, fetcher)?;
        archive::unpack(&path, staging_dir, runner)?;
        fetched.push(path);
    }
    Ok(fetched)
}
