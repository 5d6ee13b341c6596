//! The component recipe interface.

use std::path::Path;

use crate::core::component::ComponentSpec;
use crate::core::error::ToolchainError;
use crate::core::layout::Layout;
use crate::sources::fetch::{self, Fetcher};
use crate::util::config::ToolchainConfig;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Everything a recipe may use while downloading and building.
///
/// Borrowed from the manager for the duration of one component build.
pub struct BuildContext<'a> {
    pub config: &'a ToolchainConfig,
    pub layout: &'a Layout,
    /// The staging directory; exists for exactly this build.
    pub staging_dir: &'a Path,
    runner: &'a dyn CommandRunner,
    fetcher: &'a dyn Fetcher,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        config: &'a ToolchainConfig,
        layout: &'a Layout,
        staging_dir: &'a Path,
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        BuildContext {
            config,
            layout,
            staging_dir,
            runner,
            fetcher,
        }
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner
    }

    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher
    }

    /// Run a command that must exit with status 0.
    pub fn execute(&self, cmd: &ProcessBuilder) -> Result<(), ToolchainError> {
        self.runner.execute(cmd, 0)
    }

    /// Create a directory inside the staging area and return its path.
    pub fn staging_subdir(&self, name: &str) -> Result<std::path::PathBuf, ToolchainError> {
        let dir = self.staging_dir.join(name);
        std::fs::create_dir_all(&dir).map_err(|e| ToolchainError::directory(&dir, e))?;
        Ok(dir)
    }
}

/// A named, versioned build unit for one external toolchain dependency.
///
/// The manager wraps [`build`](ComponentRecipe::build) with timing and
/// writes the installed marker itself; recipes never write it.
pub trait ComponentRecipe {
    /// The static descriptor of this component.
    fn spec(&self) -> &ComponentSpec;

    /// Whether the marker for this exact name+version is absent.
    fn is_stale(&self, layout: &Layout) -> bool {
        !layout.is_installed(self.spec())
    }

    /// Fetch the declared sources and unpack them into the staging directory.
    fn download(&self, ctx: &BuildContext<'_>) -> Result<(), ToolchainError> {
        fetch::download(
            &self.spec().sources,
            ctx.layout.cache_dir(),
            ctx.staging_dir,
            ctx.fetcher(),
            ctx.runner(),
        )
        .map(drop)
    }

    /// Configure, compile and install the component.
    fn build(&self, ctx: &BuildContext<'_>) -> Result<(), ToolchainError>;

    /// Host programs `build` invokes, checked before any work starts.
    fn required_tools(&self) -> &[&'static str] {
        &[]
    }
}
