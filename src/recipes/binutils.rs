//! GNU binutils (assembler, linker, objcopy) for the target triple.

use crate::core::component::{ComponentSpec, InstallScope};
use crate::core::error::ToolchainError;
use crate::core::recipe::{BuildContext, ComponentRecipe};
use crate::util::process::ProcessBuilder;

/// Default binutils release.
pub const VERSION: &str = "2.28.1";

/// Out-of-tree build directory inside staging.
const BUILD_SUBDIR: &str = "binutils-build";

/// Builds binutils into the generic directory; the tools land in
/// `generic/{triple}/bin` and `generic/bin/{triple}-*`.
#[derive(Debug, Clone)]
pub struct BinutilsRecipe {
    spec: ComponentSpec,
}

impl BinutilsRecipe {
    pub fn new() -> Self {
        Self::with_version(VERSION)
    }

    /// A recipe for a specific release, fetched from the GNU mirror.
    pub fn with_version(version: &str) -> Self {
        let spec = ComponentSpec::new("binutils", version, InstallScope::Generic).source(format!(
            "https://ftp.gnu.org/gnu/binutils/binutils-{}.tar.bz2",
            version
        ));
        BinutilsRecipe { spec }
    }

    /// Flags passed to `configure`.
    pub fn configure_flags(&self, ctx: &BuildContext<'_>) -> Vec<String> {
        vec![
            format!(
                "--prefix={}",
                ctx.layout.install_dir(self.spec.scope).display()
            ),
            format!("--target={}", ctx.config.target),
            "--disable-werror".to_string(),
            "--disable-nls".to_string(),
        ]
    }
}

impl Default for BinutilsRecipe {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRecipe for BinutilsRecipe {
    fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<(), ToolchainError> {
        let build_dir = ctx.staging_subdir(BUILD_SUBDIR)?;
        let configure = ctx
            .staging_dir
            .join(self.spec.source_dir_name())
            .join("configure");

        tracing::info!("Configuring {}", self.spec);
        ctx.execute(
            &ProcessBuilder::new(configure)
                .args(self.configure_flags(ctx))
                .cwd(&build_dir),
        )?;

        tracing::info!("Compiling {}", self.spec);
        ctx.execute(
            &ProcessBuilder::new("make")
                .arg(format!("-j{}", ctx.config.make_jobs))
                .cwd(&build_dir),
        )?;

        tracing::info!("Installing {}", self.spec);
        ctx.execute(&ProcessBuilder::new("make").arg("install").cwd(&build_dir))
    }

    fn required_tools(&self) -> &[&'static str] {
        &["make", "tar"]
    }
}
