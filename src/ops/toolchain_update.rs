//! Implementation of `crosstool update`.
//!
//! The manager walks the registered components in order and rebuilds each
//! one whose installed marker is missing. Every component build gets its own
//! staging directory, removed again whether the build succeeds or fails.
//! Markers of components that finished before a failure are kept, so the
//! next run resumes with the first component that did not complete.

use std::cell::Cell;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::core::component::InstallScope;
use crate::core::error::ToolchainError;
use crate::core::layout::Layout;
use crate::core::recipe::{BuildContext, ComponentRecipe};
use crate::ops::staging::StagingDir;
use crate::recipes::default_recipes;
use crate::sources::fetch::{Fetcher, HttpFetcher};
use crate::util::config::ToolchainConfig;
use crate::util::fs::{remove_dir_all_if_exists, touch};
use crate::util::process::{CommandRunner, SystemRunner};

/// Result of [`ToolchainManager::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Every component was already installed.
    UpToDate,
    /// The listed components were built, in order.
    Built {
        components: Vec<String>,
        elapsed: Duration,
    },
}

/// Installation state of one registered component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentStatus {
    pub name: String,
    pub version: String,
    pub scope: InstallScope,
    pub marker: PathBuf,
    pub stale: bool,
}

/// Orchestrates incremental builds of the toolchain components.
pub struct ToolchainManager {
    config: ToolchainConfig,
    layout: Layout,
    components: Vec<Box<dyn ComponentRecipe>>,
    runner: Box<dyn CommandRunner>,
    fetcher: Box<dyn Fetcher>,
    total_time: Cell<Duration>,
}

impl ToolchainManager {
    /// A manager that runs commands on the host and downloads over HTTP.
    pub fn new(config: ToolchainConfig) -> Result<Self, ToolchainError> {
        let runner = SystemRunner::new().with_timeout(config.command_timeout());
        let fetcher = HttpFetcher::new()?;
        Ok(Self::with_parts(config, Box::new(runner), Box::new(fetcher)))
    }

    /// A manager for the default components using the given runner and fetcher.
    pub fn with_parts(
        config: ToolchainConfig,
        runner: Box<dyn CommandRunner>,
        fetcher: Box<dyn Fetcher>,
    ) -> Self {
        let layout = Layout::from_config(&config);
        ToolchainManager {
            config,
            layout,
            components: default_recipes(),
            runner,
            fetcher,
            total_time: Cell::new(Duration::ZERO),
        }
    }

    /// Replace the registered components. Order is build order.
    pub fn with_components(mut self, components: Vec<Box<dyn ComponentRecipe>>) -> Self {
        self.components = components;
        self
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Cumulative time spent in component builds by this manager.
    pub fn total_time(&self) -> Duration {
        self.total_time.get()
    }

    /// Whether any registered component is stale.
    ///
    /// Only inspects markers; nothing on disk is touched.
    pub fn is_update_needed(&self) -> bool {
        self.components.iter().any(|c| c.is_stale(&self.layout))
    }

    /// Remove the staging directory if one was left behind.
    pub fn clean_staging(&self) -> Result<(), ToolchainError> {
        let staging = self.layout.build_dir();
        if staging.exists() {
            tracing::debug!("removing staging directory {}", staging.display());
        }
        remove_dir_all_if_exists(staging)
    }

    /// Check that the host programs needed by stale components exist.
    pub fn preflight(&self) -> Result<(), ToolchainError> {
        for recipe in self.stale_components() {
            for tool in recipe.required_tools() {
                if !self.runner.has_program(tool) {
                    return Err(ToolchainError::MissingTool {
                        tool: (*tool).to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Marker state for every registered component, in build order.
    pub fn status(&self) -> Vec<ComponentStatus> {
        self.components
            .iter()
            .map(|recipe| {
                let spec = recipe.spec();
                ComponentStatus {
                    name: spec.name.clone(),
                    version: spec.version.clone(),
                    scope: spec.scope,
                    marker: self.layout.marker_path(spec),
                    stale: recipe.is_stale(&self.layout),
                }
            })
            .collect()
    }

    /// Build a single component in a fresh staging directory.
    ///
    /// On success the component's marker is written. The staging directory
    /// is removed in every case; if removal fails after a build error, the
    /// build error is the one returned.
    pub fn build_component(&self, recipe: &dyn ComponentRecipe) -> Result<(), ToolchainError> {
        tracing::info!("Building {}", recipe.spec());

        let staging = StagingDir::create(self.layout.build_dir())?;
        match self.run_recipe(recipe, &staging) {
            Ok(()) => staging.close(),
            Err(e) => {
                if let Err(cleanup) = staging.close() {
                    tracing::warn!("{}", cleanup);
                }
                Err(e)
            }
        }
    }

    fn run_recipe(
        &self,
        recipe: &dyn ComponentRecipe,
        staging: &StagingDir,
    ) -> Result<(), ToolchainError> {
        let ctx = BuildContext::new(
            &self.config,
            &self.layout,
            staging.path(),
            self.runner.as_ref(),
            self.fetcher.as_ref(),
        );

        recipe.download(&ctx)?;

        let start = Instant::now();
        recipe.build(&ctx)?;
        let elapsed = start.elapsed();
        self.total_time.set(self.total_time.get() + elapsed);
        tracing::debug!("{} built in {:.2}s", recipe.spec(), elapsed.as_secs_f64());

        touch(&self.layout.marker_path(recipe.spec()))
    }

    /// Bring the toolchain up to date.
    ///
    /// Stale components are built in registration order. The first failure
    /// stops the run; components already built keep their markers.
    pub fn update(&self) -> Result<UpdateOutcome, ToolchainError> {
        if !self.is_update_needed() {
            self.clean_staging()?;
            tracing::info!("Toolchain already up-to-date, nothing to be done");
            return Ok(UpdateOutcome::UpToDate);
        }

        let result = self.build_stale();
        match &result {
            Ok(UpdateOutcome::Built { elapsed, .. }) => {
                tracing::info!("Toolchain built in {:.2}s", elapsed.as_secs_f64());
            }
            Ok(UpdateOutcome::UpToDate) => {}
            Err(e) => tracing::debug!("toolchain build stopped: {}", e),
        }
        result
    }

    fn build_stale(&self) -> Result<UpdateOutcome, ToolchainError> {
        self.preflight()?;
        self.layout.create_install_dirs()?;

        let mut built = Vec::new();
        for recipe in &self.components {
            if !recipe.is_stale(&self.layout) {
                tracing::debug!("{} is up to date", recipe.spec());
                continue;
            }
            self.build_component(recipe.as_ref())?;
            built.push(recipe.spec().to_string());
        }

        Ok(UpdateOutcome::Built {
            components: built,
            elapsed: self.total_time(),
        })
    }

    fn stale_components(&self) -> impl Iterator<Item = &dyn ComponentRecipe> + '_ {
        self.components
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| c.is_stale(&self.layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::ComponentSpec;
    use crate::recipes::BinutilsRecipe;
    use crate::test_support::{FakeFetcher, RecordingRunner};
    use crate::util::process::ProcessBuilder;
    use std::path::Path;
    use tempfile::TempDir;

    const BINUTILS_URL: &str = "https://ftp.gnu.org/gnu/binutils/binutils-2.28.1.tar.bz2";

    fn config(destdir: &Path) -> ToolchainConfig {
        ToolchainConfig {
            destdir: destdir.to_path_buf(),
            target: "x86_64-mytarget".to_string(),
            make_jobs: 4,
            ..ToolchainConfig::default()
        }
    }

    fn manager(
        destdir: &Path,
        runner: &RecordingRunner,
        fetcher: &FakeFetcher,
    ) -> ToolchainManager {
        ToolchainManager::with_parts(
            config(destdir),
            Box::new(runner.clone()),
            Box::new(fetcher.clone()),
        )
    }

    /// Recipe with no sources whose build runs one `make` in staging.
    struct StubRecipe {
        spec: ComponentSpec,
        pause: Duration,
    }

    impl StubRecipe {
        fn new(name: &str, version: &str) -> Self {
            StubRecipe {
                spec: ComponentSpec::new(name, version, InstallScope::Target),
                pause: Duration::ZERO,
            }
        }
    }

    impl ComponentRecipe for StubRecipe {
        fn spec(&self) -> &ComponentSpec {
            &self.spec
        }

        fn build(&self, ctx: &BuildContext<'_>) -> Result<(), ToolchainError> {
            assert!(ctx.staging_dir.is_dir());
            std::thread::sleep(self.pause);
            ctx.execute(
                &ProcessBuilder::new("make")
                    .arg(format!("{}-all", self.spec.name))
                    .cwd(ctx.staging_dir),
            )
        }
    }

    #[test]
    fn test_fresh_build() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("tc");
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        let manager = manager(&root, &runner, &fetcher);

        assert!(manager.is_update_needed());
        let outcome = manager.update().unwrap();

        match outcome {
            UpdateOutcome::Built { components, .. } => {
                assert_eq!(components, vec!["binutils@2.28.1".to_string()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(root.join("generic").is_dir());
        assert!(root.join("x86_64-mytarget/bin").is_dir());
        assert!(root.join("generic/.binutils-2.28.1-installed").is_file());
        assert!(root.join("binutils-2.28.1.tar.bz2").is_file());
        assert!(!root.join("build-tmp").exists());
        assert_eq!(fetcher.requests(), vec![BINUTILS_URL.to_string()]);

        let commands = runner.commands();
        assert_eq!(commands.len(), 4);
        assert!(commands[0].starts_with("tar -xjf /"));
        assert!(commands[1].ends_with("--target=x86_64-mytarget --disable-werror --disable-nls"));
        assert_eq!(commands[2], "make -j4");
        assert_eq!(commands[3], "make install");
        assert!(!manager.is_update_needed());
    }

    #[test]
    fn test_second_run_does_nothing() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();

        manager(tmp.path(), &runner, &fetcher).update().unwrap();
        let calls = runner.calls().len();

        // A new manager stands in for a new process.
        let outcome = manager(tmp.path(), &runner, &fetcher).update().unwrap();

        assert_eq!(outcome, UpdateOutcome::UpToDate);
        assert_eq!(runner.calls().len(), calls);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[test]
    fn test_failed_compile_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        runner.fail_on("make -j", 2);
        let fetcher = FakeFetcher::new();
        let manager = manager(tmp.path(), &runner, &fetcher);

        let err = manager.update().unwrap_err();

        assert!(matches!(
            err,
            ToolchainError::Command {
                expected: 0,
                actual: Some(2),
                ..
            }
        ));
        assert!(!tmp.path().join("build-tmp").exists());
        assert!(!tmp.path().join("generic/.binutils-2.28.1-installed").exists());
        assert!(!runner.commands().iter().any(|c| c == "make install"));
        assert!(manager.is_update_needed());
    }

    #[test]
    fn test_failed_download_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        fetcher.fail(BINUTILS_URL);
        let manager = manager(tmp.path(), &runner, &fetcher);

        let err = manager.update().unwrap_err();

        assert!(matches!(err, ToolchainError::Download { .. }));
        assert!(!tmp.path().join("build-tmp").exists());
        assert!(!tmp.path().join("binutils-2.28.1.tar.bz2").exists());
        assert!(!tmp.path().join("binutils-2.28.1.tar.bz2.part").exists());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_version_bump_makes_component_stale() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        manager(tmp.path(), &runner, &fetcher).update().unwrap();

        let bumped = manager(tmp.path(), &runner, &fetcher)
            .with_components(vec![Box::new(BinutilsRecipe::with_version("2.29"))]);

        assert!(bumped.is_update_needed());
        bumped.update().unwrap();
        assert!(tmp.path().join("generic/.binutils-2.29-installed").exists());
        // The old marker is left alone.
        assert!(tmp.path().join("generic/.binutils-2.28.1-installed").exists());
    }

    #[test]
    fn test_partial_progress_is_kept() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        runner.fail_on("make second-all", 1);
        let fetcher = FakeFetcher::new();
        let components = || -> Vec<Box<dyn ComponentRecipe>> {
            vec![
                Box::new(StubRecipe::new("first", "1.0")),
                Box::new(StubRecipe::new("second", "2.0")),
            ]
        };

        let failing = manager(tmp.path(), &runner, &fetcher).with_components(components());
        assert!(failing.update().is_err());
        assert!(tmp.path().join("x86_64-mytarget/.first-1.0-installed").exists());
        assert!(!tmp.path().join("x86_64-mytarget/.second-2.0-installed").exists());

        let healthy = RecordingRunner::new();
        let resumed = manager(tmp.path(), &healthy, &fetcher).with_components(components());
        let outcome = resumed.update().unwrap();

        assert_eq!(healthy.commands(), vec!["make second-all".to_string()]);
        assert_eq!(
            outcome,
            UpdateOutcome::Built {
                components: vec!["second@2.0".to_string()],
                elapsed: resumed.total_time(),
            }
        );
    }

    #[test]
    fn test_up_to_date_run_removes_leftover_staging() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        let manager = manager(tmp.path(), &runner, &fetcher)
            .with_components(vec![Box::new(StubRecipe::new("first", "1.0"))]);
        manager.update().unwrap();

        let leftover = tmp.path().join("build-tmp/first-build");
        std::fs::create_dir_all(&leftover).unwrap();

        // Checking staleness leaves the disk alone.
        assert!(!manager.is_update_needed());
        assert!(leftover.exists());

        assert_eq!(manager.update().unwrap(), UpdateOutcome::UpToDate);
        assert!(!tmp.path().join("build-tmp").exists());
    }

    #[test]
    fn test_build_component_uses_fresh_staging() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        let manager = manager(tmp.path(), &runner, &fetcher);
        std::fs::create_dir_all(tmp.path().join("build-tmp/junk")).unwrap();

        manager
            .build_component(&StubRecipe::new("first", "1.0"))
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].cwd.as_deref(), Some(tmp.path().join("build-tmp").as_path()));
        assert!(!tmp.path().join("build-tmp").exists());
        assert!(tmp.path().join("x86_64-mytarget/.first-1.0-installed").exists());
    }

    #[test]
    fn test_missing_tool_fails_before_any_work() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("tc");
        let runner = RecordingRunner::new();
        runner.without_program("make");
        let fetcher = FakeFetcher::new();
        let manager = manager(&root, &runner, &fetcher);

        let err = manager.update().unwrap_err();

        match err {
            ToolchainError::MissingTool { tool } => assert_eq!(tool, "make"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!root.exists());
        assert!(fetcher.requests().is_empty());
    }

    #[test]
    fn test_preflight_ignores_installed_components() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        manager(tmp.path(), &runner, &fetcher).update().unwrap();

        runner.without_program("make");
        let manager = manager(tmp.path(), &runner, &fetcher);

        manager.preflight().unwrap();
    }

    #[test]
    fn test_total_time_accumulates() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        let mut first = StubRecipe::new("first", "1.0");
        first.pause = Duration::from_millis(20);
        let mut second = StubRecipe::new("second", "1.0");
        second.pause = Duration::from_millis(20);
        let manager = manager(tmp.path(), &runner, &fetcher)
            .with_components(vec![Box::new(first), Box::new(second)]);

        assert_eq!(manager.total_time(), Duration::ZERO);
        let outcome = manager.update().unwrap();

        assert!(manager.total_time() >= Duration::from_millis(40));
        match outcome {
            UpdateOutcome::Built { elapsed, .. } => assert_eq!(elapsed, manager.total_time()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_status() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        let fetcher = FakeFetcher::new();
        let manager = manager(tmp.path(), &runner, &fetcher).with_components(vec![
            Box::new(StubRecipe::new("first", "1.0")),
            Box::new(BinutilsRecipe::new()),
        ]);
        manager
            .build_component(&StubRecipe::new("first", "1.0"))
            .unwrap();

        let status = manager.status();

        assert_eq!(status.len(), 2);
        assert_eq!(status[0].name, "first");
        assert!(!status[0].stale);
        assert_eq!(status[1].name, "binutils");
        assert_eq!(status[1].scope, InstallScope::Generic);
        assert_eq!(
            status[1].marker,
            tmp.path().join("generic/.binutils-2.28.1-installed")
        );
        assert!(status[1].stale);
    }
}
