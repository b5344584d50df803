//! # Run Orchestrator
//!
//! [`run_in_repo`] takes one downstream repository through the whole
//! workflow:
//!
//! 1. sync the checkout (or just enter it with `skip_git`)
//! 2. read `package.json` and run `before_install`
//! 3. pre-flight: when verifying and the suite has a test stage, install from
//!    the lockfile and build and test the unmodified repository
//! 4. resolve and apply overrides, which reinstalls
//! 5. build, then test when the suite has a test stage
//!
//! [`Orchestrator`] bundles the target description and the build registry
//! and implements [`Builder`], so builds requested while resolving overrides
//! run through this same workflow.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::overrides::Overrides;
use crate::package_manager;
use crate::patcher::apply_overrides;
use crate::registry::{BuildDefinition, BuildRegistry, Suite};
use crate::repository::{ensure_repo, repo_dir_name};
use crate::resolver::{resolve_overrides, Builder};
use crate::session::Session;
use crate::target::TargetLibrary;
use crate::task::{run_tasks, TaskContext};

/// Options shared by every repository run in one invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Major version of the target library checkout.
    pub target_major: u64,
    /// Use the existing checkout as is.
    pub skip_git: bool,
    /// Published version of the target to test against instead of the checkout.
    pub release: Option<String>,
    /// Run the pre-flight stage.
    pub verify: bool,
    /// Overrides applied to every repository; a suite's own entries win.
    pub overrides: Overrides,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            target_major: 0,
            skip_git: false,
            release: None,
            verify: true,
            overrides: Overrides::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Checkout directory of the repository.
    pub dir: PathBuf,
}

/// Checkout directory of `suite`: its `dir`, or the last segment of its repo,
/// inside the workspace.
pub fn suite_dir(session: &Session, suite: &Suite) -> PathBuf {
    match &suite.repo.dir {
        Some(dir) => session.workspace().join(dir),
        None => session.workspace().join(repo_dir_name(&suite.repo.repo)),
    }
}

/// Runs the complete workflow for one repository.
pub fn run_in_repo(
    session: &mut Session,
    target: &TargetLibrary,
    registry: &BuildRegistry,
    builder: &mut dyn Builder,
    options: &RunOptions,
    suite: &Suite,
) -> Result<RunOutcome> {
    let dir = suite_dir(session, suite);
    log::info!("Running {} in {}", suite.name, dir.display());

    if options.skip_git {
        session.cd(&dir);
    } else {
        let mut repo = suite.repo.clone();
        repo.dir = Some(dir.clone());
        ensure_repo(session, &repo)?;
    }

    let mut manifest = Manifest::read(&dir)?;
    let ctx = TaskContext {
        scripts: manifest.scripts(),
        package_manager: package_manager::detect_or_npm(&dir)?,
    };
    let hooks = &suite.hooks;

    run_tasks(session, &hooks.before_install, &ctx)?;

    if options.verify && !hooks.test.is_empty() {
        log::info!("Verifying {} before applying overrides", suite.name);
        session.run(&ctx.package_manager.frozen_install())?;
        run_tasks(session, &hooks.before_build, &ctx)?;
        run_tasks(session, &hooks.build, &ctx)?;
        run_tasks(session, &hooks.before_test, &ctx)?;
        run_tasks(session, &hooks.test, &ctx)?;
    }

    let mut requested = options.overrides.clone();
    requested.merge(&suite.overrides);
    let overrides = resolve_overrides(
        session, target, registry, builder, &manifest, options, &requested,
    )?;

    // nested builds leave the session in their own checkouts
    session.cd(&dir);
    apply_overrides(session, &dir, &mut manifest, &overrides)?;

    run_tasks(session, &hooks.before_build, &ctx)?;
    run_tasks(session, &hooks.build, &ctx)?;
    if !hooks.test.is_empty() {
        run_tasks(session, &hooks.before_test, &ctx)?;
        run_tasks(session, &hooks.test, &ctx)?;
    }

    Ok(RunOutcome { dir })
}

/// Runs suites against a target, building registered dependencies on demand.
pub struct Orchestrator<'a> {
    target: &'a TargetLibrary,
    registry: &'a BuildRegistry,
    /// Builds currently in progress, outermost first.
    building: Vec<String>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(target: &'a TargetLibrary, registry: &'a BuildRegistry) -> Self {
        Self {
            target,
            registry,
            building: Vec::new(),
        }
    }

    /// Runs `suite` and returns its checkout directory.
    pub fn run_suite(
        &mut self,
        session: &mut Session,
        options: &RunOptions,
        suite: &Suite,
    ) -> Result<RunOutcome> {
        let (target, registry) = (self.target, self.registry);
        run_in_repo(session, target, registry, self, options, suite)
    }
}

impl Builder for Orchestrator<'_> {
    fn build(
        &mut self,
        session: &mut Session,
        definition: &BuildDefinition,
        options: &RunOptions,
    ) -> Result<PathBuf> {
        let name = definition.name();
        if self.building.iter().any(|b| b == name) {
            return Err(Error::Build {
                name: name.to_string(),
                message: format!("build cycle: {} -> {}", self.building.join(" -> "), name),
            });
        }

        self.building.push(name.to_string());
        let result = self.run_suite(session, options, &definition.suite);
        self.building.pop();

        let outcome = result.map_err(|e| match e {
            Error::Build { .. } => e,
            other => Error::Build {
                name: name.to_string(),
                message: other.to_string(),
            },
        })?;
        log::info!("Built {} in {}", name, outcome.dir.display());
        Ok(outcome.dir)
    }
}
