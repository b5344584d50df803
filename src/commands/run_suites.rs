//! # Run-Suites Command Implementation
//!
//! Runs the selected suites, in order, against the target library.
//!
//! Without `--release` the target is checked out and built first and
//! downstream repositories are pointed at the local build. `--skip-git`
//! builds the existing target checkout as is instead of syncing it. With `--release` the
//! published version is used and the target is never built.
//!
//! The first failing suite aborts the run.

use anyhow::{Context as _, Result};
use clap::Args;
use std::time::Instant;

use ecosystem_ci::config::Config;
use ecosystem_ci::orchestrator::{Orchestrator, RunOptions};
use ecosystem_ci::output::emoji;
use ecosystem_ci::registry::Suite;
use ecosystem_ci::repository::{build_target, setup_target_repo, RepoOptions};
use ecosystem_ci::session::Session;
use ecosystem_ci::suggestions;
use ecosystem_ci::target::{parse_major_version, TargetLibrary};

use super::{Context, TargetRefArgs};

/// Run downstream suites against the target library
#[derive(Args, Debug)]
pub struct RunSuitesArgs {
    /// Suites to run (all configured suites when omitted)
    #[arg(value_name = "SUITE")]
    pub suites: Vec<String>,

    #[command(flatten)]
    pub target: TargetRefArgs,

    /// Test against this published version instead of a local build
    #[arg(long, value_name = "VERSION")]
    pub release: Option<String>,

    /// Build and test each repository before applying overrides (default)
    #[arg(long, overrides_with = "no_verify")]
    pub verify: bool,

    /// Skip the pre-flight build and test
    #[arg(long)]
    pub no_verify: bool,

    /// Use the existing checkouts without touching git
    #[arg(long)]
    pub skip_git: bool,
}

impl RunSuitesArgs {
    pub fn verify(&self) -> bool {
        !self.no_verify
    }
}

/// Execute the `run-suites` command.
pub fn execute(ctx: &Context, args: RunSuitesArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let suites = config.select_suites(&args.suites)?;
    let mut session = ctx.session(&config.target);

    let target_major = match &args.release {
        Some(release) => parse_major_version(release)?,
        None => prepare_target(
            &mut session,
            &config.target,
            &args.target.repo_options(&config.target),
            args.skip_git,
            args.verify(),
        )?,
    };
    let options = RunOptions {
        target_major,
        skip_git: args.skip_git,
        release: args.release.clone(),
        verify: args.verify(),
        ..RunOptions::default()
    };

    run_all(&mut session, &config, &options, &suites)?;
    println!(
        "{} {} suite(s) passed",
        emoji(&ctx.output, "✅", "OK"),
        suites.len()
    );
    Ok(())
}

/// Syncs the target unless `skip_git`, then builds it. Returns the target's
/// major version.
fn prepare_target(
    session: &mut Session,
    target: &TargetLibrary,
    repo: &RepoOptions,
    skip_git: bool,
    verify: bool,
) -> Result<u64> {
    if !skip_git {
        setup_target_repo(session, target, repo)?;
    }
    let major = target
        .major_version(session.target_path())
        .map_err(|e| suggestions::target_checkout_missing(session.target_path(), &e))?;
    build_target(session, verify)?;
    Ok(major)
}

/// Runs `suites` in order, stopping at the first failure.
pub fn run_all(
    session: &mut Session,
    config: &Config,
    options: &RunOptions,
    suites: &[&Suite],
) -> Result<()> {
    let registry = config.registry();
    let mut orchestrator = Orchestrator::new(&config.target, &registry);

    for suite in suites {
        let start = Instant::now();
        orchestrator
            .run_suite(session, options, suite)
            .with_context(|| format!("Suite {} failed", suite.name))?;
        log::info!(
            "Suite {} passed in {:.2}s",
            suite.name,
            start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
