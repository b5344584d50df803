//! # Bisect Command Implementation
//!
//! Checks out the target library with full history and bisects between the
//! requested revision (bad) and `--good`, rebuilding the target and running
//! the selected suites at every candidate.

use anyhow::Result;
use clap::Args;

use ecosystem_ci::bisect::bisect;
use ecosystem_ci::orchestrator::RunOptions;
use ecosystem_ci::output::emoji;
use ecosystem_ci::repository::{build_target, setup_target_repo};
use ecosystem_ci::suggestions;
use ecosystem_ci::Error;

use super::run_suites::run_all;
use super::{Context, TargetRefArgs};

/// Find the first target commit that breaks the given suites
#[derive(Args, Debug)]
pub struct BisectArgs {
    /// Suites to run at each candidate (all configured suites when omitted)
    #[arg(value_name = "SUITE")]
    pub suites: Vec<String>,

    /// A revision known to be good
    #[arg(long, value_name = "REF")]
    pub good: String,

    #[command(flatten)]
    pub target: TargetRefArgs,

    /// Build and test each repository before applying overrides
    #[arg(long)]
    pub verify: bool,
}

/// Execute the `bisect` command.
pub fn execute(ctx: &Context, args: BisectArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let suites = config.select_suites(&args.suites)?;
    let mut session = ctx.session(&config.target);

    let mut repo = args.target.repo_options(&config.target);
    repo.shallow = Some(false);
    setup_target_repo(&mut session, &config.target, &repo)?;

    let report = bisect(&mut session, &args.good, |session| {
        build_target(session, false)?;
        let options = RunOptions {
            target_major: config.target.major_version(session.target_path())?,
            verify: args.verify,
            ..RunOptions::default()
        };
        run_all(session, &config, &options, &suites).map_err(|e| Error::Verification {
            message: format!("{:#}", e),
        })
    })?;

    println!(
        "{} Bisection tested {} and skipped {} commit(s)",
        emoji(&ctx.output, "🔎", "=>"),
        report.tested,
        report.skipped
    );
    match (&report.first_bad, report.completed) {
        (Some(commit), _) => println!("   First bad commit: {}", commit),
        (None, true) => println!("   No single first bad commit was identified"),
        (None, false) => return Err(suggestions::bisect_incomplete(&args.good)),
    }
    Ok(())
}
