//! # Build-Target Command Implementation
//!
//! Checks out the target library into the workspace, verifies that the clone
//! is the expected monorepo, then installs from the lockfile and builds it.
//! With `--verify` the target's own tests run as well.

use anyhow::Result;
use clap::Args;

use ecosystem_ci::output::emoji;
use ecosystem_ci::repository::{build_target, permanent_ref, setup_target_repo};

use super::{Context, TargetRefArgs};

/// Check out and build the target library
#[derive(Args, Debug)]
pub struct BuildTargetArgs {
    #[command(flatten)]
    pub target: TargetRefArgs,

    /// Run the target's own tests after building
    #[arg(long)]
    pub verify: bool,
}

/// Execute the `build-target` command.
pub fn execute(ctx: &Context, args: BuildTargetArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let mut session = ctx.session(&config.target);

    setup_target_repo(&mut session, &config.target, &args.target.repo_options(&config.target))?;
    build_target(&mut session, args.verify)?;

    match permanent_ref(&mut session) {
        Some(reference) => println!(
            "{} Built {} at {}",
            emoji(&ctx.output, "✅", "OK"),
            config.target.package,
            reference
        ),
        None => println!("{} Built {}", emoji(&ctx.output, "✅", "OK"), config.target.package),
    }
    Ok(())
}
