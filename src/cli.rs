//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use crate::commands;
use ecosystem_ci::output::OutputConfig;

/// Ecosystem CI - Test downstream projects against a local build of a library
#[derive(Parser, Debug)]
#[command(name = "ecosystem-ci")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the ecosystem-ci.yaml configuration file
    #[arg(long, global = true, value_name = "FILE", env = "ECOSYSTEM_CI_CONFIG")]
    config: Option<PathBuf>,

    /// Root directory of the harness (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Directory holding all clones (defaults to <root>/workspace)
    #[arg(long, global = true, value_name = "DIR", env = "ECOSYSTEM_CI_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check out and build the target library
    BuildTarget(commands::build_target::BuildTargetArgs),

    /// Run downstream suites against the target library
    RunSuites(commands::run_suites::RunSuitesArgs),

    /// Find the first target commit that breaks the given suites
    Bisect(commands::bisect::BisectArgs),

    /// List configured suites and builds
    Ls(commands::ls::LsArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };
        let ctx = commands::Context::new(root, self.workspace, self.config, output);

        match self.command {
            Commands::BuildTarget(args) => commands::build_target::execute(&ctx, args),
            Commands::RunSuites(args) => commands::run_suites::execute(&ctx, args),
            Commands::Bisect(args) => commands::bisect::execute(&ctx, args),
            Commands::Ls(args) => commands::ls::execute(&ctx, args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Routes `log` output through `env_logger` at `level`; `RUST_LOG` still
/// refines individual modules.
fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder
        .parse_filters(level)
        .format_timestamp(None)
        .format_target(false);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // a logger may already be installed when embedded
    let _ = builder.try_init();
}
