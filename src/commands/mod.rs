//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `ecosystem-ci` command-line tool. Each subcommand is defined in its own
//! file to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the shared [`Context`] and the parsed
//!   `Args` and performs the command's logic.
//!
//! The `execute` function is responsible for orchestrating the necessary
//! operations, calling into the `ecosystem_ci` library to perform the core
//! logic.

pub mod bisect;
pub mod build_target;
pub mod completions;
pub mod ls;
pub mod run_suites;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;

use ecosystem_ci::config::{self, Config};
use ecosystem_ci::defaults::{default_config_path, default_workspace};
use ecosystem_ci::output::OutputConfig;
use ecosystem_ci::repository::RepoOptions;
use ecosystem_ci::session::Session;
use ecosystem_ci::suggestions;
use ecosystem_ci::target::TargetLibrary;

/// Global settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub workspace: PathBuf,
    /// Explicit `--config`, if any.
    pub config: Option<PathBuf>,
    pub output: OutputConfig,
}

impl Context {
    pub fn new(
        root: PathBuf,
        workspace: Option<PathBuf>,
        config: Option<PathBuf>,
        output: OutputConfig,
    ) -> Self {
        let workspace = workspace
            .map(|w| root.join(w))
            .unwrap_or_else(|| default_workspace(&root));
        Self {
            root,
            workspace,
            config,
            output,
        }
    }

    /// Loads the configuration. Without `--config`, a missing default file
    /// means an empty configuration.
    pub fn load_config(&self) -> Result<Config> {
        let path = match &self.config {
            Some(path) => {
                let path = self.root.join(path);
                if !path.exists() {
                    return Err(suggestions::config_not_found(&path));
                }
                path
            }
            None => {
                let path = default_config_path(&self.root);
                if !path.exists() {
                    log::debug!("No {} found, using defaults", path.display());
                    return Ok(Config::default());
                }
                path
            }
        };
        config::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// A session for `target`, running real processes.
    pub fn session(&self, target: &TargetLibrary) -> Session {
        Session::new(&self.root, &self.workspace, &target.dir).with_output(self.output.clone())
    }
}

/// Selects the revision of the target library.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetRefArgs {
    /// Target repository (owner/name or clone URL)
    #[arg(long, value_name = "REPO")]
    pub repo: Option<String>,

    /// Branch to use
    #[arg(long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Tag to use
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Commit SHA to use
    #[arg(long, value_name = "SHA")]
    pub commit: Option<String>,
}

impl TargetRefArgs {
    /// Checkout options for the target; the repo falls back to the target's.
    pub fn repo_options(&self, target: &TargetLibrary) -> RepoOptions {
        RepoOptions {
            repo: self.repo.clone().unwrap_or_else(|| target.repo.clone()),
            branch: self.branch.clone(),
            tag: self.tag.clone(),
            commit: self.commit.clone(),
            ..RepoOptions::default()
        }
    }
}
