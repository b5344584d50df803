//! # Ecosystem CI Library
//!
//! This library tests downstream projects against a local build of a library
//! they depend on. It clones each downstream repository, points its
//! dependency on the library (and on related packages) at the local build,
//! reinstalls, and runs the repository's own build and tests. It is designed
//! to be used by the `ecosystem-ci` command-line tool but can also drive
//! suites programmatically.
//!
//! ## Quick Example
//!
//! ```
//! use ecosystem_ci::config;
//! use ecosystem_ci::overrides::OverrideValue;
//!
//! let config = config::parse(r#"
//! suites:
//!   - name: vitepress
//!     repo: vuejs/vitepress
//!     build: { script: build }
//!     test: { script: test }
//!     overrides:
//!       "@vitejs/plugin-vue": true
//! "#).unwrap();
//!
//! let suite = config.suite("vitepress").unwrap();
//! assert_eq!(suite.repo.url(), "https://github.com/vuejs/vitepress.git");
//! assert_eq!(suite.overrides.get("@vitejs/plugin-vue"), Some(&OverrideValue::Auto));
//! ```
//!
//! ## Core Concepts
//!
//! - **Session (`session`, `runner`)**: the working directory, environment
//!   and command runner every step goes through. Nothing changes the process
//!   working directory.
//! - **Repository sync (`repository`, `git`)**: makes a workspace directory a
//!   clean checkout of a remote at a branch, tag or commit.
//! - **Overrides (`overrides`, `resolver`, `patcher`)**: which packages get
//!   replaced, by what, and how each package manager is told about it.
//! - **Suites and builds (`registry`, `config`, `task`)**: declarative
//!   descriptions of downstream repositories and their lifecycle hooks.
//! - **Orchestration (`orchestrator`, `bisect`)**: the per-repository
//!   workflow and bisection over the target's history.
//!
//! ## Execution Flow
//!
//! For each suite, [`orchestrator::run_in_repo`]:
//!
//! 1.  **Sync**: clone or reuse the checkout and reset it to the requested ref.
//! 2.  **Pre-flight**: optionally build and test the unmodified repository.
//! 3.  **Resolve**: compute overrides, building registered dependencies first.
//! 4.  **Patch**: write the overrides into `package.json` and reinstall.
//! 5.  **Test**: build and test against the overridden dependencies.

pub mod bisect;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod overrides;
pub mod package_manager;
pub mod patcher;
pub mod registry;
pub mod repository;
pub mod resolver;
pub mod runner;
pub mod session;
pub mod suggestions;
pub mod target;
pub mod task;
pub mod testing;

pub use error::{Error, Result};

#[cfg(test)]
mod patcher_proptest;
