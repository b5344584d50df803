//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for
//! `ecosystem-ci`. It uses the `thiserror` library to create a single `Error`
//! enum covering every anticipated failure mode.
//!
//! ## Taxonomy
//!
//! - **Configuration errors**: a missing required option, conflicting
//!   overrides, an unsupported package manager or an unknown script. These are
//!   raised before any external side effect where possible.
//! - **External process errors**: a non-zero exit from a shelled command.
//!   They carry the command line and working directory and abort the run.
//! - **Verification and parse errors**: a malformed manifest or a cloned
//!   repository that is not the expected project.
//!
//! Best-effort failures (reading a permanent ref, resetting bisect state) are
//! not represented here; they are logged as warnings at the call site.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for ecosystem-ci operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while parsing the `ecosystem-ci.yaml` configuration file.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A required option was not supplied.
    #[error("{context} must be called with {option}")]
    MissingOption { option: String, context: String },

    /// An explicit override disagrees with the requested release.
    #[error("conflicting overrides.{package}={existing} and --release={release} config. Use either one or the other")]
    ConflictingOverrides {
        package: String,
        existing: String,
        release: String,
    },

    /// The repository uses a package manager without an override dialect.
    #[error("unsupported package manager detected: {agent}")]
    UnsupportedPackageManager { agent: String },

    /// A script task names a script the manifest does not declare.
    #[error("script '{script}' is not declared in {}", dir.join("package.json").display())]
    UnknownScript { script: String, dir: PathBuf },

    /// An external command exited unsuccessfully.
    #[error("Command failed in {}: {command} ({status}){}", cwd.display(), if stderr.is_empty() { String::new() } else { format!(" - {}", stderr) })]
    Command {
        command: String,
        cwd: PathBuf,
        status: String,
        stderr: String,
    },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {}: {command} - {stderr}", dir.display())]
    GitCommand {
        command: String,
        dir: PathBuf,
        stderr: String,
    },

    /// A package manifest could not be read, parsed or written.
    #[error("Manifest error for {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// A cloned repository failed a post-clone sanity check.
    #[error("Verification error: {message}")]
    Verification { message: String },

    /// A build definition failed to produce its output.
    #[error("Build '{name}' failed: {message}")]
    Build { name: String, message: String },

    /// A suite was requested that the configuration does not define.
    #[error("Unknown suite '{name}' (available: {available})")]
    UnknownSuite { name: String, available: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
