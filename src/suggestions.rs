//! # Error Suggestions
//!
//! Helpers for errors that tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ecosystem_ci::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

/// Generate an error for when an explicitly requested configuration file is
/// not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create an ecosystem-ci.yaml file in the harness root\n\
         hint: Use --config to specify a different path\n\
         hint: Set the ECOSYSTEM_CI_CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for when the target checkout cannot tell its version.
pub fn target_checkout_missing(target_path: &Path, error: &crate::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Failed to read the target version in {path}\n\
         error: {error}\n\n\
         hint: Run build-target first, or drop --skip-git\n\
         hint: Use --release <VERSION> to test a published version instead",
        path = target_path.display()
    )
}

/// Generate an error for a bisection that stopped before git ran out of
/// candidates.
pub fn bisect_incomplete(good: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Bisection did not complete\n\n\
         hint: Check that '{good}' exists in the target history\n\
         hint: Re-run with --log-level debug to see every command"
    )
}
