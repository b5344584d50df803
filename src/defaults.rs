//! Default values for ecosystem-ci configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// Configuration file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ecosystem-ci.yaml";

/// Directory under the root that holds every clone.
pub const WORKSPACE_DIR: &str = "workspace";

/// Returns the workspace directory for `root`.
///
/// This can be overridden by the `--workspace` CLI flag or the
/// `ECOSYSTEM_CI_WORKSPACE` environment variable.
pub fn default_workspace(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR)
}

/// Returns the configuration path for `root`.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
