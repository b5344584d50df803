//! The library under test and the packages its monorepo publishes.
//!
//! Defaults describe Vite: the `vitejs/vite` monorepo, the `vite` package in
//! `packages/vite`, and the plugins that are built alongside it.

use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::manifest::Manifest;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TargetLibrary {
    /// `owner/name` or clone URL of the monorepo.
    pub repo: String,
    /// Workspace directory name of the checkout.
    pub dir: String,
    /// Accepted `name` values of the monorepo's root `package.json`.
    pub monorepo_names: Vec<String>,
    /// The published package under test.
    pub package: String,
    /// Directory of `package` inside the monorepo.
    pub package_dir: String,
    /// Companion packages always pointed at the local checkout.
    pub companions: BTreeMap<String, String>,
    /// Extra companions pinned for majors below [`LEGACY_MAJOR_BELOW`].
    pub legacy_companions: BTreeMap<String, String>,
    /// Type definitions pinned to the checkout's installed copy for old majors.
    pub legacy_types_package: Option<String>,
}

/// Majors below this use fixed companion pins instead of registered builds.
pub const LEGACY_MAJOR_BELOW: u64 = 4;

impl Default for TargetLibrary {
    fn default() -> Self {
        let dirs = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(name, dir)| (name.to_string(), dir.to_string()))
                .collect()
        };
        Self {
            repo: "vitejs/vite".to_string(),
            dir: "vite".to_string(),
            monorepo_names: vec!["@vitejs/vite-monorepo".to_string(), "vite-monorepo".to_string()],
            package: "vite".to_string(),
            package_dir: "packages/vite".to_string(),
            companions: dirs(&[("@vitejs/plugin-legacy", "packages/plugin-legacy")]),
            legacy_companions: dirs(&[
                ("@vitejs/plugin-vue", "packages/plugin-vue"),
                ("@vitejs/plugin-vue-jsx", "packages/plugin-vue-jsx"),
                ("@vitejs/plugin-react", "packages/plugin-react"),
            ]),
            legacy_types_package: Some("@types/node".to_string()),
        }
    }
}

impl TargetLibrary {
    /// Reads the major version of the target package from the checkout.
    pub fn major_version(&self, target_path: &Path) -> Result<u64> {
        let manifest = Manifest::read(&target_path.join(&self.package_dir))?;
        let version = manifest.version().ok_or_else(|| Error::Manifest {
            path: manifest.path().to_path_buf(),
            message: "missing \"version\" field".to_string(),
        })?;
        parse_major_version(version)
    }

    /// Whether `name` is the root package name of the target monorepo.
    pub fn is_monorepo_name(&self, name: &str) -> bool {
        self.monorepo_names.iter().any(|n| n == name)
    }
}

/// Major component of a semver string such as `5.0.0-beta.3`.
pub fn parse_major_version(version: &str) -> Result<u64> {
    Ok(Version::parse(version.trim())?.major)
}
