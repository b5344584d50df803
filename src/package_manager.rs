//! # Package Manager Detection
//!
//! Determines which package manager a repository uses and how to invoke it.
//! The `packageManager` field of `package.json` wins; otherwise the lockfile
//! present in the repository decides. Yarn 2 and later ("berry") is told
//! apart from classic yarn only through the `packageManager` field.
//!
//! Only npm, yarn and pnpm have an override [`Dialect`]; bun is recognised so
//! that its repositories fail with a clear "unsupported" error.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::runner::CommandSpec;

/// Lockfile names and the package manager each one implies.
pub const LOCKFILES: &[(&str, PackageManager)] = &[
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
    ("npm-shrinkwrap.json", PackageManager::Npm),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
    YarnBerry,
    Pnpm,
    Bun,
}

/// The manifest mechanism a package manager uses for overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `pnpm.overrides`, mirrored into `devDependencies`.
    Pnpm,
    /// `resolutions`.
    Yarn,
    /// `overrides`, plus direct rewrites of dependency entries.
    Npm,
}

impl PackageManager {
    /// Binary name.
    pub fn program(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn | PackageManager::YarnBerry => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    pub fn dialect(self) -> Result<Dialect> {
        match self {
            PackageManager::Npm => Ok(Dialect::Npm),
            PackageManager::Yarn | PackageManager::YarnBerry => Ok(Dialect::Yarn),
            PackageManager::Pnpm => Ok(Dialect::Pnpm),
            PackageManager::Bun => Err(Error::UnsupportedPackageManager {
                agent: self.program().to_string(),
            }),
        }
    }

    /// Install exactly what the lockfile says.
    pub fn frozen_install(self) -> CommandSpec {
        let cmd = CommandSpec::new(self.program());
        match self {
            PackageManager::Npm => cmd.arg("ci"),
            PackageManager::YarnBerry => cmd.args(["install", "--immutable"]),
            PackageManager::Yarn | PackageManager::Pnpm | PackageManager::Bun => {
                cmd.args(["install", "--frozen-lockfile"])
            }
        }
    }

    /// Install after overrides were written. pnpm is told to tolerate peer
    /// dependency mismatches the overrides may introduce.
    pub fn override_install(self) -> CommandSpec {
        let cmd = CommandSpec::new(self.program()).arg("install");
        match self {
            PackageManager::Pnpm => cmd.args([
                "--prefer-frozen-lockfile",
                "--prefer-offline",
                "--strict-peer-dependencies",
                "false",
            ]),
            _ => cmd,
        }
    }

    /// Runs a declared script with extra arguments. npm needs `--` before
    /// them or it keeps flags such as `--run` for itself.
    pub fn run_script(self, script: &str, args: &[&str]) -> CommandSpec {
        let cmd = CommandSpec::new(self.program()).args(["run", script]);
        let cmd = match self {
            PackageManager::Npm if !args.is_empty() => cmd.arg("--"),
            _ => cmd,
        };
        cmd.args(args.iter().copied())
    }

    /// Parses a `packageManager` field such as `yarn@3.6.1` or `^pnpm@7`.
    pub fn from_package_manager_field(field: &str) -> Option<Self> {
        let field = field.trim_start_matches('^');
        let (name, version) = field.split_once('@').unwrap_or((field, ""));
        let major: Option<u64> = version.split('.').next().and_then(|m| m.parse().ok());
        match name {
            "npm" => Some(PackageManager::Npm),
            "yarn" if major.is_some_and(|m| m > 1) => Some(PackageManager::YarnBerry),
            "yarn" => Some(PackageManager::Yarn),
            "pnpm" => Some(PackageManager::Pnpm),
            "bun" => Some(PackageManager::Bun),
            _ => None,
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageManager::YarnBerry => write!(f, "yarn@berry"),
            other => write!(f, "{}", other.program()),
        }
    }
}

/// Detects the package manager used in `dir`.
///
/// Returns `Ok(None)` when neither a recognised `packageManager` field nor a
/// lockfile is present.
pub fn detect(dir: &Path) -> Result<Option<PackageManager>> {
    if dir.join(MANIFEST_FILE).is_file() {
        let manifest = Manifest::read(dir)?;
        if let Some(field) = manifest.package_manager() {
            match PackageManager::from_package_manager_field(field) {
                Some(pm) => return Ok(Some(pm)),
                None => log::warn!("Unknown packageManager in {}: {}", dir.display(), field),
            }
        }
    }

    Ok(LOCKFILES
        .iter()
        .find(|(lockfile, _)| dir.join(lockfile).is_file())
        .map(|(_, pm)| *pm))
}

/// Like [`detect`], falling back to npm for running scripts and installs.
///
/// Only the override dialect needs a positively identified package manager.
pub fn detect_or_npm(dir: &Path) -> Result<PackageManager> {
    Ok(detect(dir)?.unwrap_or(PackageManager::Npm))
}
