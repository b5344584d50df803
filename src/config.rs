//! # Configuration Schema and Parsing
//!
//! This module defines the structure of the `ecosystem-ci.yaml` file and the
//! logic for parsing and validating it.
//!
//! ## Layout
//!
//! ```yaml
//! target:            # optional; describes Vite when omitted
//!   repo: vitejs/vite
//! suites:            # downstream repositories to test
//!   - name: vite-plugin-react
//!     repo: vitejs/vite-plugin-react
//!     build: { script: build }
//!     test: { script: test }
//! builds:            # repositories built locally to satisfy overrides
//!   - name: vite-plugin-vue
//!     repo: vitejs/vite-plugin-vue
//!     packages:
//!       "@vitejs/plugin-vue": packages/plugin-vue
//!     build: { script: build }
//! ```
//!
//! Hook values accept a bare string (a raw command), `{ run: ... }`,
//! `{ script: ... }`, or a list of those.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::registry::{BuildDefinition, BuildRegistry, Suite};
use crate::target::TargetLibrary;

/// Parsed `ecosystem-ci.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub target: TargetLibrary,
    pub suites: Vec<Suite>,
    pub builds: Vec<BuildDefinition>,
}

impl Config {
    /// Build definitions, in file order.
    pub fn registry(&self) -> BuildRegistry {
        self.builds.iter().cloned().collect()
    }

    /// Looks up a suite by name.
    pub fn suite(&self, name: &str) -> Result<&Suite> {
        self.suites
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::UnknownSuite {
                name: name.to_string(),
                available: self.suite_names().join(", "),
            })
    }

    /// The named suites in the given order, or every suite when `names` is empty.
    pub fn select_suites(&self, names: &[String]) -> Result<Vec<&Suite>> {
        if names.is_empty() {
            return Ok(self.suites.iter().collect());
        }
        names.iter().map(|name| self.suite(name)).collect()
    }

    pub fn suite_names(&self) -> Vec<&str> {
        self.suites.iter().map(|s| s.name.as_str()).collect()
    }

    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        check_repo("target", &self.target.repo)?;
        check_unique("suite", self.suites.iter().map(|s| s.name.as_str()))?;
        check_unique("build", self.builds.iter().map(BuildDefinition::name))?;

        for suite in &self.suites {
            check_repo(&suite.name, &suite.repo.repo)?;
        }
        for build in &self.builds {
            check_repo(build.name(), &build.suite.repo.repo)?;
            if build.packages.is_empty() {
                return Err(Error::ConfigParse {
                    message: format!("build '{}' declares no packages", build.name()),
                    hint: Some(
                        "map each package the build provides to its directory, e.g. packages: { \"@scope/pkg\": packages/pkg }"
                            .to_string(),
                    ),
                });
            }
        }
        Ok(())
    }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = BTreeSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: format!("{} with an empty name", kind),
                hint: None,
            });
        }
        if !seen.insert(name) {
            return Err(Error::ConfigParse {
                message: format!("duplicate {} name '{}'", kind, name),
                hint: Some(format!("each {} needs a unique name", kind)),
            });
        }
    }
    Ok(())
}

fn check_repo(owner: &str, repo: &str) -> Result<()> {
    if repo.trim().is_empty() {
        return Err(Error::ConfigParse {
            message: format!("'{}' has an empty repo", owner),
            hint: Some("use owner/name for GitHub or a full clone URL".to_string()),
        });
    }
    if repo.contains("://") {
        url::Url::parse(repo)?;
    }
    Ok(())
}

/// Parses and validates configuration text. An empty document is an empty
/// configuration.
pub fn parse(yaml_content: &str) -> Result<Config> {
    if yaml_content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(yaml_content)?;
    config.validate()?;
    Ok(config)
}

/// Parses the configuration file at `path`.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
