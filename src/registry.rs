//! Downstream suites and the registry of local build definitions.
//!
//! A [`Suite`] is a downstream repository to test. A [`BuildDefinition`] is a
//! repository that can be built locally to satisfy overrides for the packages
//! it declares; its `packages` map each package name to that package's
//! directory relative to the build's checkout. Definitions are registered
//! once, from configuration or code, before any run starts.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::overrides::Overrides;
use crate::repository::RepoOptions;
use crate::task::Hooks;

#[derive(Debug, Clone, Deserialize)]
pub struct Suite {
    pub name: String,
    #[serde(flatten)]
    pub repo: RepoOptions,
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(flatten)]
    pub hooks: Hooks,
}

impl Suite {
    pub fn new(name: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo: RepoOptions::new(repo),
            overrides: Overrides::default(),
            hooks: Hooks::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildDefinition {
    #[serde(flatten)]
    pub suite: Suite,
    /// Package name to directory within the built checkout.
    #[serde(default)]
    pub packages: BTreeMap<String, String>,
}

impl BuildDefinition {
    pub fn new(suite: Suite) -> Self {
        Self {
            suite,
            packages: BTreeMap::new(),
        }
    }

    pub fn with_package(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.packages.insert(name.into(), path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.suite.name
    }

    pub fn provides(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }
}

/// Build definitions available to the override resolver.
#[derive(Debug, Clone, Default)]
pub struct BuildRegistry {
    builds: Vec<BuildDefinition>,
}

impl BuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition; a later definition with the same name replaces the
    /// earlier one.
    pub fn register(&mut self, definition: BuildDefinition) {
        match self.builds.iter_mut().find(|b| b.name() == definition.name()) {
            Some(existing) => *existing = definition,
            None => self.builds.push(definition),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BuildDefinition> {
        self.builds.iter().find(|b| b.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildDefinition> {
        self.builds.iter()
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

impl FromIterator<BuildDefinition> for BuildRegistry {
    fn from_iter<I: IntoIterator<Item = BuildDefinition>>(iter: I) -> Self {
        let mut registry = BuildRegistry::new();
        for definition in iter {
            registry.register(definition);
        }
        registry
    }
}
