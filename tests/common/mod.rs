//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! #[cfg_attr(not(feature = "integration-tests"), ignore)]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::MINIMAL);
//!     fixture.command().arg("ls").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// One suite, no builds.
    pub const MINIMAL: &str = r#"
suites:
  - name: vitepress
    repo: vuejs/vitepress
    build: { script: build }
    test: { script: test }
"#;

    /// Suites plus a build definition.
    pub const WITH_BUILDS: &str = r#"
suites:
  - name: vitepress
    repo: vuejs/vitepress
    build: { script: build }
    test: { script: test }
  - name: nuxt
    repo: nuxt/nuxt
    tag: v3.8.0
    build: { script: build }
builds:
  - name: vite-plugin-vue
    repo: vitejs/vite-plugin-vue
    packages:
      "@vitejs/plugin-vue": packages/plugin-vue
    build: { script: build }
"#;

    /// Two suites with the same name.
    pub const DUPLICATE_SUITES: &str = r#"
suites:
  - { name: a, repo: x/a }
  - { name: a, repo: x/b }
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "suites: [ { name: a";
}

/// A temporary harness root with an optional `ecosystem-ci.yaml` and
/// prepared workspace checkouts.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add an `ecosystem-ci.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("ecosystem-ci.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a checkout at `workspace/<name>` containing `package.json`.
    #[allow(dead_code)]
    pub fn with_checkout(self, name: &str, manifest: &str) -> Self {
        self.temp_dir
            .child(format!("workspace/{}/package.json", name))
            .write_str(manifest)
            .expect("Failed to write package.json");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The workspace the CLI uses for this root.
    #[allow(dead_code)]
    pub fn workspace(&self) -> PathBuf {
        self.temp_dir.path().join("workspace")
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ecosystem-ci");
        cmd.current_dir(self.path())
            .env_remove("ECOSYSTEM_CI_CONFIG")
            .env_remove("ECOSYSTEM_CI_WORKSPACE")
            .env_remove("GITHUB_ACTIONS");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config(configs::MINIMAL);
        assert!(fixture.path().join("ecosystem-ci.yaml").exists());
    }

    #[test]
    fn test_fixture_with_checkout() {
        let fixture = TestFixture::new().with_checkout("app", "{}");
        assert!(fixture.workspace().join("app/package.json").exists());
    }

    #[test]
    fn test_configs_parse() {
        for config in [configs::MINIMAL, configs::WITH_BUILDS] {
            ecosystem_ci::config::parse(config).expect("Config should be valid");
        }
        assert!(ecosystem_ci::config::parse(configs::DUPLICATE_SUITES).is_err());
        assert!(ecosystem_ci::config::parse(configs::INVALID_YAML).is_err());
    }
}
