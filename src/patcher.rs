//! # Manifest Patcher
//!
//! Writes resolved overrides into a repository's `package.json` using the
//! mechanism of its package manager, then reinstalls:
//!
//! - **pnpm**: `pnpm.overrides`, mirrored into `devDependencies` so every
//!   override has a declared range to substitute.
//! - **yarn** (classic and berry): `resolutions`.
//! - **npm**: `overrides`. npm refuses to override a direct dependency, so
//!   matching `dependencies` and `devDependencies` entries are rewritten too.
//!
//! Values naming an existing directory become `file:` references.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::git;
use crate::manifest::Manifest;
use crate::overrides::Overrides;
use crate::package_manager::{self, Dialect};
use crate::runner::CommandSpec;
use crate::session::{resolve, Session};

/// pnpm release that mishandles absolute-path overrides.
pub const PNPM_BROKEN_VERSION: &str = "7.18.0";
/// Release pinned through corepack when [`PNPM_BROKEN_VERSION`] is detected.
pub const PNPM_FIXED_VERSION: &str = "7.18.1";

/// Whether `value` is a path to an existing directory.
///
/// Only values containing `/` and not starting with `@` are treated as paths;
/// version ranges and scoped package names never are. Relative paths resolve
/// against `base`. Symlinks are not followed.
pub fn is_local_override(base: &Path, value: &str) -> Result<bool> {
    if !value.contains('/') || value.starts_with('@') {
        return Ok(false);
    }
    match fs::symlink_metadata(resolve(base, Path::new(value))) {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Rewrites local directories to `file:<absolute path>`.
pub fn use_file_protocol(base: &Path, value: &str) -> Result<String> {
    if is_local_override(base, value)? {
        Ok(format!("file:{}", resolve(base, Path::new(value)).display()))
    } else {
        Ok(value.to_string())
    }
}

/// The `Spec` entries of `overrides`, with local directories rewritten.
pub fn concrete_overrides(base: &Path, overrides: &Overrides) -> Result<Vec<(String, String)>> {
    overrides
        .specs()
        .map(|(name, spec)| Ok((name.to_string(), use_file_protocol(base, spec)?)))
        .collect()
}

/// Applies `overrides` to `manifest` in the given dialect.
///
/// `pnpm_version` is the output of `pnpm --version` and only matters for
/// the pnpm dialect.
pub fn patch_manifest(
    manifest: &mut Manifest,
    dialect: Dialect,
    pnpm_version: Option<&str>,
    overrides: &[(String, String)],
) {
    let entries = || overrides.iter().map(|(n, v)| (n.as_str(), v.as_str()));

    match dialect {
        Dialect::Pnpm => {
            if pnpm_version.map(str::trim) == Some(PNPM_BROKEN_VERSION) {
                log::warn!(
                    "detected pnpm@{}, changing pkg.packageManager and pkg.engines.pnpm to enforce use of pnpm@{}",
                    PNPM_BROKEN_VERSION,
                    PNPM_FIXED_VERSION
                );
                manifest.set(
                    "packageManager",
                    Value::String(format!("pnpm@{}", PNPM_FIXED_VERSION)),
                );
                manifest.merge_into(&["engines"], [("pnpm", PNPM_FIXED_VERSION)]);
            }
            manifest.merge_into(&["devDependencies"], entries());
            manifest.merge_into(&["pnpm", "overrides"], entries());
        }
        Dialect::Yarn => manifest.merge_into(&["resolutions"], entries()),
        Dialect::Npm => {
            manifest.merge_into(&["overrides"], entries());
            for (name, version) in overrides {
                for table in ["dependencies", "devDependencies"] {
                    if manifest.has_entry(table, name) {
                        manifest.merge_into(&[table], [(name.as_str(), version.as_str())]);
                    }
                }
            }
        }
    }
}

/// Patches the manifest of `dir` with `overrides` and reinstalls.
///
/// The checkout is force-cleaned first so stale installs cannot leak into
/// the new one. On return the session is inside `dir`.
pub fn apply_overrides(
    session: &mut Session,
    dir: &Path,
    manifest: &mut Manifest,
    overrides: &Overrides,
) -> Result<()> {
    let overrides = concrete_overrides(session.cwd(), overrides)?;

    session.cd(dir);
    git::clean(session)?;

    let dir = session.cwd().to_path_buf();
    let pm = package_manager::detect(&dir)?.ok_or_else(|| Error::UnsupportedPackageManager {
        agent: "none".to_string(),
    })?;
    let dialect = pm.dialect()?;

    let pnpm_version = match dialect {
        Dialect::Pnpm => Some(session.run(&CommandSpec::new("pnpm").arg("--version"))?),
        _ => None,
    };

    patch_manifest(manifest, dialect, pnpm_version.as_deref(), &overrides);
    manifest.write()?;
    log::debug!("Wrote {} overrides to {}", overrides.len(), manifest.path().display());

    session.run(&pm.override_install())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputConfig;
    use crate::testing::RecordingRunner;
    use tempfile::TempDir;

    fn overrides(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    fn manifest(json: &str) -> Manifest {
        Manifest::parse("/repo/package.json", json).unwrap()
    }

    #[test]
    fn test_npm_rewrites_direct_dependencies() {
        let mut manifest = manifest(r#"{"dependencies": {"X": "1.0.0"}, "devDependencies": {"Y": "1"}}"#);
        patch_manifest(&mut manifest, Dialect::Npm, None, &overrides(&[("X", "2.0.0")]));

        let value = manifest.as_value();
        assert_eq!(value["dependencies"]["X"], "2.0.0");
        assert_eq!(value["overrides"]["X"], "2.0.0");
        assert_eq!(value["devDependencies"].get("X"), None);
    }

    #[test]
    fn test_npm_skips_empty_dependency_entries() {
        let mut manifest = manifest(r#"{"devDependencies": {"X": ""}}"#);
        patch_manifest(&mut manifest, Dialect::Npm, None, &overrides(&[("X", "2.0.0")]));
        assert_eq!(manifest.as_value()["devDependencies"]["X"], "");
    }

    #[test]
    fn test_yarn_uses_resolutions() {
        let mut manifest = manifest(r#"{"resolutions": {"other": "1"}}"#);
        patch_manifest(&mut manifest, Dialect::Yarn, None, &overrides(&[("vite", "/ci/vite")]));

        let value = manifest.as_value();
        assert_eq!(value["resolutions"]["other"], "1");
        assert_eq!(value["resolutions"]["vite"], "/ci/vite");
        assert_eq!(value.get("overrides"), None);
    }

    #[test]
    fn test_pnpm_mirrors_into_dev_dependencies() {
        let mut manifest = manifest(r#"{"name": "app", "pnpm": {"overrides": {"a": "1"}}}"#);
        patch_manifest(
            &mut manifest,
            Dialect::Pnpm,
            Some("8.6.0"),
            &overrides(&[("vite", "file:/ci/vite")]),
        );

        insta::assert_snapshot!(manifest.to_pretty_string().unwrap(), @r#"
        {
          "name": "app",
          "pnpm": {
            "overrides": {
              "a": "1",
              "vite": "file:/ci/vite"
            }
          },
          "devDependencies": {
            "vite": "file:/ci/vite"
          }
        }
        "#);
    }

    #[test]
    fn test_pnpm_7_18_0_is_pinned_forward() {
        testing_logger::setup();
        let mut manifest = manifest(r#"{"engines": {"node": ">=18"}}"#);
        patch_manifest(&mut manifest, Dialect::Pnpm, Some("7.18.0\n"), &overrides(&[]));

        let value = manifest.as_value();
        assert_eq!(value["packageManager"], "pnpm@7.18.1");
        assert_eq!(value["engines"]["pnpm"], "7.18.1");
        assert_eq!(value["engines"]["node"], ">=18");
        testing_logger::validate(|logs| {
            assert!(logs
                .iter()
                .any(|l| l.level == log::Level::Warn && l.body.contains("pnpm@7.18.1")));
        });
    }

    #[test]
    fn test_version_is_never_local() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("1.0.0")).unwrap();
        assert!(!is_local_override(temp_dir.path(), "1.0.0").unwrap());
        assert_eq!(use_file_protocol(temp_dir.path(), "1.0.0").unwrap(), "1.0.0");
    }

    #[test]
    fn test_existing_directory_becomes_file_reference() {
        let temp_dir = TempDir::new().unwrap();
        let pkg = temp_dir.path().join("packages/vite");
        fs::create_dir_all(&pkg).unwrap();

        let absolute = pkg.to_string_lossy();
        assert_eq!(
            use_file_protocol(Path::new("/"), &absolute).unwrap(),
            format!("file:{}", absolute)
        );
        assert_eq!(
            use_file_protocol(temp_dir.path(), "./packages/vite").unwrap(),
            format!("file:{}", absolute)
        );
    }

    #[test]
    fn test_missing_path_and_scoped_name_stay_literal() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(
            use_file_protocol(temp_dir.path(), "missing/dir").unwrap(),
            "missing/dir"
        );
        fs::create_dir_all(temp_dir.path().join("@scope/pkg")).unwrap();
        assert_eq!(
            use_file_protocol(temp_dir.path(), "@scope/pkg").unwrap(),
            "@scope/pkg"
        );
    }

    #[test]
    fn test_concrete_overrides_drop_unresolved_entries() {
        let overrides: Overrides = [
            ("a", crate::overrides::OverrideValue::Auto),
            ("b", crate::overrides::OverrideValue::Disabled),
            ("c", "^2.0.0".into()),
        ]
        .into_iter()
        .collect();
        let concrete = concrete_overrides(Path::new("/"), &overrides).unwrap();
        assert_eq!(concrete, vec![("c".to_string(), "^2.0.0".to_string())]);
    }

    fn repo(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }
        temp_dir
    }

    fn session(runner: &RecordingRunner, dir: &Path) -> Session {
        let mut session = Session::with_runner(dir, dir, "vite", Box::new(runner.clone()))
            .with_output(OutputConfig::plain());
        session.cd(dir);
        session
    }

    #[test]
    fn test_apply_overrides_npm() {
        let dir = repo(&[
            ("package.json", r#"{"dependencies": {"vite": "^4.0.0"}}"#),
            ("package-lock.json", "{}"),
        ]);
        let runner = RecordingRunner::new();
        let mut session = session(&runner, dir.path());
        let mut manifest = Manifest::read(dir.path()).unwrap();
        let overrides: Overrides = [("vite", "5.0.0")].into_iter().collect();

        apply_overrides(&mut session, dir.path(), &mut manifest, &overrides).unwrap();

        assert_eq!(runner.commands(), vec!["git clean -fdxq", "npm install"]);
        let written = Manifest::read(dir.path()).unwrap().as_value();
        assert_eq!(written["dependencies"]["vite"], "5.0.0");
        assert_eq!(written["overrides"]["vite"], "5.0.0");
    }

    #[test]
    fn test_apply_overrides_pnpm_queries_version() {
        let dir = repo(&[("package.json", "{}"), ("pnpm-lock.yaml", "")]);
        let runner = RecordingRunner::new();
        runner.respond("pnpm --version", "8.15.1");
        let mut session = session(&runner, dir.path());
        let mut manifest = Manifest::read(dir.path()).unwrap();
        let overrides: Overrides = [("vite", "5.0.0")].into_iter().collect();

        apply_overrides(&mut session, dir.path(), &mut manifest, &overrides).unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "git clean -fdxq",
                "pnpm --version",
                "pnpm install --prefer-frozen-lockfile --prefer-offline --strict-peer-dependencies false",
            ]
        );
        let written = Manifest::read(dir.path()).unwrap().as_value();
        assert_eq!(written["pnpm"]["overrides"]["vite"], "5.0.0");
        assert_eq!(written.get("packageManager"), None);
    }

    #[test]
    fn test_apply_overrides_unsupported() {
        let runner = RecordingRunner::new();

        let dir = repo(&[("package.json", "{}"), ("bun.lockb", "")]);
        let mut session = session(&runner, dir.path());
        let mut manifest = Manifest::read(dir.path()).unwrap();
        let err = apply_overrides(&mut session, dir.path(), &mut manifest, &Overrides::new()).unwrap_err();
        assert_eq!(err.to_string(), "unsupported package manager detected: bun");

        let dir = repo(&[("package.json", "{}")]);
        let mut manifest = Manifest::read(dir.path()).unwrap();
        let err = apply_overrides(&mut session, dir.path(), &mut manifest, &Overrides::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPackageManager { .. }));
        assert_eq!(runner.count("npm"), 0);
    }
}
