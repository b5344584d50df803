//! # Override Resolution
//!
//! Computes the concrete overrides applied to a downstream repository:
//!
//! 1. With a pinned `release`, the target package resolves to that version.
//!    An explicit override of the target package to anything else conflicts.
//! 2. Otherwise the target package and its companions point at the local
//!    checkout. Majors below 4 also pin a fixed set of legacy companions and
//!    the type definitions installed in the checkout.
//! 3. From major 4 on, every registered build providing a package the
//!    repository needs is built, and its packages point into the build.
//!
//! A package "needs" an override when it is explicitly `true`, or when the
//! repository depends on it and the caller said nothing about it. Explicit
//! strings always win over computed defaults.
//!
//! Building happens through the [`Builder`] passed in by the caller, which
//! normally runs the complete workflow for the build's repository. Resolving
//! overrides can therefore clone, install and build other repositories.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::orchestrator::RunOptions;
use crate::overrides::{OverrideValue, Overrides};
use crate::registry::{BuildDefinition, BuildRegistry};
use crate::session::Session;
use crate::target::{TargetLibrary, LEGACY_MAJOR_BELOW};

/// Produces a local build for a build definition.
pub trait Builder {
    /// Builds `definition` and returns the root directory of its checkout.
    fn build(
        &mut self,
        session: &mut Session,
        definition: &BuildDefinition,
        options: &RunOptions,
    ) -> Result<PathBuf>;
}

/// Whether `package` should receive an automatically resolved override.
pub fn needs_override(overrides: &Overrides, deps: &BTreeSet<String>, package: &str) -> bool {
    match overrides.get(package) {
        Some(OverrideValue::Auto) => true,
        Some(_) => false,
        None => deps.contains(package),
    }
}

/// Build definitions that provide at least one package needing an override,
/// in registration order.
pub fn plan_builds<'r>(
    registry: &'r BuildRegistry,
    manifest: &Manifest,
    overrides: &Overrides,
) -> Vec<&'r BuildDefinition> {
    let deps = manifest.dependency_names();
    registry
        .iter()
        .filter(|build| {
            build
                .packages
                .keys()
                .any(|package| needs_override(overrides, &deps, package))
        })
        .collect()
}

/// Resolves the overrides for one repository.
///
/// `requested` holds the caller's overrides (run-level merged with
/// suite-level). The result may still contain `Auto` or `Disabled` entries
/// that no default applied to; they are dropped when the manifest is patched.
#[allow(clippy::too_many_arguments)]
pub fn resolve_overrides(
    session: &mut Session,
    target: &TargetLibrary,
    registry: &BuildRegistry,
    builder: &mut dyn Builder,
    manifest: &Manifest,
    options: &RunOptions,
    requested: &Overrides,
) -> Result<Overrides> {
    let mut overrides = requested.clone();

    if let Some(release) = &options.release {
        if let Some(OverrideValue::Spec(existing)) = overrides.get(&target.package) {
            if existing != release {
                return Err(Error::ConflictingOverrides {
                    package: target.package.clone(),
                    existing: existing.clone(),
                    release: release.clone(),
                });
            }
        }
        overrides.insert(target.package.clone(), release.as_str());
        return Ok(overrides);
    }

    let target_path = session.target_path().to_path_buf();
    let local = |dir: &str| target_path.join(dir).to_string_lossy().into_owned();

    overrides.set_default(&target.package, local(&target.package_dir));
    for (name, dir) in &target.companions {
        overrides.set_default(name, local(dir));
    }

    if options.target_major < LEGACY_MAJOR_BELOW {
        for (name, dir) in &target.legacy_companions {
            overrides.set_default(name, local(dir));
        }
        // keep the toolchain's type definitions in step with the checkout
        if let Some(types) = &target.legacy_types_package {
            if overrides.accepts_default(types) {
                let installed = fs::canonicalize(target_path.join("node_modules").join(types))?;
                overrides.set_default(types, installed.to_string_lossy());
            }
        }
        return Ok(overrides);
    }

    let built = build_overrides(session, registry, builder, manifest, options, &overrides)?;
    overrides.merge(&built);
    Ok(overrides)
}

/// Builds every planned definition and maps its packages into the build.
pub fn build_overrides(
    session: &mut Session,
    registry: &BuildRegistry,
    builder: &mut dyn Builder,
    manifest: &Manifest,
    options: &RunOptions,
    overrides: &Overrides,
) -> Result<Overrides> {
    let deps = manifest.dependency_names();
    let nested = RunOptions {
        overrides: Overrides::new(),
        ..options.clone()
    };

    let mut built = Overrides::new();
    for definition in plan_builds(registry, manifest, overrides) {
        let wanted: Vec<&str> = definition
            .packages
            .keys()
            .map(String::as_str)
            .filter(|package| needs_override(overrides, &deps, package))
            .collect();
        log::info!(
            "Building {} locally for {}",
            definition.name(),
            wanted.join(", ")
        );

        let dir = builder.build(session, definition, &nested)?;
        for package in wanted {
            let relative = &definition.packages[package];
            built.insert(package, format!("{}/{}", dir.display(), relative));
        }
    }
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputConfig;
    use crate::registry::Suite;
    use crate::testing::RecordingRunner;
    use std::path::Path;
    use tempfile::TempDir;

    struct FakeBuilder {
        built: Vec<String>,
        dir: PathBuf,
    }

    impl Builder for FakeBuilder {
        fn build(
            &mut self,
            _session: &mut Session,
            definition: &BuildDefinition,
            options: &RunOptions,
        ) -> Result<PathBuf> {
            assert!(options.overrides.is_empty());
            self.built.push(definition.name().to_string());
            Ok(self.dir.join(definition.name()))
        }
    }

    fn fake_builder() -> FakeBuilder {
        FakeBuilder {
            built: Vec::new(),
            dir: PathBuf::from("/builds"),
        }
    }

    fn session() -> Session {
        Session::with_runner("/ci", "/ci/workspace", "vite", Box::new(RecordingRunner::new()))
            .with_output(OutputConfig::plain())
    }

    fn options(major: u64) -> RunOptions {
        RunOptions {
            target_major: major,
            ..RunOptions::default()
        }
    }

    fn registry() -> BuildRegistry {
        [
            BuildDefinition::new(Suite::new("plugin-a", "x/plugin-a")).with_package("A", "dist"),
            BuildDefinition::new(Suite::new("plugin-b", "x/plugin-b")).with_package("B", "packages/b"),
        ]
        .into_iter()
        .collect()
    }

    fn manifest(json: &str) -> Manifest {
        Manifest::parse("/repo/package.json", json).unwrap()
    }

    fn spec<'a>(overrides: &'a Overrides, name: &str) -> Option<&'a str> {
        overrides.get(name).and_then(OverrideValue::as_spec)
    }

    #[test]
    fn test_release_pins_target() {
        let mut builder = fake_builder();
        let options = RunOptions {
            release: Some("4.2.0".to_string()),
            ..options(4)
        };
        let resolved = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &registry(),
            &mut builder,
            &manifest(r#"{"devDependencies": {"A": "1"}}"#),
            &options,
            &Overrides::new(),
        )
        .unwrap();

        assert_eq!(spec(&resolved, "vite"), Some("4.2.0"));
        assert_eq!(resolved.len(), 1);
        assert!(builder.built.is_empty());
    }

    #[test]
    fn test_release_matching_explicit_override_is_fine() {
        let requested: Overrides = [("vite", "1.2.3")].into_iter().collect();
        let options = RunOptions {
            release: Some("1.2.3".to_string()),
            ..options(4)
        };
        let resolved = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &registry(),
            &mut fake_builder(),
            &manifest("{}"),
            &options,
            &requested,
        )
        .unwrap();
        assert_eq!(spec(&resolved, "vite"), Some("1.2.3"));
    }

    #[test]
    fn test_release_conflicting_explicit_override() {
        let requested: Overrides = [("vite", "1.2.3")].into_iter().collect();
        let options = RunOptions {
            release: Some("9.9.9".to_string()),
            ..options(4)
        };
        let err = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &registry(),
            &mut fake_builder(),
            &manifest("{}"),
            &options,
            &requested,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConflictingOverrides { .. }));
    }

    #[test]
    fn test_defaults_point_at_checkout() {
        let resolved = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &BuildRegistry::new(),
            &mut fake_builder(),
            &manifest("{}"),
            &options(5),
            &Overrides::new(),
        )
        .unwrap();

        assert_eq!(spec(&resolved, "vite"), Some("/ci/workspace/vite/packages/vite"));
        assert_eq!(
            spec(&resolved, "@vitejs/plugin-legacy"),
            Some("/ci/workspace/vite/packages/plugin-legacy")
        );
        assert_eq!(resolved.get("@vitejs/plugin-vue"), None);
    }

    #[test]
    fn test_explicit_spec_wins_over_default() {
        let requested: Overrides = [("vite", "5.0.0")].into_iter().collect();
        let resolved = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &BuildRegistry::new(),
            &mut fake_builder(),
            &manifest("{}"),
            &options(5),
            &requested,
        )
        .unwrap();
        assert_eq!(spec(&resolved, "vite"), Some("5.0.0"));
    }

    #[test]
    fn test_auto_dev_dependency_is_built() {
        let mut builder = fake_builder();
        let requested: Overrides = [("A", true)].into_iter().collect();
        let resolved = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &registry(),
            &mut builder,
            &manifest(r#"{"devDependencies": {"A": "^1.0.0"}}"#),
            &options(4),
            &requested,
        )
        .unwrap();

        assert_eq!(builder.built, vec!["plugin-a"]);
        assert_eq!(spec(&resolved, "A"), Some("/builds/plugin-a/dist"));
        assert_eq!(resolved.get("B"), None);
    }

    #[test]
    fn test_unmentioned_dependency_is_built() {
        let mut builder = fake_builder();
        let resolved = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &registry(),
            &mut builder,
            &manifest(r#"{"peerDependencies": {"B": "*"}}"#),
            &options(4),
            &Overrides::new(),
        )
        .unwrap();

        assert_eq!(builder.built, vec!["plugin-b"]);
        assert_eq!(spec(&resolved, "B"), Some("/builds/plugin-b/packages/b"));
    }

    #[test]
    fn test_explicit_or_disabled_dependency_is_not_built() {
        let mut builder = fake_builder();
        let requested: Overrides = [
            ("A", OverrideValue::from("2.0.0")),
            ("B", OverrideValue::Disabled),
        ]
        .into_iter()
        .collect();
        let resolved = resolve_overrides(
            &mut session(),
            &TargetLibrary::default(),
            &registry(),
            &mut builder,
            &manifest(r#"{"dependencies": {"A": "1", "B": "1"}}"#),
            &options(4),
            &requested,
        )
        .unwrap();

        assert!(builder.built.is_empty());
        assert_eq!(spec(&resolved, "A"), Some("2.0.0"));
        assert_eq!(resolved.get("B"), Some(&OverrideValue::Disabled));
    }

    #[test]
    fn test_auto_without_dependency_still_builds() {
        let mut builder = fake_builder();
        let requested: Overrides = [("B", true)].into_iter().collect();
        build_overrides(
            &mut session(),
            &registry(),
            &mut builder,
            &manifest("{}"),
            &options(4),
            &requested,
        )
        .unwrap();
        assert_eq!(builder.built, vec!["plugin-b"]);
    }

    #[test]
    fn test_legacy_major_pins_companions_and_types() {
        let temp_dir = TempDir::new().unwrap();
        let types_dir = temp_dir.path().join("vite/node_modules/@types/node");
        fs::create_dir_all(&types_dir).unwrap();

        let mut session = Session::with_runner(
            temp_dir.path(),
            temp_dir.path(),
            "vite",
            Box::new(RecordingRunner::new()),
        )
        .with_output(OutputConfig::plain());
        let mut builder = fake_builder();

        let resolved = resolve_overrides(
            &mut session,
            &TargetLibrary::default(),
            &registry(),
            &mut builder,
            &manifest(r#"{"devDependencies": {"A": "1"}}"#),
            &options(3),
            &Overrides::new(),
        )
        .unwrap();

        assert!(builder.built.is_empty());
        assert!(spec(&resolved, "@vitejs/plugin-vue")
            .unwrap()
            .ends_with("vite/packages/plugin-vue"));
        let types = spec(&resolved, "@types/node").unwrap();
        assert_eq!(Path::new(types), fs::canonicalize(&types_dir).unwrap());
    }

    #[test]
    fn test_legacy_major_missing_types_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut session = Session::with_runner(
            temp_dir.path(),
            temp_dir.path(),
            "vite",
            Box::new(RecordingRunner::new()),
        )
        .with_output(OutputConfig::plain());

        let result = resolve_overrides(
            &mut session,
            &TargetLibrary::default(),
            &BuildRegistry::new(),
            &mut fake_builder(),
            &manifest("{}"),
            &options(2),
            &Overrides::new(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_plan_builds_ignores_unrelated_builds() {
        let registry = registry();
        let planned = plan_builds(
            &registry,
            &manifest(r#"{"dependencies": {"unrelated": "1"}}"#),
            &Overrides::new(),
        );
        assert!(planned.is_empty());
    }
}
