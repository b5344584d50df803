//! Property-based tests for override resolution and manifest patching.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::Manifest;
    use crate::overrides::{OverrideValue, Overrides};
    use crate::package_manager::Dialect;
    use crate::patcher::{concrete_overrides, patch_manifest, use_file_protocol};
    use proptest::prelude::*;
    use std::path::Path;

    fn version() -> impl Strategy<Value = String> {
        prop_oneof![
            "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}",
            "\\^[0-9]\\.[0-9]\\.[0-9]",
            "~[0-9]\\.[0-9]",
            Just("latest".to_string()),
        ]
    }

    fn package_name() -> impl Strategy<Value = String> {
        prop_oneof!["[a-z][a-z0-9-]{0,8}", "@[a-z]{1,5}/[a-z][a-z0-9-]{0,8}"]
    }

    proptest! {
        /// Property: values without a path separator are never rewritten
        #[test]
        fn versions_are_never_local(value in version()) {
            prop_assert_eq!(use_file_protocol(Path::new("/"), &value).unwrap(), value);
        }

        /// Property: scoped package names are never treated as paths
        #[test]
        fn scoped_names_are_never_local(name in "@[a-z]{1,8}/[a-z]{1,8}") {
            prop_assert_eq!(use_file_protocol(Path::new("/"), &name).unwrap(), name);
        }

        /// Property: npm patching makes dependencies and overrides agree
        #[test]
        fn npm_dependencies_match_overrides(
            entries in proptest::collection::btree_map(package_name(), (version(), version()), 1..6)
        ) {
            let deps: serde_json::Map<String, serde_json::Value> = entries
                .iter()
                .map(|(name, (old, _))| (name.clone(), serde_json::Value::String(old.clone())))
                .collect();
            let json = serde_json::json!({ "dependencies": deps }).to_string();
            let mut manifest = Manifest::parse("/repo/package.json", &json).unwrap();
            let overrides: Vec<(String, String)> = entries
                .iter()
                .map(|(name, (_, new))| (name.clone(), new.clone()))
                .collect();

            patch_manifest(&mut manifest, Dialect::Npm, None, &overrides);

            let value = manifest.as_value();
            for (name, new) in &overrides {
                prop_assert_eq!(value["dependencies"][name].as_str(), Some(new.as_str()));
                prop_assert_eq!(value["overrides"][name].as_str(), Some(new.as_str()));
            }
        }

        /// Property: only concrete specifiers reach the manifest
        #[test]
        fn unresolved_values_are_filtered(
            entries in proptest::collection::btree_map(package_name(), prop_oneof![
                Just(OverrideValue::Auto),
                Just(OverrideValue::Disabled),
                version().prop_map(OverrideValue::Spec),
            ], 0..8)
        ) {
            let expected = entries
                .values()
                .filter(|v| matches!(v, OverrideValue::Spec(_)))
                .count();
            let overrides: Overrides = entries.into_iter().collect();
            let concrete = concrete_overrides(Path::new("/"), &overrides).unwrap();
            prop_assert_eq!(concrete.len(), expected);
        }
    }
}
