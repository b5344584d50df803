//! Package overrides requested by a run or a suite.
//!
//! In configuration an override is either a string (a version specifier or a
//! path to a local build) or a boolean: `true` asks for the override to be
//! resolved automatically from a registered build, `false` pins the package
//! to whatever the repository already declares.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "OverrideRepr")]
pub enum OverrideValue {
    /// Resolve from the target checkout or a registered build.
    Auto,
    /// Never override.
    Disabled,
    /// Version specifier or local path.
    Spec(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OverrideRepr {
    Flag(bool),
    Spec(String),
}

impl From<OverrideRepr> for OverrideValue {
    fn from(repr: OverrideRepr) -> Self {
        match repr {
            OverrideRepr::Flag(true) => OverrideValue::Auto,
            OverrideRepr::Flag(false) => OverrideValue::Disabled,
            OverrideRepr::Spec(spec) => OverrideValue::Spec(spec),
        }
    }
}

impl From<&str> for OverrideValue {
    fn from(spec: &str) -> Self {
        OverrideValue::Spec(spec.to_string())
    }
}

impl From<String> for OverrideValue {
    fn from(spec: String) -> Self {
        OverrideValue::Spec(spec)
    }
}

impl From<bool> for OverrideValue {
    fn from(flag: bool) -> Self {
        OverrideRepr::Flag(flag).into()
    }
}

impl OverrideValue {
    pub fn as_spec(&self) -> Option<&str> {
        match self {
            OverrideValue::Spec(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Package name to override, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Overrides(BTreeMap<String, OverrideValue>);

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&OverrideValue> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OverrideValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Entries with a concrete specifier; `Auto` and `Disabled` are dropped.
    pub fn specs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|(name, value)| value.as_spec().map(|spec| (name.as_str(), spec)))
    }

    /// Whether `name` is still open to a computed default: absent or `Auto`.
    pub fn accepts_default(&self, name: &str) -> bool {
        matches!(self.0.get(name), None | Some(OverrideValue::Auto))
    }

    /// Sets `name` to `spec` unless the caller already decided otherwise.
    pub fn set_default(&mut self, name: &str, spec: impl Into<String>) {
        if self.accepts_default(name) {
            self.0.insert(name.to_string(), OverrideValue::Spec(spec.into()));
        }
    }

    /// Entries of `other` replace entries of `self`.
    pub fn merge(&mut self, other: &Overrides) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Overrides
where
    K: Into<String>,
    V: Into<OverrideValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
