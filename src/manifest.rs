//! # Package Manifest
//!
//! A `package.json` held as a `serde_json` object. Key order is preserved
//! (`serde_json`'s `preserve_order` feature), so a manifest written back after
//! patching keeps its original layout with new keys appended in the order
//! they were added.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "package.json";

/// Dependency tables consulted when deciding which packages a repo uses.
pub const DEPENDENCY_TABLES: &[&str] = &["dependencies", "devDependencies", "peerDependencies"];

/// Script names declared by a manifest, mapped to their command lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scripts(BTreeMap<String, String>);

impl Scripts {
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, String)> for Scripts {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    path: PathBuf,
    root: Map<String, Value>,
}

impl Manifest {
    /// Reads `<dir>/package.json`.
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| Error::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Self::parse(path, &content)
    }

    /// Parses manifest text; `path` is where [`Manifest::write`] will put it.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let value: Value = serde_json::from_str(content).map_err(|e| Error::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        match value {
            Value::Object(root) => Ok(Self { path, root }),
            other => Err(Error::Manifest {
                path,
                message: format!("expected a JSON object, found {}", json_type(&other)),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.root.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }

    /// The `packageManager` field, e.g. `pnpm@8.6.0`.
    pub fn package_manager(&self) -> Option<&str> {
        self.root.get("packageManager").and_then(Value::as_str)
    }

    /// Declared scripts; non-string entries are ignored.
    pub fn scripts(&self) -> Scripts {
        self.root
            .get("scripts")
            .and_then(Value::as_object)
            .map(|scripts| {
                scripts
                    .iter()
                    .filter_map(|(name, cmd)| cmd.as_str().map(|c| (name.clone(), c.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names from `dependencies`, `devDependencies` and `peerDependencies`.
    pub fn dependency_names(&self) -> BTreeSet<String> {
        DEPENDENCY_TABLES
            .iter()
            .filter_map(|table| self.root.get(*table).and_then(Value::as_object))
            .flat_map(|table| table.keys().cloned())
            .collect()
    }

    /// Whether `table` exists and has an entry for `name` with a non-empty value.
    pub fn has_entry(&self, table: &str, name: &str) -> bool {
        self.root
            .get(table)
            .and_then(Value::as_object)
            .and_then(|t| t.get(name))
            .is_some_and(is_truthy)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.root.insert(key.to_string(), value);
    }

    /// Returns the object at `path`, creating (or replacing non-object values
    /// with) empty objects along the way.
    pub fn table_mut(&mut self, path: &[&str]) -> &mut Map<String, Value> {
        let mut current = &mut self.root;
        for key in path {
            let entry = current
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just made an object"),
            };
        }
        current
    }

    /// Inserts every entry into the table at `path`. Existing keys keep their
    /// position, new keys are appended.
    pub fn merge_into<'a>(
        &mut self,
        path: &[&str],
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let table = self.table_mut(path);
        for (name, value) in entries {
            table.insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_pretty_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Writes the manifest back to its path.
    pub fn write(&self) -> Result<()> {
        let content = self.to_pretty_string()?;
        fs::write(&self.path, content).map_err(|e| Error::Manifest {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
