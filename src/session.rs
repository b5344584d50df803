//! # Execution Session
//!
//! A [`Session`] carries everything a shelled command needs: the tool root,
//! the workspace holding every clone, the local checkout of the target
//! library, the current working directory and the environment passed to child
//! processes. It is threaded by `&mut` through every operation, so directory
//! changes are explicit and two workflows cannot interleave on one session.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;
use crate::output::OutputConfig;
use crate::runner::{CommandRunner, CommandSpec, ShellRunner};

/// Fixed additions to the inherited environment of every spawned command.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CI", "true"),
    // monorepo task caches would replay builds of the unmodified sources
    ("TURBO_FORCE", "true"),
    // lockfiles change once overrides are applied
    ("YARN_ENABLE_IMMUTABLE_INSTALLS", "false"),
    ("NODE_OPTIONS", "--max-old-space-size=6144"),
];

/// Execution context shared by all workflow steps.
pub struct Session {
    root: PathBuf,
    workspace: PathBuf,
    target_path: PathBuf,
    cwd: PathBuf,
    env: BTreeMap<String, String>,
    output: OutputConfig,
    runner: Box<dyn CommandRunner>,
}

impl Session {
    /// Creates a session that spawns real processes.
    pub fn new(root: impl Into<PathBuf>, workspace: impl Into<PathBuf>, target_dir: &str) -> Self {
        Self::with_runner(root, workspace, target_dir, Box::new(ShellRunner))
    }

    /// Creates a session with a custom `CommandRunner`.
    ///
    /// The target library is checked out at `<workspace>/<target_dir>`. The
    /// environment is inherited from this process plus [`ENV_OVERRIDES`].
    pub fn with_runner(
        root: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
        target_dir: &str,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        let root = root.into();
        let workspace = workspace.into();
        let target_path = workspace.join(target_dir);
        let cwd = std::env::current_dir().unwrap_or_else(|_| root.clone());

        let mut env = inherited_env(std::env::vars_os());
        for (key, value) in ENV_OVERRIDES {
            env.insert((*key).to_string(), (*value).to_string());
        }

        Self {
            root,
            workspace,
            target_path,
            cwd,
            env,
            output: OutputConfig::default(),
            runner,
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Local checkout of the target library.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Sets an extra environment variable for all later commands.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    /// Changes the working directory, resolving `dir` against the current one.
    pub fn cd(&mut self, dir: impl AsRef<Path>) {
        self.cwd = resolve(&self.cwd, dir.as_ref());
    }

    /// Runs a command in the current working directory.
    pub fn run(&self, command: &CommandSpec) -> Result<String> {
        self.run_in(&self.cwd, command)
    }

    /// Runs a command in `dir` without changing the working directory.
    pub fn run_in(&self, dir: &Path, command: &CommandSpec) -> Result<String> {
        let line = command.to_string();
        println!("{}", self.output.command_header(dir, &line));
        let result = self.runner.run(command, dir, &self.env);
        if let Some(footer) = self.output.command_footer() {
            println!("{}", footer);
        }
        result
    }

    /// Runs a whitespace-separated command line; blank lines are a no-op.
    pub fn exec(&self, line: &str) -> Result<String> {
        match CommandSpec::parse(line) {
            Some(command) => self.run(&command),
            None => Ok(String::new()),
        }
    }
}

/// Keeps the variables that are valid Unicode; the rest are skipped.
fn inherited_env<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                log::debug!("Skipping non-UTF-8 environment variable {:?}", key);
                None
            }
        })
        .collect()
}

/// Joins `path` onto `base` and normalizes `.` and `..` components lexically.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    let joined = base.join(path);
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
