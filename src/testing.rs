//! Test doubles for driving workflows without real processes.
//!
//! [`RecordingRunner`] implements `CommandRunner` by recording each command
//! line and its working directory, answering from scripted responses matched
//! by command-line prefix. Queued one-shot responses are consumed first, in
//! order; standing responses apply every time; anything unmatched succeeds
//! with empty output.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::runner::{CommandRunner, CommandSpec};

#[derive(Debug, Clone)]
enum Response {
    Output(String),
    Failure(String),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<(String, PathBuf)>,
    queued: VecDeque<(String, Response)>,
    standing: Vec<(String, Response)>,
}

/// A cloneable recording runner; clones share the same log and responses.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    state: Arc<Mutex<State>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every command starting with `prefix` prints `output`.
    pub fn respond(&self, prefix: &str, output: &str) -> &Self {
        self.lock()
            .standing
            .push((prefix.to_string(), Response::Output(output.to_string())));
        self
    }

    /// Every command starting with `prefix` fails.
    pub fn fail(&self, prefix: &str, stderr: &str) -> &Self {
        self.lock()
            .standing
            .push((prefix.to_string(), Response::Failure(stderr.to_string())));
        self
    }

    /// The next command starting with `prefix` prints `output`.
    pub fn respond_once(&self, prefix: &str, output: &str) -> &Self {
        self.lock()
            .queued
            .push_back((prefix.to_string(), Response::Output(output.to_string())));
        self
    }

    /// The next command starting with `prefix` fails.
    pub fn fail_once(&self, prefix: &str, stderr: &str) -> &Self {
        self.lock()
            .queued
            .push_back((prefix.to_string(), Response::Failure(stderr.to_string())));
        self
    }

    /// All recorded command lines, in order.
    pub fn commands(&self) -> Vec<String> {
        self.lock().calls.iter().map(|(cmd, _)| cmd.clone()).collect()
    }

    /// All recorded command lines with their working directories.
    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.lock().calls.clone()
    }

    /// Number of recorded commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(prefix))
            .count()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(
        &self,
        command: &CommandSpec,
        cwd: &Path,
        _env: &BTreeMap<String, String>,
    ) -> Result<String> {
        let line = command.to_string();
        let mut state = self.lock();
        state.calls.push((line.clone(), cwd.to_path_buf()));

        let response = match state.queued.iter().position(|(p, _)| line.starts_with(p)) {
            Some(index) => state.queued.remove(index).map(|(_, r)| r),
            None => state
                .standing
                .iter()
                .rev()
                .find(|(p, _)| line.starts_with(p))
                .map(|(_, r)| r.clone()),
        };

        match response {
            Some(Response::Output(output)) => Ok(output),
            Some(Response::Failure(stderr)) => Err(Error::Command {
                command: line,
                cwd: cwd.to_path_buf(),
                status: "exit status: 1".to_string(),
                stderr,
            }),
            None => Ok(String::new()),
        }
    }
}
