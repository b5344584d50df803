//! # External Command Execution
//!
//! Every git and package-manager invocation goes through the
//! [`CommandRunner`] trait. The default [`ShellRunner`] spawns the process,
//! streams its stdout live while also capturing it, and lets stderr pass
//! straight through to the terminal. Tests substitute a recording runner so
//! the workflows can be exercised without real repositories.
//!
//! Commands are plain argument vectors. A command line given as a string is
//! split on whitespace; no shell is involved, so quoting and globbing are not
//! interpreted.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Split a command line on whitespace. Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).args(parts))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Trait for running external commands - allows mocking in tests
pub trait CommandRunner: Send + Sync {
    /// Runs `command` in `cwd` with exactly the environment `env` and returns
    /// its stdout with the final newline stripped.
    ///
    /// A non-zero exit status is an error.
    fn run(&self, command: &CommandSpec, cwd: &Path, env: &BTreeMap<String, String>)
        -> Result<String>;
}

/// The default implementation of `CommandRunner`, which spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(
        &self,
        command: &CommandSpec,
        cwd: &Path,
        env: &BTreeMap<String, String>,
    ) -> Result<String> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .env_clear()
            .envs(env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Command {
                command: command.to_string(),
                cwd: cwd.to_path_buf(),
                status: "failed to start".to_string(),
                stderr: e.to_string(),
            })?;

        let mut captured = Vec::new();
        let forwarded = match child.stdout.take() {
            Some(stdout) => tee(BufReader::new(stdout), &mut io::stdout(), &mut captured),
            None => Ok(()),
        };

        // Reap the child even when forwarding failed.
        let status = child.wait()?;
        forwarded?;
        if !status.success() {
            return Err(Error::Command {
                command: command.to_string(),
                cwd: cwd.to_path_buf(),
                status: status.to_string(),
                stderr: String::new(),
            });
        }

        Ok(strip_final_newline(
            String::from_utf8_lossy(&captured).into_owned(),
        ))
    }
}

/// Copies `reader` to `terminal` line by line, keeping the raw bytes.
fn tee<R: BufRead, W: Write>(
    mut reader: R,
    terminal: &mut W,
    captured: &mut Vec<u8>,
) -> io::Result<()> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        terminal.write_all(&line)?;
        terminal.flush()?;
        captured.extend_from_slice(&line);
    }
    Ok(())
}

fn strip_final_newline(mut output: String) -> String {
    if output.ends_with('\n') {
        output.pop();
        if output.ends_with('\r') {
            output.pop();
        }
    }
    output
}
