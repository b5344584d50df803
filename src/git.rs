//! Git invocations used by repository sync and bisection.
//!
//! These are thin wrappers around the system `git` command, which
//! automatically handles SSH keys, credential helpers and any authentication
//! configured in `~/.gitconfig`. All of them run through the session so they
//! are announced and recorded like any other command.

use std::path::Path;

use crate::error::{Error, Result};
use crate::runner::CommandSpec;
use crate::session::Session;

fn git() -> CommandSpec {
    CommandSpec::new("git")
}

/// Returns the URL of the `origin` remote of the repository in `dir`.
pub fn remote_url(session: &Session, dir: &Path) -> Result<String> {
    let command = git().args(["ls-remote", "--get-url"]);
    session
        .run_in(dir, &command)
        .map(|url| url.trim().to_string())
        .map_err(|e| Error::GitCommand {
            command: command.to_string(),
            dir: dir.to_path_buf(),
            stderr: e.to_string(),
        })
}

/// Clones `url` at `ref_name` into `dir`; shallow clones skip history and tags.
pub fn clone(session: &Session, url: &str, ref_name: &str, dir: &Path, shallow: bool) -> Result<()> {
    let mut command = git().args(["-c", "advice.detachedHead=false", "clone"]);
    if shallow {
        command = command.args(["--depth=1", "--no-tags"]);
    }
    command = command
        .args(["--branch", ref_name, url])
        .arg(dir.to_string_lossy());
    session.run(&command)?;
    Ok(())
}

/// Removes untracked and ignored files from the current directory.
pub fn clean(session: &Session) -> Result<()> {
    session.run(&git().args(["clean", "-fdxq"]))?;
    Ok(())
}

/// What to fetch from `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRef<'a> {
    Tag(&'a str),
    Rev(&'a str),
}

pub fn fetch(session: &Session, target: FetchRef<'_>, shallow: bool) -> Result<()> {
    let mut command = git().arg("fetch");
    command = if shallow {
        command.args(["--depth=1", "--no-tags"])
    } else {
        command.arg("--tags")
    };
    command = command.arg("origin");
    command = match target {
        FetchRef::Tag(tag) => command.args(["tag", tag]),
        FetchRef::Rev(rev) => command.arg(rev),
    };
    session.run(&command)?;
    Ok(())
}

pub fn checkout(session: &Session, rev: &str) -> Result<()> {
    session.run(&git().args(["-c", "advice.detachedHead=false", "checkout", rev]))?;
    Ok(())
}

pub fn merge_fetch_head(session: &Session) -> Result<()> {
    session.run(&git().args(["merge", "FETCH_HEAD"]))?;
    Ok(())
}

pub fn reset_hard(session: &Session, rev: &str) -> Result<()> {
    session.run(&git().args(["reset", "--hard", rev]))?;
    Ok(())
}

/// Abbreviated hash of `HEAD`.
pub fn short_head(session: &Session) -> Result<String> {
    session.run(&git().args(["log", "-1", "--pretty=format:%h"]))
}

/// Subject line of the `HEAD` commit.
pub fn head_subject(session: &Session) -> Result<String> {
    session.run(&git().args(["log", "-1", "--format=%s"]))
}

/// Runs `git bisect <args>` and returns its output.
pub fn bisect<'a>(session: &Session, args: impl IntoIterator<Item = &'a str>) -> Result<String> {
    session.run(&git().arg("bisect").args(args))
}
