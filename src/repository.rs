//! # Repository Synchronization
//!
//! [`ensure_repo`] makes a workspace directory a clean checkout of a remote
//! repository at a requested branch, tag or commit. An existing clone is
//! reused when its `origin` already points at the requested remote; anything
//! else at that path is deleted and cloned afresh. Cleaning, fetching and
//! checking out happen on every call, so a reused clone ends up in the same
//! state as a fresh one.
//!
//! Shallow checkouts (the default) fetch a single revision without tags. Full
//! checkouts fetch all tags and merge the branch so later bisection has the
//! history it needs.
//!
//! The module also covers the target library's own checkout: cloning it with
//! an identity check, reading a permanent ref and building it.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::git::{self, FetchRef};
use crate::manifest::Manifest;
use crate::package_manager;
use crate::session::{resolve, Session};
use crate::target::TargetLibrary;

pub const DEFAULT_BRANCH: &str = "main";

/// Where and what to check out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepoOptions {
    /// `owner/name` on GitHub, or any URL git understands.
    pub repo: String,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    /// Checkout directory, resolved against the session's working directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub shallow: Option<bool>,
}

impl RepoOptions {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            ..Self::default()
        }
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn shallow(&self) -> bool {
        self.shallow.unwrap_or(true)
    }

    /// The clone URL, expanding `owner/name` to GitHub.
    pub fn url(&self) -> String {
        normalize_repo_url(&self.repo)
    }
}

/// Expands `owner/name` to `https://github.com/owner/name.git`; anything with
/// a scheme or scp-style host (`:`) is returned unchanged.
pub fn normalize_repo_url(repo: &str) -> String {
    if repo.contains(':') {
        repo.to_string()
    } else {
        format!("https://github.com/{}.git", repo)
    }
}

/// The last path segment of `repo`, used as the default checkout directory.
pub fn repo_dir_name(repo: &str) -> &str {
    repo.rsplit('/').next().unwrap_or(repo)
}

/// Makes `options.dir` a clean checkout of `options.repo` and leaves the
/// session inside it.
pub fn ensure_repo(session: &mut Session, options: &RepoOptions) -> Result<()> {
    let dir = options.dir.as_ref().ok_or_else(|| Error::MissingOption {
        option: "options.dir".to_string(),
        context: "ensure_repo".to_string(),
    })?;
    let dir = resolve(session.cwd(), dir);
    let url = options.url();
    let branch = options.branch();
    let shallow = options.shallow();
    let tag = options.tag.as_deref();
    let commit = options.commit.as_deref();

    let mut need_clone = true;
    if dir.exists() {
        // a directory that is not a git repository counts as a mismatch
        let current = git::remote_url(session, &dir).ok();
        if current.as_deref() == Some(url.as_str()) {
            need_clone = false;
        } else {
            log::info!(
                "{} points at {}, re-cloning from {}",
                dir.display(),
                current.as_deref().unwrap_or("<no remote>"),
                url
            );
            fs::remove_dir_all(&dir)?;
        }
    }

    if need_clone {
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent)?;
        }
        git::clone(session, &url, tag.unwrap_or(branch), &dir, shallow)?;
    }

    session.cd(&dir);
    git::clean(session)?;

    let rev = commit.unwrap_or(branch);
    let fetch_ref = match tag {
        Some(tag) => FetchRef::Tag(tag),
        None => FetchRef::Rev(rev),
    };
    git::fetch(session, fetch_ref, shallow)?;

    if shallow {
        let target = match tag {
            Some(tag) => format!("tags/{}", tag),
            None => rev.to_string(),
        };
        git::checkout(session, &target)?;
    } else {
        git::checkout(session, branch)?;
        git::merge_fetch_head(session)?;
        if let Some(reset_to) = tag.or(commit) {
            git::reset_hard(session, reset_to)?;
        }
    }

    Ok(())
}

/// Checks out the target library into the session's target path and verifies
/// that the clone really is the target's monorepo.
///
/// `options.repo` defaults to the target's repository when empty; `dir` is
/// always the session's target path.
pub fn setup_target_repo(
    session: &mut Session,
    target: &TargetLibrary,
    options: &RepoOptions,
) -> Result<()> {
    let mut options = options.clone();
    if options.repo.is_empty() {
        options.repo = target.repo.clone();
    }
    options.dir = Some(session.target_path().to_path_buf());
    ensure_repo(session, &options)?;

    let manifest = Manifest::read(session.target_path()).map_err(|e| Error::Verification {
        message: format!("Non-{} repository was cloned. ({})", target.package, e),
    })?;
    let name = manifest.name().unwrap_or_default();
    if !target.is_monorepo_name(name) {
        return Err(Error::Verification {
            message: format!(
                "expected \"name\" field of {}/package.json to indicate {} monorepo, but got {}.",
                options.repo, target.package, name
            ),
        });
    }
    Ok(())
}

/// Abbreviated commit hash of the target checkout, or `None` with a warning
/// when it cannot be read.
pub fn permanent_ref(session: &mut Session) -> Option<String> {
    let target_path = session.target_path().to_path_buf();
    session.cd(&target_path);
    match git::short_head(session) {
        Ok(reference) => Some(reference),
        Err(e) => {
            log::warn!("Failed to obtain perm ref. {}", e);
            None
        }
    }
}

/// Installs and builds the target checkout, running its tests when `verify`.
pub fn build_target(session: &mut Session, verify: bool) -> Result<()> {
    let target_path = session.target_path().to_path_buf();
    session.cd(&target_path);
    let pm = package_manager::detect_or_npm(&target_path)?;
    session.run(&pm.frozen_install())?;
    session.run(&pm.run_script("build", &[]))?;
    if verify {
        session.run(&pm.run_script("test", &[]))?;
    }
    Ok(())
}
