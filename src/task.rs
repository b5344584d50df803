//! # Lifecycle Tasks
//!
//! A suite attaches tasks to five hooks: `before_install`, `before_build`,
//! `build`, `before_test` and `test`. Each task is one of:
//!
//! - [`Task::Raw`]: a command line run as-is in the repository,
//! - [`Task::Script`]: a script declared in `package.json`, run through the
//!   repository's package manager (extra words after the name are passed on),
//! - [`Task::Callback`]: Rust code, for suites registered programmatically.
//!
//! In YAML a task is written `{ script: build }`, `{ run: "pnpm exec x" }` or
//! as a bare string, which is a raw command. A hook takes one task or a list.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::manifest::Scripts;
use crate::package_manager::PackageManager;
use crate::session::Session;

pub type TaskCallback = Arc<dyn Fn(&mut Session, &Scripts) -> Result<()> + Send + Sync>;

#[derive(Clone, Deserialize)]
#[serde(from = "TaskRepr")]
pub enum Task {
    Raw(String),
    Script(String),
    Callback(TaskCallback),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskRepr {
    Bare(String),
    Script {
        script: String,
    },
    Run {
        run: String,
    },
}

impl From<TaskRepr> for Task {
    fn from(repr: TaskRepr) -> Self {
        match repr {
            TaskRepr::Bare(cmd) | TaskRepr::Run { run: cmd } => Task::Raw(cmd),
            TaskRepr::Script { script } => Task::Script(script),
        }
    }
}

impl Task {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut Session, &Scripts) -> Result<()> + Send + Sync + 'static,
    {
        Task::Callback(Arc::new(f))
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Raw(cmd) => f.debug_tuple("Raw").field(cmd).finish(),
            Task::Script(name) => f.debug_tuple("Script").field(name).finish(),
            Task::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Zero or more tasks attached to one hook.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "TasksRepr")]
pub struct Tasks(Vec<Task>);

#[derive(Deserialize)]
#[serde(untagged)]
enum TasksRepr {
    None(()),
    One(Task),
    Many(Vec<Task>),
}

impl From<TasksRepr> for Tasks {
    fn from(repr: TasksRepr) -> Self {
        match repr {
            TasksRepr::None(()) => Tasks(Vec::new()),
            TasksRepr::One(task) => Tasks(vec![task]),
            TasksRepr::Many(tasks) => Tasks(tasks),
        }
    }
}

impl From<Vec<Task>> for Tasks {
    fn from(tasks: Vec<Task>) -> Self {
        Tasks(tasks)
    }
}

impl From<Task> for Tasks {
    fn from(task: Task) -> Self {
        Tasks(vec![task])
    }
}

impl Tasks {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|task| match task {
            Task::Raw(cmd) | Task::Script(cmd) => cmd.trim().is_empty(),
            Task::Callback(_) => false,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.0.iter()
    }
}

/// The lifecycle hooks of a suite or build.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Hooks {
    pub before_install: Tasks,
    pub before_build: Tasks,
    pub build: Tasks,
    pub before_test: Tasks,
    pub test: Tasks,
}

/// What a task needs from the repository it runs in.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub scripts: Scripts,
    pub package_manager: PackageManager,
}

/// Runs `tasks` in order in the session's current directory.
///
/// Blank commands are skipped. A script task whose name the manifest does not
/// declare is an error.
pub fn run_tasks(session: &mut Session, tasks: &Tasks, ctx: &TaskContext) -> Result<()> {
    for task in tasks.iter() {
        match task {
            Task::Raw(cmd) => {
                session.exec(cmd)?;
            }
            Task::Script(line) => {
                let mut words = line.split_whitespace();
                let Some(name) = words.next() else {
                    continue;
                };
                if !ctx.scripts.contains(name) {
                    return Err(Error::UnknownScript {
                        script: name.to_string(),
                        dir: session.cwd().to_path_buf(),
                    });
                }
                let args: Vec<&str> = words.collect();
                session.run(&ctx.package_manager.run_script(name, &args))?;
            }
            Task::Callback(callback) => (**callback)(session, &ctx.scripts)?,
        }
    }
    Ok(())
}
