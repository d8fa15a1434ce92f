// src/build/mod.rs

//! Build-execution collaborator.
//!
//! The control loops only need to run "a build" and to observe each task as
//! it executes. This module defines those seams:
//! - [`BuildActionExecuter`]: run one build request.
//! - [`BuildSession`] / [`BuildSessionFactory`]: a reusable build engine
//!   instance, plus [`TaskExecutionListener`] hooks around every task.
//! - [`session::TaskGraphSession`]: the real engine, running configured
//!   shell commands in dependency order.

pub mod session;
pub mod task_runner;

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;
use crate::errors::Result;
use crate::files::FileCollection;
use crate::types::{TaskName, TaskOutcome};

pub use session::{ConfigSessionFactory, TaskGraphSession};

/// What to build: the requested tasks, or every task when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildAction {
    tasks: Vec<TaskName>,
}

impl BuildAction {
    pub fn new(tasks: Vec<TaskName>) -> Self {
        Self { tasks }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn requested_tasks(&self) -> &[TaskName] {
        &self.tasks
    }
}

/// Per-invocation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildActionParameters {
    /// Rebuild on any change under the project root.
    pub continuous: bool,
    /// Rebuild on changes to the inputs the last build actually declared.
    pub watch_mode: bool,
}

/// Wall clock the build duration is reported against.
#[derive(Debug)]
pub struct BuildTimeClock {
    started: Mutex<Instant>,
}

impl Default for BuildTimeClock {
    fn default() -> Self {
        Self {
            started: Mutex::new(Instant::now()),
        }
    }
}

impl BuildTimeClock {
    pub fn reset(&self) {
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

/// Request-scoped state shared by the loops and the build engine.
#[derive(Debug, Default)]
pub struct BuildRequestContext {
    cancellation: CancellationToken,
    clock: BuildTimeClock,
}

impl BuildRequestContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            clock: BuildTimeClock::default(),
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn build_time_clock(&self) -> &BuildTimeClock {
        &self.clock
    }
}

/// Summary of one completed build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildResult {
    /// Tasks that were executed, in execution order.
    pub tasks_run: Vec<TaskName>,
    /// Time since the request's build clock was last reset.
    pub elapsed: Duration,
}

/// Runs one build request.
pub trait BuildActionExecuter {
    fn execute(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        params: &BuildActionParameters,
    ) -> Result<BuildResult>;
}

impl<T: BuildActionExecuter + ?Sized> BuildActionExecuter for Box<T> {
    fn execute(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        params: &BuildActionParameters,
    ) -> Result<BuildResult> {
        (**self).execute(action, ctx, params)
    }
}

/// A task as seen by listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub name: TaskName,
    pub cmd: String,
    /// Directory the command runs in.
    pub work_dir: PathBuf,
    /// Declared input files.
    pub inputs: FileCollection,
}

/// Hooks around task execution.
pub trait TaskExecutionListener {
    fn before_execute(&self, _task: &TaskDescriptor) {}

    /// Called after a task ran (successfully or not). Tasks that were
    /// skipped are reported with [`TaskOutcome::Skipped`].
    fn after_execute(&self, task: &TaskDescriptor, outcome: TaskOutcome);
}

/// A build engine instance that can run many builds.
pub trait BuildSession: Send {
    fn run(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        listeners: &[&dyn TaskExecutionListener],
    ) -> Result<BuildResult>;

    /// Release the session. Idempotent.
    fn stop(&mut self);
}

pub trait BuildSessionFactory: Send + Sync {
    fn new_session(&self) -> Result<Box<dyn BuildSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restarts_the_clock() {
        let clock = BuildTimeClock::default();
        std::thread::sleep(Duration::from_millis(30));
        assert!(clock.elapsed() >= Duration::from_millis(30));

        clock.reset();
        assert!(clock.elapsed() < Duration::from_millis(30));
    }
}
