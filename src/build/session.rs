// src/build/session.rs

use std::path::PathBuf;

use anyhow::anyhow;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::build::task_runner::TaskRunner;
use crate::build::{
    BuildAction, BuildRequestContext, BuildResult, BuildSession, BuildSessionFactory,
    TaskDescriptor, TaskExecutionListener,
};
use crate::config::{config_root_dir, load_and_validate, ConfigFile};
use crate::dag::DagGraph;
use crate::errors::{BuildwatchError, Result};
use crate::types::TaskOutcome;

/// Build engine over a validated config: runs task commands in dependency
/// order, stopping at the first failure.
#[derive(Debug)]
pub struct TaskGraphSession {
    config: ConfigFile,
    root: PathBuf,
    graph: DagGraph,
    runner: TaskRunner,
    stopped: bool,
}

impl TaskGraphSession {
    pub fn new(config: ConfigFile, root: impl Into<PathBuf>, runner: TaskRunner) -> Self {
        let graph = DagGraph::from_config(&config);
        Self {
            config,
            root: root.into(),
            graph,
            runner,
            stopped: false,
        }
    }

    fn descriptor(&self, name: &str) -> Result<TaskDescriptor> {
        let task = self
            .config
            .tasks()
            .get(name)
            .ok_or_else(|| BuildwatchError::TaskNotFound(name.to_string()))?;

        Ok(TaskDescriptor {
            name: name.to_string(),
            cmd: task.cmd.clone(),
            work_dir: self.root.clone(),
            inputs: task.input_collection(&self.root),
        })
    }
}

impl BuildSession for TaskGraphSession {
    fn run(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        listeners: &[&dyn TaskExecutionListener],
    ) -> Result<BuildResult> {
        if self.stopped {
            return Err(anyhow!("build session has been stopped").into());
        }

        let order = self.graph.execution_order(action.requested_tasks())?;
        debug!(?order, "task execution order");

        let mut tasks_run = Vec::new();
        let mut failure: Option<(String, i32)> = None;

        for name in order {
            let task = self.descriptor(&name)?;

            if failure.is_some() || ctx.cancellation_token().is_cancellation_requested() {
                debug!(task = %name, "skipping task");
                for listener in listeners {
                    listener.after_execute(&task, TaskOutcome::Skipped);
                }
                continue;
            }

            for listener in listeners {
                listener.before_execute(&task);
            }

            let outcome = match self.runner.run(&task) {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(task = %name, error = %err, "task execution error");
                    TaskOutcome::Failed(-1)
                }
            };

            for listener in listeners {
                listener.after_execute(&task, outcome);
            }
            if let TaskOutcome::Failed(code) = outcome {
                failure = Some((name.clone(), code));
            }
            tasks_run.push(name);
        }

        let elapsed = ctx.build_time_clock().elapsed();
        if let Some((task, code)) = failure {
            warn!(%task, code, ?elapsed, "build failed");
            return Err(BuildwatchError::BuildFailed { task, code });
        }

        info!(tasks = tasks_run.len(), ?elapsed, "build successful");
        Ok(BuildResult { tasks_run, elapsed })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            debug!(root = ?self.root, "build session stopped");
        }
    }
}

/// Creates sessions by (re)loading the config file, so a fresh session
/// picks up config edits.
#[derive(Debug, Clone)]
pub struct ConfigSessionFactory {
    config_path: PathBuf,
    runtime: Handle,
}

impl ConfigSessionFactory {
    pub fn new(config_path: impl Into<PathBuf>, runtime: Handle) -> Self {
        Self {
            config_path: config_path.into(),
            runtime,
        }
    }
}

impl BuildSessionFactory for ConfigSessionFactory {
    fn new_session(&self) -> Result<Box<dyn BuildSession>> {
        let config = load_and_validate(&self.config_path)?;
        let root = config_root_dir(&self.config_path);
        debug!(config = ?self.config_path, ?root, "new build session");
        Ok(Box::new(TaskGraphSession::new(
            config,
            root,
            TaskRunner::new(self.runtime.clone()),
        )))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::config::RawConfigFile;
    use crate::watch::WatcherPool;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<(String, TaskOutcome)>>);

    impl TaskExecutionListener for Recording {
        fn after_execute(&self, task: &TaskDescriptor, outcome: TaskOutcome) {
            self.0.lock().unwrap().push((task.name.clone(), outcome));
        }
    }

    fn session(pool: &WatcherPool, toml_src: &str) -> TaskGraphSession {
        let raw: RawConfigFile = toml::from_str(toml_src).unwrap();
        let config = ConfigFile::try_from(raw).unwrap();
        TaskGraphSession::new(config, std::env::temp_dir(), TaskRunner::new(pool.handle().unwrap()))
    }

    #[test]
    fn runs_in_order_and_reports_to_listeners() {
        let pool = WatcherPool::new("session-test").unwrap();
        let mut session = session(
            &pool,
            r#"
[task.a]
cmd = "true"
[task.b]
cmd = "true"
after = ["a"]
"#,
        );

        let listener = Recording::default();
        let ctx = BuildRequestContext::new(CancellationToken::new());
        let result = session.run(&BuildAction::all(), &ctx, &[&listener]).unwrap();

        assert_eq!(result.tasks_run, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            *listener.0.lock().unwrap(),
            vec![
                ("a".to_string(), TaskOutcome::Success),
                ("b".to_string(), TaskOutcome::Success)
            ]
        );
    }

    #[test]
    fn failure_skips_the_rest() {
        let pool = WatcherPool::new("session-test").unwrap();
        let mut session = session(
            &pool,
            r#"
[task.a]
cmd = "exit 2"
[task.b]
cmd = "true"
after = ["a"]
"#,
        );

        let listener = Recording::default();
        let ctx = BuildRequestContext::new(CancellationToken::new());
        let err = session.run(&BuildAction::all(), &ctx, &[&listener]).unwrap_err();

        assert!(matches!(err, BuildwatchError::BuildFailed { ref task, code: 2 } if task == "a"));
        assert_eq!(
            *listener.0.lock().unwrap(),
            vec![
                ("a".to_string(), TaskOutcome::Failed(2)),
                ("b".to_string(), TaskOutcome::Skipped)
            ]
        );
    }

    #[test]
    fn stopped_session_refuses_to_run() {
        let pool = WatcherPool::new("session-test").unwrap();
        let mut session = session(&pool, "[task.a]\ncmd = \"true\"\n");
        session.stop();

        let ctx = BuildRequestContext::new(CancellationToken::new());
        assert!(session.run(&BuildAction::all(), &ctx, &[]).is_err());
    }
}
