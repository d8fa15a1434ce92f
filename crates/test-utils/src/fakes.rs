// crates/test-utils/src/fakes.rs

//! In-memory stand-ins for the watcher, the build engine and the status
//! sink, so the control loops can be driven without touching disk.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use buildwatch::build::{
    BuildAction, BuildActionExecuter, BuildActionParameters, BuildRequestContext, BuildResult,
    BuildSession, BuildSessionFactory, TaskDescriptor, TaskExecutionListener,
};
use buildwatch::errors::{BuildwatchError, Result};
use buildwatch::files::FileCollection;
use buildwatch::launcher::StatusReporter;
use buildwatch::types::TaskOutcome;
use buildwatch::watch::{ChangeCallback, FileChange, FileSystemWatcher, WatchHandle, WatchInputSet};

/// Collects lifecycle lines.
#[derive(Debug, Default)]
pub struct RecordingStatus {
    lines: Mutex<Vec<String>>,
}

impl RecordingStatus {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}

impl StatusReporter for RecordingStatus {
    fn lifecycle(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
struct WatcherState {
    watched: Vec<WatchInputSet>,
    callbacks: Vec<Option<ChangeCallback>>,
    stops: usize,
}

/// Records subscriptions; `fire` delivers a change to every live one.
#[derive(Clone, Default)]
pub struct FakeFileWatcher {
    state: Arc<Mutex<WatcherState>>,
}

impl FakeFileWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch_count(&self) -> usize {
        self.state.lock().unwrap().watched.len()
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn live_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .callbacks
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    /// Input sets passed to `watch`, in call order.
    pub fn watched(&self) -> Vec<WatchInputSet> {
        self.state.lock().unwrap().watched.clone()
    }

    /// Deliver a change to every subscription not yet stopped. Returns the
    /// number of callbacks invoked.
    pub fn fire(&self, path: impl Into<PathBuf>) -> usize {
        let path = path.into();
        let live: Vec<ChangeCallback> = self
            .state
            .lock()
            .unwrap()
            .callbacks
            .iter()
            .flatten()
            .cloned()
            .collect();
        for callback in &live {
            callback(FileChange { path: path.clone() });
        }
        live.len()
    }
}

impl FileSystemWatcher for FakeFileWatcher {
    fn watch(&self, inputs: WatchInputSet, on_change: ChangeCallback) -> Result<Box<dyn WatchHandle>> {
        let mut state = self.state.lock().unwrap();
        state.watched.push(inputs);
        state.callbacks.push(Some(on_change));
        let index = state.callbacks.len() - 1;
        Ok(Box::new(FakeWatchHandle {
            state: Arc::clone(&self.state),
            index,
            stopped: false,
        }))
    }
}

struct FakeWatchHandle {
    state: Arc<Mutex<WatcherState>>,
    index: usize,
    stopped: bool,
}

impl WatchHandle for FakeWatchHandle {
    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        let mut state = self.state.lock().unwrap();
        state.callbacks[self.index] = None;
        state.stops += 1;
    }
}

impl Drop for FakeWatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Hook run at the end of each fake build, with the 1-based build number.
pub type BuildHook = Arc<dyn Fn(u32) + Send + Sync>;

#[derive(Default)]
struct SessionLog {
    sessions_created: usize,
    sessions_stopped: usize,
    builds: u32,
}

/// Hands out [`FakeSession`]s sharing one log.
///
/// Every build reports one task per configured entry to the listeners;
/// builds listed in `failing_builds` return `BuildFailed`.
#[derive(Clone)]
pub struct FakeSessionFactory {
    tasks: Vec<(String, FileCollection)>,
    failing_builds: Vec<u32>,
    hook: Option<BuildHook>,
    log: Arc<Mutex<SessionLog>>,
}

impl FakeSessionFactory {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            failing_builds: Vec::new(),
            hook: None,
            log: Arc::default(),
        }
    }

    pub fn with_task(mut self, name: &str, inputs: FileCollection) -> Self {
        self.tasks.push((name.to_string(), inputs));
        self
    }

    pub fn failing_on(mut self, build: u32) -> Self {
        self.failing_builds.push(build);
        self
    }

    pub fn on_build(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn sessions_created(&self) -> usize {
        self.log.lock().unwrap().sessions_created
    }

    pub fn sessions_stopped(&self) -> usize {
        self.log.lock().unwrap().sessions_stopped
    }

    pub fn builds(&self) -> u32 {
        self.log.lock().unwrap().builds
    }
}

impl Default for FakeSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSessionFactory for FakeSessionFactory {
    fn new_session(&self) -> Result<Box<dyn BuildSession>> {
        self.log.lock().unwrap().sessions_created += 1;
        Ok(Box::new(FakeSession {
            factory: self.clone(),
            stopped: false,
        }))
    }
}

pub struct FakeSession {
    factory: FakeSessionFactory,
    stopped: bool,
}

impl BuildSession for FakeSession {
    fn run(
        &mut self,
        _action: &BuildAction,
        ctx: &BuildRequestContext,
        listeners: &[&dyn TaskExecutionListener],
    ) -> Result<BuildResult> {
        assert!(!self.stopped, "build on a stopped session");

        let build = {
            let mut log = self.factory.log.lock().unwrap();
            log.builds += 1;
            log.builds
        };
        let fails = self.factory.failing_builds.contains(&build);

        let mut tasks_run = Vec::new();
        for (name, inputs) in &self.factory.tasks {
            let task = TaskDescriptor {
                name: name.clone(),
                cmd: "true".to_string(),
                work_dir: PathBuf::from("."),
                inputs: inputs.clone(),
            };
            let outcome = if fails {
                TaskOutcome::Failed(1)
            } else {
                TaskOutcome::Success
            };
            for listener in listeners {
                listener.before_execute(&task);
                listener.after_execute(&task, outcome);
            }
            tasks_run.push(name.clone());
        }

        if let Some(hook) = &self.factory.hook {
            hook(build);
        }

        if fails {
            let task = tasks_run.first().cloned().unwrap_or_default();
            return Err(BuildwatchError::BuildFailed { task, code: 1 });
        }
        Ok(BuildResult {
            tasks_run,
            elapsed: ctx.build_time_clock().elapsed(),
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.factory.log.lock().unwrap().sessions_stopped += 1;
        }
    }
}

/// A build executer whose builds are instantaneous and scripted.
pub struct ScriptedExecuter {
    builds: Arc<Mutex<u32>>,
    failing_builds: Vec<u32>,
    hook: Option<BuildHook>,
}

impl ScriptedExecuter {
    pub fn new() -> Self {
        Self {
            builds: Arc::default(),
            failing_builds: Vec::new(),
            hook: None,
        }
    }

    pub fn failing_on(mut self, build: u32) -> Self {
        self.failing_builds.push(build);
        self
    }

    pub fn on_build(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Shared counter of builds executed so far.
    pub fn counter(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.builds)
    }
}

impl Default for ScriptedExecuter {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildActionExecuter for ScriptedExecuter {
    fn execute(
        &mut self,
        _action: &BuildAction,
        ctx: &BuildRequestContext,
        _params: &BuildActionParameters,
    ) -> Result<BuildResult> {
        let build = {
            let mut builds = self.builds.lock().unwrap();
            *builds += 1;
            *builds
        };
        if let Some(hook) = &self.hook {
            hook(build);
        }
        if self.failing_builds.contains(&build) {
            return Err(BuildwatchError::BuildFailed {
                task: "scripted".to_string(),
                code: 1,
            });
        }
        Ok(BuildResult {
            tasks_run: vec![format!("build-{build}")],
            elapsed: ctx.build_time_clock().elapsed(),
        })
    }
}
