// src/launcher/watch_mode.rs

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{debug, info};

use crate::build::{
    BuildAction, BuildRequestContext, BuildResult, BuildSession, BuildSessionFactory,
};
use crate::cancel::CancellationToken;
use crate::errors::{BuildwatchError, Result};
use crate::fs::FileSystem;
use crate::launcher::collector::TaskInputCollector;
use crate::launcher::status::StatusReporter;
use crate::watch::{ChangeCallback, FileSystemWatcher};

/// How often the single-change wait re-checks cancellation.
pub const LATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// One-shot latch opened by the first change of a watch cycle.
#[derive(Debug, Default)]
pub struct ChangeLatch {
    open: Mutex<bool>,
    signal: Condvar,
}

impl ChangeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_down(&self) {
        let mut open = match self.open.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *open = true;
        self.signal.notify_all();
    }

    /// Wait until the latch opens (`Ok(true)`) or cancellation is observed
    /// (`Ok(false)`), checking the token every `poll`.
    pub fn wait(&self, cancel: &CancellationToken, poll: Duration) -> Result<bool> {
        let mut open = self.open.lock().map_err(|_| interrupted())?;
        loop {
            if *open {
                return Ok(true);
            }
            if cancel.is_cancellation_requested() {
                return Ok(false);
            }
            let (guard, _) = self
                .signal
                .wait_timeout(open, poll)
                .map_err(|_| interrupted())?;
            open = guard;
        }
    }
}

fn interrupted() -> BuildwatchError {
    BuildwatchError::InterruptedWait("change latch lock poisoned".to_string())
}

/// Embedded watch loop: build, watch exactly the inputs the build declared,
/// rebuild on the first change.
///
/// The build session is created lazily and reused across iterations. It is
/// only torn down when the controller is dropped or
/// [`WatchModeBuildController::stop_session`] is called.
pub struct WatchModeBuildController {
    session_factory: Arc<dyn BuildSessionFactory>,
    watcher: Arc<dyn FileSystemWatcher>,
    fs: Arc<dyn FileSystem>,
    status: Arc<dyn StatusReporter>,
    poll_interval: Duration,
    session: Option<Box<dyn BuildSession>>,
}

impl WatchModeBuildController {
    pub fn new(
        session_factory: Arc<dyn BuildSessionFactory>,
        watcher: Arc<dyn FileSystemWatcher>,
        fs: Arc<dyn FileSystem>,
        status: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            session_factory,
            watcher,
            fs,
            status,
            poll_interval: LATCH_POLL_INTERVAL,
            session: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn session(&mut self) -> Result<&mut Box<dyn BuildSession>> {
        if self.session.is_none() {
            debug!("creating build session");
            self.session = Some(self.session_factory.new_session()?);
        }
        self.session
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("build session unavailable").into())
    }

    pub fn stop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
    }

    /// Run until cancelled; returns the last successful build's result.
    pub fn run(&mut self, action: &BuildAction, ctx: &BuildRequestContext) -> Result<BuildResult> {
        let cancel = ctx.cancellation_token();
        let mut last_result = BuildResult::default();

        while !cancel.is_cancellation_requested() {
            let collector = TaskInputCollector::new(Arc::clone(&self.fs));
            match self.session()?.run(action, ctx, &[&collector]) {
                Ok(result) => last_result = result,
                Err(err) if err.is_build_failure() => {
                    debug!(error = %err, "build failed; watching inputs of tasks that ran");
                }
                Err(err) => return Err(err),
            }

            let inputs = collector.into_inputs();
            info!(targets = inputs.len(), "derived watch inputs");

            let latch = Arc::new(ChangeLatch::new());
            let on_change: ChangeCallback = {
                let latch = Arc::clone(&latch);
                Arc::new(move |change| {
                    debug!(path = ?change.path, "input changed");
                    latch.count_down();
                })
            };

            let mut handle = self.watcher.watch(inputs, on_change)?;
            self.status.lifecycle("Waiting for changes to input files of tasks...");
            let waited = latch.wait(cancel, self.poll_interval);
            handle.stop();

            if waited? {
                self.status.lifecycle("Change detected, executing build...");
                ctx.build_time_clock().reset();
            }
        }

        self.status.lifecycle("Build cancelled, exiting watch mode.");
        Ok(last_result)
    }
}

impl Drop for WatchModeBuildController {
    fn drop(&mut self) {
        self.stop_session();
    }
}
