// src/launcher/in_process.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::build::{
    BuildAction, BuildActionExecuter, BuildActionParameters, BuildRequestContext, BuildResult,
    BuildSessionFactory,
};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::launcher::status::StatusReporter;
use crate::launcher::watch_mode::{WatchModeBuildController, LATCH_POLL_INTERVAL};
use crate::watch::FileSystemWatcher;

/// Runs a build request in this process.
///
/// Watch-mode requests get a [`WatchModeBuildController`] that lives for
/// the whole request; anything else is one build on a fresh session.
pub struct InProcessBuildActionExecuter {
    session_factory: Arc<dyn BuildSessionFactory>,
    watcher: Arc<dyn FileSystemWatcher>,
    fs: Arc<dyn FileSystem>,
    status: Arc<dyn StatusReporter>,
    poll_interval: Duration,
}

impl InProcessBuildActionExecuter {
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
        }
    }

    /// Poll interval handed to the watch-mode controller.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl BuildActionExecuter for InProcessBuildActionExecuter {
    fn execute(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        params: &BuildActionParameters,
    ) -> Result<BuildResult> {
        if params.watch_mode {
            debug!("running build in watch mode");
            let mut controller = WatchModeBuildController::new(
                Arc::clone(&self.session_factory),
                Arc::clone(&self.watcher),
                Arc::clone(&self.fs),
                Arc::clone(&self.status),
            )
            .with_poll_interval(self.poll_interval);
            return controller.run(action, ctx);
        }

        let mut session = self.session_factory.new_session()?;
        let result = session.run(action, ctx, &[]);
        session.stop();
        result
    }
}
