// src/launcher/continuous.rs

use std::sync::Arc;

use tracing::{debug, info};

use crate::build::{
    BuildAction, BuildActionExecuter, BuildActionParameters, BuildRequestContext, BuildResult,
};
use crate::config::RunawayLimits;
use crate::errors::Result;
use crate::launcher::status::StatusReporter;
use crate::trigger::{
    BlockingTriggerListener, TriggerGenerator, TriggerGeneratorFactory, TriggerListener,
    WaitOutcome,
};

/// Wraps a build executer and, in continuous mode, reruns it on every
/// trigger until cancelled.
///
/// The runaway build count is tracked per instance and never reset.
pub struct ContinuousModeBuildActionExecuter<D> {
    delegate: D,
    generator_factory: Box<dyn TriggerGeneratorFactory>,
    trigger_listener: Arc<BlockingTriggerListener>,
    status: Arc<dyn StatusReporter>,
    maximum_build_count: u32,
    build_count: u32,
}

impl<D: BuildActionExecuter> ContinuousModeBuildActionExecuter<D> {
    pub fn new(
        delegate: D,
        generator_factory: Box<dyn TriggerGeneratorFactory>,
        limits: RunawayLimits,
        status: Arc<dyn StatusReporter>,
    ) -> Self {
        let listener = Arc::new(BlockingTriggerListener::new(limits.timeout_ms));
        Self::with_listener(delegate, generator_factory, listener, limits.maximum_build_count, status)
    }

    /// Like [`ContinuousModeBuildActionExecuter::new`] with an explicit
    /// listener, so callers can fire triggers themselves.
    pub fn with_listener(
        delegate: D,
        generator_factory: Box<dyn TriggerGeneratorFactory>,
        trigger_listener: Arc<BlockingTriggerListener>,
        maximum_build_count: u32,
        status: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            delegate,
            generator_factory,
            trigger_listener,
            status,
            maximum_build_count,
            build_count: 0,
        }
    }

    pub fn build_count(&self) -> u32 {
        self.build_count
    }

    pub fn trigger_listener(&self) -> Arc<BlockingTriggerListener> {
        Arc::clone(&self.trigger_listener)
    }

    fn execute_multiple_builds(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        params: &BuildActionParameters,
    ) -> Result<BuildResult> {
        let mut last_result = None;

        while self.build_not_stopped(ctx) {
            match self.execute_single_build(action, ctx, params) {
                Ok(result) => last_result = Some(result),
                // Already reported by the build layer.
                Err(err) => debug!(error = %err, "build failed; continuing"),
            }

            if self.build_not_stopped(ctx) {
                self.status
                    .lifecycle("Waiting for a trigger. To exit 'continuous mode', use Ctrl+C.");
                match self.trigger_listener.wait_for_trigger(ctx.cancellation_token())? {
                    WaitOutcome::Triggered(details) => {
                        self.status
                            .lifecycle(&format!("Rebuild triggered due to {}", details.reason()));
                        // Report build time from the trigger, not from startup.
                        ctx.build_time_clock().reset();
                    }
                    WaitOutcome::Cancelled => {}
                }
            }
        }

        self.status
            .lifecycle("Build cancelled, exiting 'continuous mode'.");
        Ok(last_result.unwrap_or_default())
    }

    fn execute_single_build(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        params: &BuildActionParameters,
    ) -> Result<BuildResult> {
        self.build_count += 1;
        debug!(build = self.build_count, "starting build");
        self.delegate.execute(action, ctx, params)
    }

    fn build_not_stopped(&self, ctx: &BuildRequestContext) -> bool {
        self.under_runaway_build_count() && !ctx.cancellation_token().is_cancellation_requested()
    }

    fn under_runaway_build_count(&self) -> bool {
        self.maximum_build_count == 0 || self.build_count < self.maximum_build_count
    }
}

impl<D: BuildActionExecuter> BuildActionExecuter for ContinuousModeBuildActionExecuter<D> {
    fn execute(
        &mut self,
        action: &BuildAction,
        ctx: &BuildRequestContext,
        params: &BuildActionParameters,
    ) -> Result<BuildResult> {
        if !params.continuous {
            return self.execute_single_build(action, ctx, params);
        }

        info!(
            maximum_build_count = self.maximum_build_count,
            timeout = ?self.trigger_listener.timeout(),
            "continuous mode enabled"
        );

        let listener: Arc<dyn TriggerListener> = self.trigger_listener.clone();
        let mut generator = StartedGenerator::start(self.generator_factory.new_instance(listener))?;
        let result = self.execute_multiple_builds(action, ctx, params);
        generator.stop();
        result
    }
}

/// Stops the generator on every exit path, including unwinding.
struct StartedGenerator {
    inner: Box<dyn TriggerGenerator>,
    stopped: bool,
}

impl StartedGenerator {
    fn start(mut inner: Box<dyn TriggerGenerator>) -> Result<Self> {
        inner.start()?;
        Ok(Self {
            inner,
            stopped: false,
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.inner.stop();
        }
    }
}

impl Drop for StartedGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}
