// src/watch/pool.rs

//! Worker pool for filesystem watchers.
//!
//! One pool is created by the composition root and shared by every watch
//! subscription for the life of the process. Threads are named
//! `<prefix>-thread-<n>`; blocking work grows the pool on demand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

use crate::errors::Result;

/// How long `shutdown` waits for in-flight forwarding tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

pub struct WatcherPool {
    name_prefix: String,
    runtime: Option<Runtime>,
}

impl std::fmt::Debug for WatcherPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherPool")
            .field("name_prefix", &self.name_prefix)
            .field("running", &self.runtime.is_some())
            .finish()
    }
}

impl WatcherPool {
    pub fn new(name_prefix: impl Into<String>) -> Result<Self> {
        let name_prefix = name_prefix.into();
        let thread_prefix = name_prefix.clone();
        let counter = AtomicUsize::new(1);

        let runtime = Builder::new_multi_thread()
            .thread_name_fn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                format!("{thread_prefix}-thread-{n}")
            })
            .enable_all()
            .build()
            .with_context(|| format!("creating worker pool '{name_prefix}'"))?;

        debug!(pool = %name_prefix, "worker pool started");

        Ok(Self {
            name_prefix,
            runtime: Some(runtime),
        })
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    /// Handle for spawning onto the pool. Fails once the pool is shut down.
    pub fn handle(&self) -> Result<Handle> {
        self.runtime
            .as_ref()
            .map(|rt| rt.handle().clone())
            .ok_or_else(|| anyhow!("worker pool '{}' has been shut down", self.name_prefix).into())
    }

    pub fn is_shut_down(&self) -> bool {
        self.runtime.is_none()
    }

    /// Release all pooled threads. Only the first call has an effect.
    pub fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            info!(pool = %self.name_prefix, "worker pool shut down");
        }
    }
}

impl Drop for WatcherPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
