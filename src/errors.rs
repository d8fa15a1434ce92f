// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Opening a watch subscription failed. Fatal for continuous mode.
    #[error("failed to start watching {target}: {source}")]
    WatchSubscription {
        target: String,
        #[source]
        source: notify::Error,
    },

    /// A blocking wait could not complete (poisoned lock, torn-down pool).
    #[error("wait for trigger was interrupted: {0}")]
    InterruptedWait(String),

    #[error("task '{task}' failed with exit code {code}")]
    BuildFailed { task: String, code: i32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildwatchError {
    /// Whether this error is a per-build failure that the control loops
    /// swallow (the build layer has already reported it).
    pub fn is_build_failure(&self) -> bool {
        matches!(self, BuildwatchError::BuildFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, BuildwatchError>;
