// src/types.rs

use std::fmt;

/// Canonical task name type used throughout the build engine.
pub type TaskName = String;

/// Outcome of a single task for the build engine and its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
    /// Not executed because an earlier task failed or the build was cancelled.
    Skipped,
}

/// Why a rebuild was triggered.
///
/// Produced by whichever signal fires (a watcher callback or the runaway
/// timeout) and consumed exactly once by the waiting loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDetails {
    reason: String,
}

impl TriggerDetails {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for TriggerDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}
