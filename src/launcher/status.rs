// src/launcher/status.rs

use tracing::debug;

/// Sink for lifecycle status lines ("Waiting for a trigger...").
///
/// These lines are part of the operator-facing behaviour of the loops, so
/// they go through a seam that tests can observe rather than only through
/// the log.
pub trait StatusReporter: Send + Sync {
    fn lifecycle(&self, message: &str);
}

/// Prints lifecycle lines to stderr, keeping stdout for build output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleStatusReporter;

impl StatusReporter for ConsoleStatusReporter {
    fn lifecycle(&self, message: &str) {
        debug!(target: "buildwatch::lifecycle", "{message}");
        eprintln!("{message}");
    }
}
