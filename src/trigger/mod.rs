// src/trigger/mod.rs

//! Rebuild triggers for continuous mode.
//!
//! - [`listener`] holds the single-slot mailbox the control loop blocks on.
//! - [`generator`] turns a fixed-root watch subscription into triggers.

pub mod generator;
pub mod listener;

pub use crate::types::TriggerDetails;
pub use generator::{
    FileWatchTriggerGenerator, FileWatchTriggerGeneratorFactory, TriggerGenerator,
    TriggerGeneratorFactory,
};
pub use listener::{BlockingTriggerListener, WaitOutcome, POLL_INTERVAL};

/// Receives "something changed" notifications from any thread.
pub trait TriggerListener: Send + Sync {
    /// Must not block and must always succeed.
    fn triggered(&self, details: TriggerDetails);
}
