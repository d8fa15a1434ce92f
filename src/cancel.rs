// src/cancel.rs

//! Cooperative cancellation.
//!
//! A single token is created by the composition root and cloned into every
//! component that blocks. Nothing is ever preempted: each blocking wait polls
//! [`CancellationToken::is_cancellation_requested`] on its own interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide cancellation flag. Set once, never cleared.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    requested: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
