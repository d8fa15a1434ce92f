// src/trigger/listener.rs

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cancel::CancellationToken;
use crate::errors::{BuildwatchError, Result};
use crate::trigger::TriggerListener;
use crate::types::TriggerDetails;

/// How often a waiter re-checks the timeout and the cancellation token.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of [`BlockingTriggerListener::wait_for_trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Triggered(TriggerDetails),
    Cancelled,
}

/// Hands an asynchronous trigger to a synchronous waiter.
///
/// This is a single-slot mailbox: `triggered` overwrites the slot and wakes
/// the waiter, `wait_for_trigger` takes whatever is there. Triggers that
/// arrive while nobody waits collapse into the latest one.
#[derive(Debug)]
pub struct BlockingTriggerListener {
    slot: Mutex<Option<TriggerDetails>>,
    signal: Condvar,
    timeout: Option<Duration>,
}

impl BlockingTriggerListener {
    /// `timeout_ms == 0` disables the runaway timeout.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            slot: Mutex::new(None),
            signal: Condvar::new(),
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Block until a trigger arrives, the runaway timeout expires, or
    /// cancellation is requested.
    ///
    /// On timeout a synthetic trigger reading `giving up after <n> ms` is
    /// returned. Cancellation is observed within [`POLL_INTERVAL`].
    pub fn wait_for_trigger(&self, cancel: &CancellationToken) -> Result<WaitOutcome> {
        let started = Instant::now();
        let mut slot = self.lock()?;

        loop {
            if let Some(details) = slot.take() {
                debug!(reason = %details, "trigger received");
                return Ok(WaitOutcome::Triggered(details));
            }
            if cancel.is_cancellation_requested() {
                debug!("cancelled while waiting for a trigger");
                return Ok(WaitOutcome::Cancelled);
            }

            let (guard, _timed_out) = self
                .signal
                .wait_timeout(slot, POLL_INTERVAL)
                .map_err(|_| interrupted())?;
            slot = guard;

            if slot.is_none() {
                if let Some(timeout) = self.timeout {
                    let waited = started.elapsed();
                    if waited > timeout {
                        *slot = Some(TriggerDetails::new(format!(
                            "giving up after {} ms",
                            waited.as_millis()
                        )));
                    }
                }
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<TriggerDetails>>> {
        self.slot.lock().map_err(|_| interrupted())
    }
}

impl TriggerListener for BlockingTriggerListener {
    fn triggered(&self, details: TriggerDetails) {
        trace!(reason = %details, "trigger stored");
        // A poisoned slot still takes the write; the waiter reports the poison.
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(details);
        self.signal.notify_one();
    }
}

#[cfg(test)]
impl BlockingTriggerListener {
    /// Poison the slot by panicking while holding it.
    pub(crate) fn poison_slot(&self) {
        std::thread::scope(|scope| {
            let holder = scope.spawn(|| {
                let _guard = self.slot.lock();
                panic!("panicking while holding the trigger slot");
            });
            assert!(holder.join().is_err());
        });
    }
}

fn interrupted() -> BuildwatchError {
    BuildwatchError::InterruptedWait("trigger listener lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn pending_trigger_is_returned_immediately() {
        let listener = BlockingTriggerListener::new(0);
        listener.triggered(TriggerDetails::new("file change"));

        let outcome = listener.wait_for_trigger(&CancellationToken::new()).unwrap();
        assert_eq!(outcome, WaitOutcome::Triggered(TriggerDetails::new("file change")));
    }

    #[test]
    fn last_write_wins() {
        let listener = BlockingTriggerListener::new(0);
        listener.triggered(TriggerDetails::new("first"));
        listener.triggered(TriggerDetails::new("second"));

        let token = CancellationToken::new();
        assert_eq!(
            listener.wait_for_trigger(&token).unwrap(),
            WaitOutcome::Triggered(TriggerDetails::new("second"))
        );

        // The slot was consumed: the next wait only ends on cancellation.
        token.cancel();
        assert_eq!(listener.wait_for_trigger(&token).unwrap(), WaitOutcome::Cancelled);
    }

    #[test]
    fn wakes_on_trigger_from_another_thread() {
        let listener = Arc::new(BlockingTriggerListener::new(0));
        let remote = Arc::clone(&listener);

        let firer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(120));
            remote.triggered(TriggerDetails::new("file change"));
        });

        let outcome = listener.wait_for_trigger(&CancellationToken::new()).unwrap();
        firer.join().unwrap();
        assert_eq!(outcome, WaitOutcome::Triggered(TriggerDetails::new("file change")));
    }

    #[test]
    fn gives_up_after_timeout() {
        let listener = BlockingTriggerListener::new(200);
        let started = Instant::now();

        let outcome = listener.wait_for_trigger(&CancellationToken::new()).unwrap();
        let elapsed = started.elapsed();

        match outcome {
            WaitOutcome::Triggered(details) => {
                assert!(details.reason().starts_with("giving up after"), "{details}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(elapsed >= Duration::from_millis(200));
        // Poll granularity plus scheduling slack.
        assert!(elapsed < Duration::from_millis(200) + POLL_INTERVAL + Duration::from_millis(200));
    }

    #[test]
    fn cancellation_ends_an_unbounded_wait() {
        let listener = BlockingTriggerListener::new(0);
        let token = CancellationToken::new();
        let remote = token.clone();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.cancel();
        });

        let started = Instant::now();
        let outcome = listener.wait_for_trigger(&token).unwrap();
        canceller.join().unwrap();

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_millis(100) + POLL_INTERVAL + Duration::from_millis(200));
    }

    #[test]
    fn poisoned_slot_interrupts_the_wait() {
        let listener = BlockingTriggerListener::new(0);
        listener.poison_slot();

        let err = listener.wait_for_trigger(&CancellationToken::new()).unwrap_err();
        assert!(matches!(err, BuildwatchError::InterruptedWait(_)), "{err}");

        // Writers are not affected by the poison.
        listener.triggered(TriggerDetails::new("file change"));
    }
}
