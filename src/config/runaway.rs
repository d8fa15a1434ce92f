// src/config/runaway.rs

//! Runaway-build safety switches.
//!
//! These exist for the tool's own test harness, not for end users. Both are
//! read once, when the continuous-mode executer is constructed, and both
//! default to `0`, meaning "disabled".

use crate::errors::{BuildwatchError, Result};

/// Maximum number of builds before continuous mode gives up.
pub const RUNAWAY_COUNT_ENV: &str = "BUILDWATCH_RUNAWAY_COUNT";

/// Milliseconds to wait for a trigger before manufacturing one.
pub const RUNAWAY_TIMEOUT_ENV: &str = "BUILDWATCH_RUNAWAY_TIMEOUT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunawayLimits {
    /// Zero means unbounded.
    pub maximum_build_count: u32,
    /// Zero means wait forever.
    pub timeout_ms: u64,
}

impl RunawayLimits {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RunawayLimits::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            maximum_build_count: parse_switch(&lookup, RUNAWAY_COUNT_ENV)?,
            timeout_ms: parse_switch(&lookup, RUNAWAY_TIMEOUT_ENV)?,
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.maximum_build_count == 0 && self.timeout_ms == 0
    }
}

fn parse_switch<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<T>
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(T::default()),
        Some(raw) if raw.trim().is_empty() => Ok(T::default()),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            BuildwatchError::ConfigError(format!("{key} must be a non-negative integer (got {raw:?}): {e}"))
        }),
    }
}
