// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - The [`WatchInputSet`] describing what to watch.
//! - The [`FileSystemWatcher`] abstraction and its `notify` implementation.
//! - The named [`WatcherPool`] that watch subscriptions forward changes on.
//!
//! It does **not** know about builds; it only turns filesystem changes into
//! callbacks.

pub mod inputs;
pub mod path_utils;
pub mod pool;
pub mod watcher;

pub use inputs::{WatchInputMatcher, WatchInputSet, WatchTarget, WatchTargetKind};
pub use pool::WatcherPool;
pub use watcher::{ChangeCallback, FileChange, FileSystemWatcher, NotifyFileWatcher, WatchHandle};
