// src/watch/watcher.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{BuildwatchError, Result};
use crate::watch::inputs::{WatchInputMatcher, WatchInputSet, WatchTarget};

/// A change reported for a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
}

/// Callback invoked on a background thread for every matching change.
pub type ChangeCallback = Arc<dyn Fn(FileChange) + Send + Sync>;

/// A live watch subscription.
///
/// `stop` is idempotent; once it returns, the change callback is neither
/// running nor invoked again.
pub trait WatchHandle: Send {
    fn stop(&mut self);
}

/// Opens watch subscriptions.
///
/// Implementations invoke `on_change` asynchronously on another thread, zero
/// or more times. Delivery can begin as soon as the subscription is
/// registered, which may be before `watch` has handed back its handle, so
/// everything the callback touches must exist before `watch` is called.
pub trait FileSystemWatcher: Send + Sync {
    fn watch(&self, inputs: WatchInputSet, on_change: ChangeCallback) -> Result<Box<dyn WatchHandle>>;
}

/// [`FileSystemWatcher`] backed by `notify`, forwarding on a worker pool.
#[derive(Debug, Clone)]
pub struct NotifyFileWatcher {
    runtime: Handle,
}

impl NotifyFileWatcher {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl FileSystemWatcher for NotifyFileWatcher {
    fn watch(&self, inputs: WatchInputSet, on_change: ChangeCallback) -> Result<Box<dyn WatchHandle>> {
        let inputs = absolutize(&inputs);
        let matcher = inputs.compile()?;

        // Channel from the blocking notify callback into the pool.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // The receiver is gone once the handle is stopped.
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    eprintln!("buildwatch: file watch error: {err}");
                }
            },
            Config::default(),
        )
        .map_err(|source| BuildwatchError::WatchSubscription {
            target: "<watcher>".to_string(),
            source,
        })?;

        let registrations = registrations_for(&inputs);
        for (path, mode) in registrations.iter() {
            watcher
                .watch(path, *mode)
                .map_err(|source| BuildwatchError::WatchSubscription {
                    target: path.display().to_string(),
                    source,
                })?;
        }

        info!(
            targets = inputs.len(),
            registrations = registrations.len(),
            "file watcher started"
        );

        let active = Arc::new(Mutex::new(true));
        let task = self.runtime.spawn(forward_changes(
            event_rx,
            matcher,
            Arc::clone(&active),
            on_change,
        ));

        Ok(Box::new(NotifyWatchHandle {
            watcher: Some(watcher),
            active,
            task: Some(task),
        }))
    }
}

async fn forward_changes(
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    matcher: WatchInputMatcher,
    active: Arc<Mutex<bool>>,
    on_change: ChangeCallback,
) {
    while let Some(event) = event_rx.recv().await {
        debug!(?event, "received notify event");

        for path in event.paths {
            if !matcher.matches(&path) {
                continue;
            }

            // Held across the callback so `stop` cannot return mid-delivery.
            let guard = active.lock().unwrap_or_else(PoisonError::into_inner);
            if !*guard {
                return;
            }
            on_change(FileChange { path });
        }
    }
    debug!("watcher event loop finished");
}

struct NotifyWatchHandle {
    watcher: Option<RecommendedWatcher>,
    active: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle for NotifyWatchHandle {
    fn stop(&mut self) {
        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if !*active {
                return;
            }
            *active = false;
        }

        // Dropping the notify watcher closes the event channel.
        self.watcher.take();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!("file watcher stopped");
    }
}

impl Drop for NotifyWatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Resolve every target against the working directory and canonicalize
/// where the path exists, so they line up with the paths notify reports.
fn absolutize(inputs: &WatchInputSet) -> WatchInputSet {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let normalize = |p: &Path| {
        let abs = if p.is_absolute() { p.to_path_buf() } else { cwd.join(p) };
        abs.canonicalize().unwrap_or(abs)
    };

    let mut out = WatchInputSet::new();
    for target in inputs.targets() {
        match target {
            WatchTarget::File(path) => {
                out.watch_file(normalize(path));
            }
            WatchTarget::DirectoryTree(tree) => {
                out.watch_tree(crate::files::DirectoryTree::with_patterns(
                    normalize(tree.dir()),
                    tree.patterns().clone(),
                ));
            }
        }
    }
    out
}

/// Work out which OS-level registrations cover the set.
///
/// - Trees are watched recursively at their root.
/// - Files are watched through their parent directory, so replacing or
///   re-creating the file is still seen.
/// - Targets that do not exist fall back to their nearest existing parent.
fn registrations_for(inputs: &WatchInputSet) -> BTreeMap<PathBuf, RecursiveMode> {
    let mut registrations: BTreeMap<PathBuf, RecursiveMode> = BTreeMap::new();

    let mut add = |path: PathBuf, mode: RecursiveMode| {
        let entry = registrations.entry(path).or_insert(mode);
        if mode == RecursiveMode::Recursive {
            *entry = RecursiveMode::Recursive;
        }
    };

    for target in inputs.targets() {
        match target {
            WatchTarget::DirectoryTree(tree) if tree.dir().is_dir() => {
                add(tree.dir().to_path_buf(), RecursiveMode::Recursive);
            }
            other => match existing_parent(other.path()) {
                Some(parent) => add(parent, RecursiveMode::NonRecursive),
                None => warn!(path = ?other.path(), "no existing directory to watch"),
            },
        }
    }

    registrations
}

fn existing_parent(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .find(|p| !p.as_os_str().is_empty() && p.is_dir())
        .map(Path::to_path_buf)
}
