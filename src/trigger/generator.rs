// src/trigger/generator.rs

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::Result;
use crate::files::DirectoryTree;
use crate::trigger::TriggerListener;
use crate::types::TriggerDetails;
use crate::watch::{ChangeCallback, FileSystemWatcher, WatchHandle, WatchInputSet};

/// Produces triggers for a listener between `start` and `stop`.
pub trait TriggerGenerator: Send {
    /// Begin producing triggers. Failure to subscribe is fatal.
    fn start(&mut self) -> Result<()>;

    /// Stop producing triggers. Idempotent.
    fn stop(&mut self);
}

/// Creates a generator bound to a listener.
pub trait TriggerGeneratorFactory: Send {
    fn new_instance(&self, listener: Arc<dyn TriggerListener>) -> Box<dyn TriggerGenerator>;
}

/// Watches a fixed project root and triggers on every change under it.
///
/// No debouncing happens here; every notification becomes a trigger and
/// the listener collapses them.
pub struct FileWatchTriggerGenerator {
    listener: Arc<dyn TriggerListener>,
    watcher: Arc<dyn FileSystemWatcher>,
    root: PathBuf,
    excludes: Vec<String>,
    handle: Option<Box<dyn WatchHandle>>,
}

impl std::fmt::Debug for FileWatchTriggerGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatchTriggerGenerator")
            .field("root", &self.root)
            .field("excludes", &self.excludes)
            .field("started", &self.handle.is_some())
            .finish()
    }
}

impl FileWatchTriggerGenerator {
    pub fn new(
        listener: Arc<dyn TriggerListener>,
        watcher: Arc<dyn FileSystemWatcher>,
        root: impl Into<PathBuf>,
        excludes: Vec<String>,
    ) -> Self {
        Self {
            listener,
            watcher,
            root: root.into(),
            excludes,
            handle: None,
        }
    }

    /// The set this generator subscribes to: the root minus the excludes.
    pub fn watch_inputs(&self) -> WatchInputSet {
        let mut tree = DirectoryTree::new(self.root.clone());
        for pattern in &self.excludes {
            tree.patterns_mut().exclude(pattern.clone());
        }

        let mut inputs = WatchInputSet::new();
        inputs.watch_tree(tree);
        inputs
    }
}

impl TriggerGenerator for FileWatchTriggerGenerator {
    fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            debug!("trigger generator already started");
            return Ok(());
        }

        let listener = Arc::clone(&self.listener);
        let on_change: ChangeCallback = Arc::new(move |change| {
            debug!(path = ?change.path, "change detected");
            listener.triggered(TriggerDetails::new("file change"));
        });

        let handle = self.watcher.watch(self.watch_inputs(), on_change)?;
        self.handle = Some(handle);
        info!(root = ?self.root, excludes = ?self.excludes, "watching for changes");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
            debug!(root = ?self.root, "trigger generator stopped");
        }
    }
}

impl Drop for FileWatchTriggerGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Factory for [`FileWatchTriggerGenerator`]s sharing one watcher.
pub struct FileWatchTriggerGeneratorFactory {
    watcher: Arc<dyn FileSystemWatcher>,
    root: PathBuf,
    excludes: Vec<String>,
}

impl FileWatchTriggerGeneratorFactory {
    pub fn new(watcher: Arc<dyn FileSystemWatcher>, root: impl Into<PathBuf>, excludes: Vec<String>) -> Self {
        Self {
            watcher,
            root: root.into(),
            excludes,
        }
    }
}

impl TriggerGeneratorFactory for FileWatchTriggerGeneratorFactory {
    fn new_instance(&self, listener: Arc<dyn TriggerListener>) -> Box<dyn TriggerGenerator> {
        Box::new(FileWatchTriggerGenerator::new(
            listener,
            Arc::clone(&self.watcher),
            self.root.clone(),
            self.excludes.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BuildwatchError;
    use crate::watch::{FileChange, WatchTarget};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded {
        subscriptions: Vec<WatchInputSet>,
        callbacks: Vec<ChangeCallback>,
        stops: usize,
    }

    #[derive(Default, Clone)]
    struct RecordingWatcher {
        state: Arc<Mutex<Recorded>>,
        fail: bool,
    }

    struct RecordingHandle(Arc<Mutex<Recorded>>);

    impl WatchHandle for RecordingHandle {
        fn stop(&mut self) {
            self.0.lock().unwrap().stops += 1;
        }
    }

    impl FileSystemWatcher for RecordingWatcher {
        fn watch(&self, inputs: WatchInputSet, on_change: ChangeCallback) -> Result<Box<dyn WatchHandle>> {
            if self.fail {
                return Err(BuildwatchError::IoError(std::io::Error::other("no inotify")));
            }
            let mut state = self.state.lock().unwrap();
            state.subscriptions.push(inputs);
            state.callbacks.push(on_change);
            Ok(Box::new(RecordingHandle(Arc::clone(&self.state))))
        }
    }

    #[derive(Default)]
    struct Collecting(Mutex<Vec<TriggerDetails>>);

    impl TriggerListener for Collecting {
        fn triggered(&self, details: TriggerDetails) {
            self.0.lock().unwrap().push(details);
        }
    }

    #[test]
    fn forwards_every_change_and_stops_once() {
        let watcher = RecordingWatcher::default();
        let listener = Arc::new(Collecting::default());
        let factory = FileWatchTriggerGeneratorFactory::new(
            Arc::new(watcher.clone()),
            "/proj",
            vec!["build/**".to_string(), ".buildwatch/**".to_string()],
        );

        let mut generator = factory.new_instance(listener.clone());
        generator.start().unwrap();

        let callback = {
            let state = watcher.state.lock().unwrap();
            match &state.subscriptions[0].targets()[0] {
                WatchTarget::DirectoryTree(tree) => {
                    assert_eq!(tree.dir(), std::path::Path::new("/proj"));
                    assert_eq!(tree.patterns().excludes().len(), 2);
                }
                other => panic!("unexpected {other:?}"),
            }
            Arc::clone(&state.callbacks[0])
        };

        for name in ["a", "b", "c"] {
            callback(FileChange {
                path: PathBuf::from("/proj").join(name),
            });
        }
        assert_eq!(listener.0.lock().unwrap().len(), 3);
        assert!(listener.0.lock().unwrap().iter().all(|d| d.reason() == "file change"));

        generator.stop();
        generator.stop();
        drop(generator);
        assert_eq!(watcher.state.lock().unwrap().stops, 1);
    }

    #[test]
    fn subscription_failure_surfaces_from_start() {
        let watcher = RecordingWatcher {
            fail: true,
            ..Default::default()
        };
        let mut generator = FileWatchTriggerGenerator::new(
            Arc::new(Collecting::default()),
            Arc::new(watcher),
            "/proj",
            vec![],
        );

        assert!(generator.start().is_err());
    }
}
