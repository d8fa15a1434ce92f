// src/launcher/collector.rs

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::build::{TaskDescriptor, TaskExecutionListener};
use crate::files::{FileCollection, MinimalFileTree};
use crate::fs::FileSystem;
use crate::types::TaskOutcome;
use crate::watch::WatchInputSet;

/// Flatten a file-collection expression into `inputs`.
///
/// - Unions and composites are flattened member by member.
/// - An adapter over a directory tree is recorded as a tree, patterns and
///   all, without enumerating it.
/// - Everything else, including a `Matching` collection, is resolved to its
///   files through `fs`, each recorded on its own.
pub fn collect_inputs(
    collection: &FileCollection,
    inputs: &mut WatchInputSet,
    fs: &dyn FileSystem,
) -> Result<()> {
    match collection {
        FileCollection::Union(members) | FileCollection::Composite(members) => {
            for member in members {
                collect_inputs(member, inputs, fs)?;
            }
        }
        FileCollection::Adapter(MinimalFileTree::Directory(tree)) => {
            inputs.watch_tree(tree.clone());
        }
        other => {
            for file in other.files(fs).context("resolving task input files")? {
                inputs.watch_file(file);
            }
        }
    }
    Ok(())
}

/// Records the declared inputs of every task that executes.
#[derive(Debug)]
pub struct TaskInputCollector {
    fs: Arc<dyn FileSystem>,
    inputs: Mutex<WatchInputSet>,
}

impl TaskInputCollector {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            inputs: Mutex::new(WatchInputSet::new()),
        }
    }

    /// Add one collection directly. Used by `after_execute`.
    pub fn add_file_collection(&self, collection: &FileCollection) -> Result<()> {
        let mut inputs = self.inputs.lock().unwrap_or_else(PoisonError::into_inner);
        collect_inputs(collection, &mut inputs, self.fs.as_ref())
    }

    pub fn into_inputs(self) -> WatchInputSet {
        self.inputs.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskExecutionListener for TaskInputCollector {
    fn after_execute(&self, task: &TaskDescriptor, outcome: TaskOutcome) {
        if outcome == TaskOutcome::Skipped {
            return;
        }
        match self.add_file_collection(&task.inputs) {
            Ok(()) => debug!(task = %task.name, "recorded task inputs"),
            Err(err) => warn!(task = %task.name, error = %err, "could not record task inputs"),
        }
    }
}
