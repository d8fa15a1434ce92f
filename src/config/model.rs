// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::files::{DirectoryTree, FileCollection, MinimalFileTree};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [watch]
/// exclude = ["build/**", ".buildwatch/**"]
///
/// [task.compile]
/// cmd = "make"
/// after = ["generate"]
/// inputs = [
///   { dir = "src", include = ["**/*.c"] },
///   { files = ["Makefile"] },
/// ]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Settings for the fixed-root watcher used by continuous mode.
    #[serde(default)]
    pub watch: WatchSection,

    /// All tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { watch, task }
    }

    pub fn watch_section(&self) -> &WatchSection {
        &self.watch
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Patterns, relative to the project root, that never trigger a rebuild
    /// in continuous mode.
    #[serde(default = "default_watch_exclude")]
    pub exclude: Vec<String>,
}

/// Build output and the tool's own metadata directory.
pub fn default_watch_exclude() -> Vec<String> {
    vec!["build/**".to_string(), ".buildwatch/**".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            exclude: default_watch_exclude(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The command to execute.
    pub cmd: String,

    /// Dependency list: this task runs after all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Declared input files. The list itself behaves as a union.
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
}

impl TaskConfig {
    /// Build the task's input expression with paths resolved against `root`.
    pub fn input_collection(&self, root: &Path) -> FileCollection {
        FileCollection::Union(self.inputs.iter().map(|spec| spec.to_collection(root)).collect())
    }
}

/// One entry of a task's `inputs` list.
///
/// Entries nest through `union` and `composite`, so a task can declare an
/// arbitrary expression over directory trees and plain files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    /// `{ dir = "src", include = [...], exclude = [...] }`
    Dir {
        dir: PathBuf,
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    /// `{ files = ["a", "b"] }`
    Files { files: Vec<PathBuf> },
    /// `{ file = "a" }`, a single-file tree.
    File { file: PathBuf },
    /// `{ union = [...] }`
    Union { union: Vec<InputSpec> },
    /// `{ composite = [...] }`, a tree made of other trees.
    Composite { composite: Vec<InputSpec> },
    /// `{ glob = "src/**/*.c" }`, the files under the root matching the
    /// pattern when the task runs.
    Glob { glob: String },
}

impl InputSpec {
    pub fn to_collection(&self, root: &Path) -> FileCollection {
        match self {
            InputSpec::Dir {
                dir,
                include,
                exclude,
            } => {
                let mut tree = DirectoryTree::new(root.join(dir));
                for pattern in include {
                    tree.patterns_mut().include(pattern.clone());
                }
                for pattern in exclude {
                    tree.patterns_mut().exclude(pattern.clone());
                }
                FileCollection::Adapter(MinimalFileTree::Directory(tree))
            }
            InputSpec::Files { files } => {
                FileCollection::Files(files.iter().map(|f| root.join(f)).collect())
            }
            InputSpec::File { file } => {
                FileCollection::Adapter(MinimalFileTree::Singleton(root.join(file)))
            }
            InputSpec::Union { union } => {
                FileCollection::Union(union.iter().map(|s| s.to_collection(root)).collect())
            }
            InputSpec::Composite { composite } => FileCollection::Composite(
                composite.iter().map(|s| s.to_collection(root)).collect(),
            ),
            InputSpec::Glob { glob } => {
                let mut tree = DirectoryTree::new(root);
                tree.patterns_mut().include(glob.clone());
                FileCollection::Matching(tree)
            }
        }
    }

    /// All glob patterns in this entry and its children.
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            InputSpec::Dir {
                include, exclude, ..
            } => include.iter().chain(exclude.iter()).map(String::as_str).collect(),
            InputSpec::Files { .. } | InputSpec::File { .. } => Vec::new(),
            InputSpec::Glob { glob } => vec![glob.as_str()],
            InputSpec::Union { union: children } | InputSpec::Composite { composite: children } => {
                children.iter().flat_map(|c| c.patterns()).collect()
            }
        }
    }
}
