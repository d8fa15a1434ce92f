// src/watch/inputs.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::files::{CompiledPatterns, DirectoryTree};
use crate::watch::path_utils::relative_str;

/// Kind of a watch target. Part of the deduplication key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchTargetKind {
    File,
    DirectoryTree,
}

/// One entry of a [`WatchInputSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    File(PathBuf),
    DirectoryTree(DirectoryTree),
}

impl WatchTarget {
    pub fn path(&self) -> &Path {
        match self {
            WatchTarget::File(path) => path,
            WatchTarget::DirectoryTree(tree) => tree.dir(),
        }
    }

    pub fn kind(&self) -> WatchTargetKind {
        match self {
            WatchTarget::File(_) => WatchTargetKind::File,
            WatchTarget::DirectoryTree(_) => WatchTargetKind::DirectoryTree,
        }
    }
}

/// Insertion-ordered set of files and directory subtrees to watch.
///
/// At most one entry exists per `(path, kind)`; the first one added wins.
/// Tree pattern filters are carried along for the watcher to evaluate.
#[derive(Debug, Clone, Default)]
pub struct WatchInputSet {
    targets: Vec<WatchTarget>,
    seen: HashSet<(PathBuf, WatchTargetKind)>,
}

impl WatchInputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single file. Returns `false` if it was already present.
    pub fn watch_file(&mut self, path: impl Into<PathBuf>) -> bool {
        self.insert(WatchTarget::File(path.into()))
    }

    /// Add a directory subtree. Returns `false` if the root was already
    /// present as a tree.
    pub fn watch_tree(&mut self, tree: DirectoryTree) -> bool {
        self.insert(WatchTarget::DirectoryTree(tree))
    }

    fn insert(&mut self, target: WatchTarget) -> bool {
        let key = (target.path().to_path_buf(), target.kind());
        if !self.seen.insert(key) {
            return false;
        }
        self.targets.push(target);
        true
    }

    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Compile tree patterns so paths can be tested against the set.
    pub fn compile(&self) -> Result<WatchInputMatcher> {
        let mut files = HashSet::new();
        let mut trees = Vec::new();

        for target in &self.targets {
            match target {
                WatchTarget::File(path) => {
                    files.insert(path.clone());
                }
                WatchTarget::DirectoryTree(tree) => {
                    let patterns = tree
                        .patterns()
                        .compile()
                        .with_context(|| format!("compiling patterns for {:?}", tree.dir()))?;
                    trees.push((tree.dir().to_path_buf(), patterns));
                }
            }
        }

        Ok(WatchInputMatcher { files, trees })
    }
}

/// Answers "is this changed path part of the watch set?".
#[derive(Clone)]
pub struct WatchInputMatcher {
    files: HashSet<PathBuf>,
    trees: Vec<(PathBuf, CompiledPatterns)>,
}

impl fmt::Debug for WatchInputMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchInputMatcher")
            .field("files", &self.files.len())
            .field("trees", &self.trees.len())
            .finish()
    }
}

impl WatchInputMatcher {
    pub fn matches(&self, path: &Path) -> bool {
        if self.files.contains(path) {
            return true;
        }

        self.trees.iter().any(|(root, patterns)| match relative_str(root, path) {
            // A change to the root itself (e.g. it was created or removed).
            Some(rel) if rel.is_empty() => true,
            Some(rel) => patterns.matches(&rel),
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_dropped_by_path_and_kind() {
        let mut inputs = WatchInputSet::new();
        assert!(inputs.watch_file("/p/a"));
        assert!(!inputs.watch_file("/p/a"));
        // Same path but a different kind is a distinct entry.
        assert!(inputs.watch_tree(DirectoryTree::new("/p/a")));

        let mut excluded = DirectoryTree::new("/p/a");
        excluded.patterns_mut().exclude("x/**");
        assert!(!inputs.watch_tree(excluded));

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.targets()[0].kind(), WatchTargetKind::File);
        assert_eq!(inputs.targets()[1].kind(), WatchTargetKind::DirectoryTree);
    }

    #[test]
    fn matcher_applies_tree_patterns() {
        let mut tree = DirectoryTree::new("/p");
        tree.patterns_mut().exclude("build/**").exclude(".buildwatch/**");

        let mut inputs = WatchInputSet::new();
        inputs.watch_tree(tree);
        inputs.watch_file("/other/config.toml");
        let matcher = inputs.compile().unwrap();

        assert!(matcher.matches(Path::new("/p/src/main.rs")));
        assert!(!matcher.matches(Path::new("/p/build/out.o")));
        assert!(!matcher.matches(Path::new("/p/.buildwatch/state")));
        assert!(matcher.matches(Path::new("/other/config.toml")));
        assert!(!matcher.matches(Path::new("/other/unrelated.toml")));
    }
}
