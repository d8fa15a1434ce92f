// src/files/collection.rs

use std::path::PathBuf;

use anyhow::Result;

use crate::files::tree::DirectoryTree;
use crate::fs::FileSystem;

/// The smallest tree shapes an [`FileCollection::Adapter`] can wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinimalFileTree {
    /// A pattern-filtered directory subtree.
    Directory(DirectoryTree),
    /// A tree containing exactly one file.
    Singleton(PathBuf),
}

impl MinimalFileTree {
    pub fn files(&self, fs: &dyn FileSystem) -> Result<Vec<PathBuf>> {
        match self {
            MinimalFileTree::Directory(tree) => tree.files(fs),
            MinimalFileTree::Singleton(path) => Ok(vec![path.clone()]),
        }
    }
}

/// A task's declared inputs: a recursively composed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCollection {
    /// Union of arbitrary sub-collections.
    Union(Vec<FileCollection>),
    /// A collection view over a single minimal tree.
    Adapter(MinimalFileTree),
    /// A tree that is itself the union of other tree sources.
    Composite(Vec<FileCollection>),
    /// An already resolved list of files.
    Files(Vec<PathBuf>),
    /// The files a filtered tree holds at resolution time. This is a plain
    /// collection, not a tree: files created later are not members.
    Matching(DirectoryTree),
}

impl FileCollection {
    /// A collection with no members.
    pub fn empty() -> Self {
        FileCollection::Union(Vec::new())
    }

    pub fn directory(tree: DirectoryTree) -> Self {
        FileCollection::Adapter(MinimalFileTree::Directory(tree))
    }

    /// Resolve the whole expression to concrete files, in declaration order,
    /// without removing duplicates.
    pub fn files(&self, fs: &dyn FileSystem) -> Result<Vec<PathBuf>> {
        match self {
            FileCollection::Union(children) | FileCollection::Composite(children) => {
                let mut files = Vec::new();
                for child in children {
                    files.extend(child.files(fs)?);
                }
                Ok(files)
            }
            FileCollection::Adapter(tree) => tree.files(fs),
            FileCollection::Files(files) => Ok(files.clone()),
            FileCollection::Matching(tree) => tree.files(fs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn files_resolves_every_shape() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a/one.txt");
        fs.add_file("/p/b/two.txt");
        fs.add_file("/p/e/three.c");
        fs.add_file("/p/e/three.h");

        let mut matching_c = DirectoryTree::new("/p/e");
        matching_c.patterns_mut().include("*.c");

        let collection = FileCollection::Union(vec![
            FileCollection::directory(DirectoryTree::new("/p/a")),
            FileCollection::Composite(vec![FileCollection::directory(DirectoryTree::new(
                "/p/b",
            ))]),
            FileCollection::Adapter(MinimalFileTree::Singleton(PathBuf::from("/p/c"))),
            FileCollection::Files(vec![PathBuf::from("/p/d")]),
            FileCollection::Matching(matching_c),
        ]);

        assert_eq!(
            collection.files(&fs).unwrap(),
            vec![
                PathBuf::from("/p/a/one.txt"),
                PathBuf::from("/p/b/two.txt"),
                PathBuf::from("/p/c"),
                PathBuf::from("/p/d"),
                PathBuf::from("/p/e/three.c"),
            ]
        );
    }

    #[test]
    fn empty_collection_has_no_files() {
        let fs = MockFileSystem::new();
        assert!(FileCollection::empty().files(&fs).unwrap().is_empty());
    }
}
