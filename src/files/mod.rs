// src/files/mod.rs

//! Task input file collections.
//!
//! A task declares its inputs as a [`FileCollection`], a nested expression
//! over directory trees and plain file lists. The watch-mode controller
//! flattens these expressions into a watch set without enumerating trees.

pub mod collection;
pub mod tree;

pub use collection::{FileCollection, MinimalFileTree};
pub use tree::{CompiledPatterns, DirectoryTree, PatternSet};
