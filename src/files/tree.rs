// src/files/tree.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Include/exclude glob patterns, evaluated against paths relative to a
/// tree root (forward slashes, e.g. `"src/main.rs"`).
///
/// An empty include list means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.includes.push(pattern.into());
        self
    }

    pub fn exclude(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.excludes.push(pattern.into());
        self
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    pub fn compile(&self) -> Result<CompiledPatterns> {
        let include_set = if self.includes.is_empty() {
            None
        } else {
            Some(build_globset(&self.includes).context("building include globset")?)
        };
        let exclude_set = if self.excludes.is_empty() {
            None
        } else {
            let excludes = with_directory_roots(&self.excludes);
            Some(build_globset(&excludes).context("building exclude globset")?)
        };

        Ok(CompiledPatterns {
            include_set,
            exclude_set,
        })
    }
}

/// Compiled form of a [`PatternSet`].
#[derive(Clone)]
pub struct CompiledPatterns {
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for CompiledPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPatterns").finish_non_exhaustive()
    }
}

impl CompiledPatterns {
    pub fn matches(&self, rel_path: &str) -> bool {
        if let Some(include) = &self.include_set {
            if !include.is_match(rel_path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// `dir/**` also excludes `dir` itself, so creating or removing the
/// directory is filtered out together with its contents.
fn with_directory_roots(excludes: &[String]) -> Vec<String> {
    let mut patterns = excludes.to_vec();
    for pattern in excludes {
        if let Some(root) = pattern.strip_suffix("/**") {
            if !root.is_empty() && !patterns.iter().any(|p| p == root) {
                patterns.push(root.to_string());
            }
        }
    }
    patterns
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// A directory subtree filtered by a [`PatternSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTree {
    dir: PathBuf,
    patterns: PatternSet,
}

impl DirectoryTree {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            patterns: PatternSet::new(),
        }
    }

    pub fn with_patterns(dir: impl Into<PathBuf>, patterns: PatternSet) -> Self {
        Self {
            dir: dir.into(),
            patterns,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn patterns_mut(&mut self) -> &mut PatternSet {
        &mut self.patterns
    }

    /// Enumerate every file under the tree that passes the patterns.
    ///
    /// A missing root is an empty tree.
    pub fn files(&self, fs: &dyn FileSystem) -> Result<Vec<PathBuf>> {
        if !fs.is_dir(&self.dir) {
            return Ok(Vec::new());
        }

        let patterns = self
            .patterns
            .compile()
            .with_context(|| format!("compiling patterns for {:?}", self.dir))?;

        let mut files = Vec::new();
        let mut stack = vec![self.dir.clone()];

        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    if let Ok(rel) = path.strip_prefix(&self.dir) {
                        let rel_str = rel.to_string_lossy().replace('\\', "/");
                        if patterns.matches(&rel_str) {
                            files.push(path);
                        }
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }
}
