// src/dag/mod.rs

//! Task dependency graph.
//!
//! [`graph`] holds the `after = [...]` relations of a validated config and
//! derives the order tasks run in.

pub mod graph;

pub use graph::DagGraph;
