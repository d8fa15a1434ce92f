// src/config/mod.rs

//! Configuration loading and validation for buildwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like task-graph correctness (`validate.rs`).
//! - Read the runaway-safety switches from the environment (`runaway.rs`).

pub mod loader;
pub mod model;
pub mod runaway;
pub mod validate;

pub use loader::{config_root_dir, default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, InputSpec, RawConfigFile, TaskConfig, WatchSection};
pub use runaway::RunawayLimits;
