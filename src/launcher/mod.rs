// src/launcher/mod.rs

//! Build control loops.
//!
//! - [`continuous`]: repeat the build on any change under the project root.
//! - [`watch_mode`]: repeat the build on changes to the inputs the previous
//!   build declared, harvested by [`collector`].
//! - [`in_process`]: pick between a single build and watch mode.
//! - [`status`]: operator-facing lifecycle lines.

pub mod collector;
pub mod continuous;
pub mod in_process;
pub mod status;
pub mod watch_mode;

pub use collector::{collect_inputs, TaskInputCollector};
pub use continuous::ContinuousModeBuildActionExecuter;
pub use in_process::InProcessBuildActionExecuter;
pub use status::{ConsoleStatusReporter, StatusReporter};
pub use watch_mode::{ChangeLatch, WatchModeBuildController, LATCH_POLL_INTERVAL};
