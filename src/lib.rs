// src/lib.rs

pub mod build;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod files;
pub mod fs;
pub mod launcher;
pub mod logging;
pub mod trigger;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::build::{
    BuildAction, BuildActionExecuter, BuildActionParameters, BuildRequestContext,
    ConfigSessionFactory,
};
use crate::cancel::CancellationToken;
use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile, RunawayLimits};
use crate::dag::DagGraph;
use crate::fs::RealFileSystem;
use crate::launcher::{
    ConsoleStatusReporter, ContinuousModeBuildActionExecuter, InProcessBuildActionExecuter,
};
use crate::trigger::FileWatchTriggerGeneratorFactory;
use crate::watch::{FileSystemWatcher, NotifyFileWatcher, WatcherPool};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the runaway switches
/// - the watcher worker pool (shut down once, on the way out)
/// - Ctrl-C → cancellation token
/// - in-process build executer, wrapped by the continuous-mode loop
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg, &args.tasks)?;
        return Ok(());
    }

    let limits = RunawayLimits::from_env()?;
    if !limits.is_disabled() {
        info!(?limits, "runaway build limits active");
    }

    let mut pool = WatcherPool::new("filewatcher")?;
    let cancel = CancellationToken::new();
    install_ctrl_c_handler(&pool, cancel.clone())?;

    let result = {
        // Continuous mode watches the directory buildwatch was started in.
        let root = std::env::current_dir().context("resolving the working directory")?;
        let watcher: Arc<dyn FileSystemWatcher> = Arc::new(NotifyFileWatcher::new(pool.handle()?));
        let status = Arc::new(ConsoleStatusReporter);

        let in_process = InProcessBuildActionExecuter::new(
            Arc::new(ConfigSessionFactory::new(config_path.clone(), pool.handle()?)),
            Arc::clone(&watcher),
            Arc::new(RealFileSystem),
            status.clone(),
        );
        let generators = FileWatchTriggerGeneratorFactory::new(
            watcher,
            root,
            cfg.watch_section().exclude.clone(),
        );
        let mut executer = ContinuousModeBuildActionExecuter::new(
            in_process,
            Box::new(generators),
            limits,
            status,
        );

        let action = BuildAction::new(args.tasks.clone());
        let ctx = BuildRequestContext::new(cancel);
        let params = BuildActionParameters {
            continuous: args.continuous,
            watch_mode: args.watch,
        };
        executer.execute(&action, &ctx, &params)
    };

    pool.shutdown();

    let outcome = result?;
    debug!(tasks = ?outcome.tasks_run, elapsed = ?outcome.elapsed, "buildwatch finished");
    Ok(())
}

/// Ctrl-C sets the token; the loops notice at their next poll.
fn install_ctrl_c_handler(pool: &WatcherPool, cancel: CancellationToken) -> Result<()> {
    pool.handle()?.spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("cancellation requested");
        cancel.cancel();
    });
    Ok(())
}

/// Simple dry-run output: print the task order, commands and inputs.
fn print_dry_run(cfg: &ConfigFile, requested: &[String]) -> Result<()> {
    let order = DagGraph::from_config(cfg).execution_order(requested)?;

    println!("buildwatch dry-run");
    println!("  watch.exclude = {:?}", cfg.watch_section().exclude);
    println!();

    println!("tasks ({}):", order.len());
    for name in order.iter() {
        let Some(task) = cfg.tasks().get(name) else {
            continue;
        };
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if !task.inputs.is_empty() {
            println!("      inputs: {:?}", task.inputs);
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
