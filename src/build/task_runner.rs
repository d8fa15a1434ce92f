// src/build/task_runner.rs

//! Individual task process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::build::TaskDescriptor;
use crate::types::TaskOutcome;

/// Runs task commands on the worker pool while the calling (control-loop)
/// thread blocks for the result.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    runtime: Handle,
}

impl TaskRunner {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Run a single task to completion.
    ///
    /// Must not be called from inside the pool's own threads.
    pub fn run(&self, task: &TaskDescriptor) -> Result<TaskOutcome> {
        self.runtime.block_on(run_task(task))
    }
}

async fn run_task(task: &TaskDescriptor) -> Result<TaskOutcome> {
    info!(task = %task.name, cmd = %task.cmd, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&task.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&task.cmd);
        c
    };

    cmd.current_dir(&task.work_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task.name))?;

    // Build output belongs to the operator: pass it through line by line.
    let stdout_pump = child.stdout.take().map(|stdout| {
        let name = task.name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %name, "stdout: {}", line);
                println!("{line}");
            }
        })
    });
    let stderr_pump = child.stderr.take().map(|stderr| {
        let name = task.name.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %name, "stderr: {}", line);
                eprintln!("{line}");
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task.name))?;

    for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
        let _ = pump.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task.name,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    Ok(if status.success() {
        TaskOutcome::Success
    } else {
        TaskOutcome::Failed(code)
    })
}
