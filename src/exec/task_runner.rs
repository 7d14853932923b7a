// src/exec/task_runner.rs

//! Individual task runners.

use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{ProcessSpec, TaskFunction};
use crate::engine::{RuntimeEvent, TaskName, TaskOutcome};
use crate::fs::FileSystem;

/// Settings shared by every process the executor runs.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Delete declared transient files after a successful run.
    pub cleanup_files: bool,
    pub fs: Arc<dyn FileSystem>,
}

/// Run a single process task and emit exactly one `TaskCompleted` event.
///
/// Errors that prevent the process from running at all (log file cannot be
/// created, spawn failure) are reported as `Failed(-1)`.
pub async fn run_process(
    task: TaskName,
    spec: ProcessSpec,
    options: ProcessOptions,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
) {
    let outcome = match run_process_inner(&task, &spec).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(task = %task, error = %format!("{err:#}"), "task execution error");
            TaskOutcome::Failed(-1)
        }
    };

    if outcome == TaskOutcome::Success && options.cleanup_files {
        cleanup_transient(&task, &spec.transient, options.fs.as_ref());
    }

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.clone(),
            outcome,
        })
        .is_err()
    {
        warn!(task = %task, "runtime gone before TaskCompleted could be delivered");
    }
}

async fn run_process_inner(task: &str, spec: &ProcessSpec) -> Result<TaskOutcome> {
    info!(task = %task, cmd = %spec.command, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&spec.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&spec.command);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(redirect(spec.stdout.as_deref())?)
        .stderr(redirect(spec.stderr.as_deref())?)
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{task}'"))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{task}'"))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task,
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

fn redirect(path: Option<&Path>) -> Result<Stdio> {
    let Some(path) = path else {
        return Ok(Stdio::null());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {:?}", parent))?;
        }
    }
    let file = File::create(path).with_context(|| format!("creating log file {:?}", path))?;
    Ok(Stdio::from(file))
}

fn cleanup_transient(task: &str, transient: &[std::path::PathBuf], fs: &dyn FileSystem) {
    for path in transient {
        if !fs.exists(path) {
            continue;
        }
        match fs.remove_file(path) {
            Ok(()) => debug!(task = %task, path = %path.display(), "removed transient file"),
            Err(e) => warn!(task = %task, path = %path.display(), error = %e, "failed to remove transient file"),
        }
    }
}

/// Invoke an in-process task function and map its result to an outcome.
pub fn run_function(task: &str, func: &Arc<dyn TaskFunction>) -> TaskOutcome {
    info!(task = %task, "invoking function task");
    match func.call() {
        Ok(()) => TaskOutcome::Success,
        Err(err) => {
            error!(task = %task, error = %format!("{err:#}"), "function task failed");
            TaskOutcome::Failed(-1)
        }
    }
}
