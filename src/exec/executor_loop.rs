// src/exec/executor_loop.rs

//! Background loop that owns running task processes.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ProcessSpec;
use crate::engine::{RuntimeEvent, TaskName};
use crate::exec::task_runner::{run_process, ProcessOptions};

/// A process the core has admitted and wants started.
#[derive(Debug, Clone)]
pub struct ProcessJob {
    pub name: TaskName,
    pub spec: ProcessSpec,
}

/// Spawn the background executor loop.
///
/// Each received job runs in its own Tokio task; for remote execution the
/// process is the blocking submission client, so the job is equally an
/// independent unit here. The scheduler launches a task name at most once
/// per run, and every job reports exactly one `TaskCompleted`.
pub fn spawn_executor(
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
    options: ProcessOptions,
) -> mpsc::Sender<ProcessJob> {
    let (tx, mut rx) = mpsc::channel::<ProcessJob>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut launched = 0usize;
        while let Some(job) = rx.recv().await {
            let rt_tx = runtime_tx.clone();
            let opts = options.clone();
            launched += 1;
            tokio::spawn(async move {
                let task_name = job.name.clone();
                run_process(job.name, job.spec, opts, rt_tx).await;
                debug!(task = %task_name, "task runner future finished");
            });
        }

        info!(launched, "executor loop finished (channel closed)");
    });

    tx
}
