// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`executor_loop`].
//!
//! - `RealExecutorBackend` forwards process tasks to the background executor
//!   loop and invokes function tasks in place, inside the runtime's own
//!   control flow.
//! - Tests can provide their own `ExecutorBackend` that records which tasks
//!   were launched and directly emits `TaskCompleted` events.
//!
//! [`executor_loop`]: super::executor_loop

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::{ScheduledTask, TaskPayload};
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

use super::executor_loop::{spawn_executor, ProcessJob};
use super::task_runner::{run_function, ProcessOptions};

/// Trait abstracting how launched tasks are executed.
///
/// Every launched task must eventually produce exactly one
/// `RuntimeEvent::TaskCompleted` on the runtime channel.
pub trait ExecutorBackend: Send {
    fn launch_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ProcessJob>,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend, wiring it to the given runtime
    /// event sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>, options: ProcessOptions) -> Self {
        let tx = spawn_executor(runtime_tx.clone(), options);
        Self { tx, runtime_tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn launch_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the senders so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();
        let runtime_tx = self.runtime_tx.clone();

        Box::pin(async move {
            for task in tasks {
                match task.payload {
                    TaskPayload::Process(spec) => {
                        tx.send(ProcessJob {
                            name: task.name,
                            spec,
                        })
                        .await
                        .map_err(Error::from)?;
                    }
                    TaskPayload::Function(func) => {
                        let outcome = run_function(&task.name, &func);
                        runtime_tx
                            .send(RuntimeEvent::TaskCompleted {
                                task: task.name,
                                outcome,
                            })
                            .map_err(Error::from)?;
                    }
                }
            }
            Ok(())
        })
    }
}
