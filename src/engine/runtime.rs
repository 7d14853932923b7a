// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RunResult, RuntimeEvent};

/// Drives the core runtime in response to `RuntimeEvent`s and delegates
/// actual task execution to an `ExecutorBackend`.
///
/// The control loop only blocks while waiting for at least one outstanding
/// task to report completion.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Seeds the run from the graph roots.
    /// - Feeds completion events into the core runtime.
    /// - Executes commands returned by the core (launch tasks, exit).
    pub async fn run(mut self) -> Result<RunResult> {
        info!("jobdag runtime started");

        let mut step = self.core.start();

        loop {
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                break;
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    warn!("runtime event channel closed before the run finished");
                    break;
                }
            };

            debug!(?event, "runtime received event");
            step = self.core.step(event);
        }

        info!("runtime exiting");
        Ok(self.core.result())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::LaunchTasks(tasks) => {
                self.launch(tasks).await?;
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn launch(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "launching ready tasks");

        self.executor.launch_tasks(tasks).await
    }
}
