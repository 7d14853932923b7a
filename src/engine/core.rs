// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from channels, handing launched tasks to the executor and handling
//! Ctrl+C. Because the core handles one event at a time, it is the single
//! owner of the resource pool.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dag::{Scheduler, TaskState};
use crate::engine::event_handlers::{
    classify_ready, handle_task_completion, launch_admitted, CoreCommand, CoreStep,
};
use crate::engine::queue::LaunchQueue;
use crate::engine::resources::{PoolLimits, ResourcePool};
use crate::engine::{RunResult, RuntimeEvent, RuntimeOptions, TaskName, TaskOutcome};
use crate::errors::{JobdagError, Result};
use crate::fs::FileSystem;
use crate::types::FailureMode;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and only touches the filesystem
/// to evaluate task conditions.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    pool: ResourcePool,
    queue: LaunchQueue,
    fs: Arc<dyn FileSystem>,
    options: RuntimeOptions,
    aborted: bool,
    launched: usize,
}

impl CoreRuntime {
    /// Build a core for one run.
    ///
    /// Fails with a configuration error when a task requests more than the
    /// pool could ever provide, since such a task would wait forever.
    pub fn new(
        scheduler: Scheduler,
        limits: PoolLimits,
        options: RuntimeOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let pool = ResourcePool::new(limits);

        for name in scheduler.task_names() {
            if let Some(task) = scheduler.task(name) {
                if !pool.fits(&task.request) {
                    return Err(JobdagError::ConfigError(format!(
                        "task '{}' requests {} slot(s) and {:?} GiB, exceeding the pool limits ({} slot(s), {:?} GiB)",
                        name,
                        task.request.slots,
                        task.request.memory_gib,
                        limits.max_slots,
                        limits.max_memory_gib,
                    )));
                }
            }
        }

        Ok(Self {
            scheduler,
            pool,
            queue: LaunchQueue::new(),
            fs,
            options,
            aborted: false,
            launched: 0,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Classify the graph roots and launch whatever fits.
    pub fn start(&mut self) -> CoreStep {
        info!(
            tasks = self.scheduler.graph().len(),
            max_slots = self.pool.limits().max_slots,
            failure_mode = ?self.options.failure_mode,
            "starting run"
        );
        let ready = self.scheduler.promote_ready();
        self.advance(ready)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                let step =
                    handle_task_completion(&mut self.scheduler, &mut self.pool, &task, outcome);
                if matches!(outcome, TaskOutcome::Failed(_)) {
                    self.apply_failure_policy(&task);
                }
                self.advance(step.newly_ready)
            }
            RuntimeEvent::ShutdownRequested => {
                warn!("shutdown requested; no further tasks will be launched");
                self.queue.clear();
                self.scheduler.block_unlaunched();
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }

    /// Snapshot of the run.
    pub fn result(&self) -> RunResult {
        let states = self.scheduler.states();
        let success = states.values().all(|s| s.is_satisfied());
        RunResult {
            success,
            states,
            launched: self.launched,
        }
    }

    fn advance(&mut self, ready: Vec<TaskName>) -> CoreStep {
        let failed = classify_ready(&mut self.scheduler, &mut self.queue, self.fs.as_ref(), ready);
        for task in &failed {
            self.apply_failure_policy(task);
        }

        let mut commands = Vec::new();
        if !self.aborted {
            let tasks = launch_admitted(&mut self.scheduler, &mut self.queue, &mut self.pool);
            self.launched += tasks.len();
            if !tasks.is_empty() {
                commands.push(CoreCommand::LaunchTasks(tasks));
            }
        }

        let keep_running = !self.scheduler.is_finished();
        if !keep_running {
            let result = self.result();
            info!(
                success = result.success,
                completed = result.count(TaskState::Completed),
                skipped = result.count(TaskState::Skipped),
                failed = result.count(TaskState::Failed),
                blocked = result.count(TaskState::Blocked),
                "run finished"
            );
            commands.push(CoreCommand::RequestExit);
        }

        CoreStep {
            commands,
            keep_running,
        }
    }

    fn apply_failure_policy(&mut self, task: &str) {
        match self.options.failure_mode {
            FailureMode::Passive => {}
            FailureMode::Abort => {
                if !self.aborted {
                    warn!(task = %task, "aborting run after first failure");
                }
                self.aborted = true;
                self.queue.clear();
                self.scheduler.block_unlaunched();
            }
        }
    }
}
