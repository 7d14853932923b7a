// src/engine/event_handlers.rs

//! Building blocks the core runtime composes for each event.

use tracing::{debug, error, info};

use crate::dag::condition::{any_stale, MissingInput};
use crate::dag::{ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::queue::LaunchQueue;
use crate::engine::resources::ResourcePool;
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::JobdagError;
use crate::fs::FileSystem;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Hand these tasks to the executor.
    LaunchTasks(Vec<ScheduledTask>),
    /// Every task is terminal; the shell can stop.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    /// Tasks launched by this step, across all commands.
    pub fn launched(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.commands.iter().flat_map(|c| match c {
            CoreCommand::LaunchTasks(tasks) => tasks.as_slice(),
            CoreCommand::RequestExit => &[],
        })
    }
}

/// Classify ready tasks until no more become ready.
///
/// Each ready task is evaluated for staleness now, not at registration, so
/// artifacts produced by its dependencies are taken into account:
/// - fresh tasks are marked Skipped, which may make dependents ready in turn
/// - stale tasks are queued for launch
/// - tasks with a missing input fail without running
///
/// Returns the tasks that failed their preconditions.
pub fn classify_ready(
    scheduler: &mut Scheduler,
    queue: &mut LaunchQueue,
    fs: &dyn FileSystem,
    mut ready: Vec<TaskName>,
) -> Vec<TaskName> {
    let mut failed = Vec::new();

    while !ready.is_empty() {
        for name in ready.drain(..) {
            let Some(task) = scheduler.task(&name) else {
                continue;
            };

            match any_stale(&task.conditions, fs) {
                Ok(true) => {
                    let request = task.request;
                    queue.push(name, request);
                }
                Ok(false) => {
                    info!(task = %name, "outputs up to date; skipping");
                    scheduler.mark_skipped(&name);
                }
                Err(MissingInput(path)) => {
                    let err = JobdagError::Precondition {
                        task: name.clone(),
                        path,
                    };
                    error!(task = %name, error = %err, "failing task before launch");
                    let step = scheduler.fail_before_launch(&name);
                    log_blocked(&name, &step);
                    failed.push(name);
                }
            }
        }
        ready = scheduler.promote_ready();
    }

    failed
}

/// Admit queued tasks into the pool and mark them Running.
pub fn launch_admitted(
    scheduler: &mut Scheduler,
    queue: &mut LaunchQueue,
    pool: &mut ResourcePool,
) -> Vec<ScheduledTask> {
    let mut launched = Vec::new();

    for name in queue.admit(pool) {
        if !scheduler.mark_running(&name) {
            continue;
        }
        if let Some(task) = scheduler.task(&name) {
            info!(
                task = %name,
                kind = ?task.kind(),
                slots = task.request.slots,
                memory_gib = ?task.request.memory_gib,
                "launching task"
            );
            launched.push(ScheduledTask::from_task(task));
        }
    }

    launched
}

/// Record a completion: release the task's reservation and update its state.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    pool: &mut ResourcePool,
    task: &str,
    outcome: TaskOutcome,
) -> SchedulerStep {
    let was_running = scheduler.state_of(task) == Some(crate::dag::TaskState::Running);
    let request = scheduler.task(task).map(|t| t.request);

    let step = scheduler.step_completion(task, outcome);

    if was_running {
        if let Some(request) = request {
            pool.release(&request);
        }
    }

    match outcome {
        TaskOutcome::Success => debug!(task = %task, "task succeeded"),
        TaskOutcome::Failed(code) => {
            error!(task = %task, exit_code = code, "task failed");
            log_blocked(task, &step);
        }
    }

    step
}

fn log_blocked(task: &str, step: &SchedulerStep) {
    if !step.newly_blocked.is_empty() {
        info!(
            task = %task,
            blocked = ?step.newly_blocked,
            "dependents blocked by failure"
        );
    }
}
