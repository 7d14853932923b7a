// src/dag/task_info.rs

//! Per-run task state and the dispatch description handed to executors.

use std::fmt;

use crate::dag::task::{ResourceRequest, Task, TaskPayload};
use crate::engine::TaskName;

/// State of a task within a single scheduler run.
///
/// ```text
/// Pending -> Skipped
/// Pending -> Blocked
/// Pending -> Ready -> Running -> Completed | Failed
///            Ready -> Failed   (missing input)
///            Ready -> Blocked  (run aborted)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Waiting on dependencies.
    Pending,
    /// Dependencies satisfied and stale; waiting for resources.
    Ready,
    /// Dispatched to the executor.
    Running,
    /// Ran and succeeded.
    Completed,
    /// Outputs were already current; nothing ran.
    Skipped,
    /// Ran and failed, or a precondition did not hold.
    Failed,
    /// Never ran because a dependency failed (or the run was aborted).
    Blocked,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Skipped | TaskState::Failed | TaskState::Blocked
        )
    }

    /// Completed and Skipped both let dependents proceed.
    pub fn is_satisfied(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Skipped)
    }

    pub fn is_unsuccessful(self) -> bool {
        matches!(self, TaskState::Failed | TaskState::Blocked)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Ready => "ready",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Skipped => "skipped",
            TaskState::Failed => "failed",
            TaskState::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub payload: TaskPayload,
    pub request: ResourceRequest,
}

impl ScheduledTask {
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            payload: task.payload.clone(),
            request: task.request,
        }
    }
}
