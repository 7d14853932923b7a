// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::engine::TaskName;

/// Structured result of a single scheduler "step".
///
/// Useful for tests that want to manually step the DAG and make assertions
/// about what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks that became `Ready` as a result of this step.
    pub newly_ready: Vec<TaskName>,
    /// Tasks newly marked `Failed` in this step.
    pub newly_failed: Vec<TaskName>,
    /// Tasks newly marked `Blocked` in this step.
    pub newly_blocked: Vec<TaskName>,
    /// Whether this step left every task in a terminal state.
    pub run_just_finished: bool,
}
