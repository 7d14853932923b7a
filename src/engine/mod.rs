// src/engine/mod.rs

//! Orchestration engine for jobdag.
//!
//! This module ties together:
//! - the DAG scheduler
//! - staleness classification of ready tasks
//! - the resource pool and the launch queue gating concurrent execution
//! - the runtime event loop that reacts to task completions
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::collections::BTreeMap;

use crate::dag::TaskState;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Exit code, or -1 when the task could not be run or had no code.
    Failed(i32),
}

/// Runtime options used by the core.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    pub failure_mode: crate::types::FailureMode,
}

/// Events flowing into the runtime from executors and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task finished with a concrete outcome.
    TaskCompleted { task: TaskName, outcome: TaskOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Result of one scheduler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// `true` iff every task ended Completed or Skipped.
    pub success: bool,
    pub states: BTreeMap<TaskName, TaskState>,
    /// Number of tasks handed to the executor.
    pub launched: usize,
}

impl RunResult {
    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.states.get(task).copied()
    }

    pub fn count(&self, state: TaskState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod resources;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::LaunchQueue;
pub use resources::{PoolLimits, ResourcePool};
pub use runtime::Runtime;
