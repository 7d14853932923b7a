// src/dag/mod.rs

//! Task graph model and the per-run scheduling state machine.
//!
//! - [`task`] defines tasks, payloads and resource requests.
//! - [`condition`] holds the file-modification staleness predicate.
//! - [`graph`] registers tasks and validates them into an acyclic [`DagGraph`].
//! - [`scheduler`] tracks per-task state for a single run.
//! - [`state_manager`] implements readiness and failure propagation.
//! - [`task_info`] provides the state enum and the dispatch type.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod condition;
pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;
pub mod task_info;

pub use condition::{Condition, MissingInput};
pub use graph::{DagGraph, TaskGraph};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task::{ProcessSpec, ResourceRequest, Task, TaskFunction, TaskKind, TaskPayload};
pub use task_info::{ScheduledTask, TaskState};
