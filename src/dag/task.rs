// src/dag/task.rs

//! Task definitions: what to run, what it needs, and when it is stale.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::dag::condition::Condition;
use crate::engine::TaskName;

/// Resources a task holds while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRequest {
    /// Parallel-execution slots (roughly one core each). Always >= 1.
    pub slots: u32,
    /// Memory in GiB, or `None` when memory is not tracked for this task.
    pub memory_gib: Option<u64>,
}

impl ResourceRequest {
    pub fn new(slots: u32, memory_gib: Option<u64>) -> Self {
        Self {
            slots: slots.max(1),
            memory_gib,
        }
    }
}

impl Default for ResourceRequest {
    fn default() -> Self {
        Self::new(1, None)
    }
}

/// In-process work executed by a [`TaskKind::Function`] task.
///
/// Implementors hold their own immutable context; `call` must not rely on
/// state shared with other tasks.
pub trait TaskFunction: Send + Sync + fmt::Debug {
    fn call(&self) -> anyhow::Result<()>;
}

/// An external command line plus where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub command: String,
    /// File receiving stdout; `None` discards it.
    pub stdout: Option<PathBuf>,
    /// File receiving stderr; `None` discards it.
    pub stderr: Option<PathBuf>,
    /// Scratch files deleted after a successful run when cleanup is enabled.
    pub transient: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum TaskPayload {
    Process(ProcessSpec),
    Function(Arc<dyn TaskFunction>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Process,
    Function,
}

/// A schedulable unit of work.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    pub payload: TaskPayload,
    pub request: ResourceRequest,
    /// Wall-clock budget in hours, when the backend knows one.
    pub wall_hours: Option<u32>,
    pub conditions: Vec<Condition>,
    /// Names of tasks that must be Completed or Skipped first.
    pub deps: Vec<TaskName>,
}

impl Task {
    pub fn process(name: impl Into<TaskName>, spec: ProcessSpec, request: ResourceRequest) -> Self {
        Self {
            name: name.into(),
            payload: TaskPayload::Process(spec),
            request,
            wall_hours: None,
            conditions: Vec::new(),
            deps: Vec::new(),
        }
    }

    pub fn function(
        name: impl Into<TaskName>,
        func: Arc<dyn TaskFunction>,
        request: ResourceRequest,
    ) -> Self {
        Self {
            name: name.into(),
            payload: TaskPayload::Function(func),
            request,
            wall_hours: None,
            conditions: Vec::new(),
            deps: Vec::new(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self.payload {
            TaskPayload::Process(_) => TaskKind::Process,
            TaskPayload::Function(_) => TaskKind::Function,
        }
    }

    /// The command line for process tasks.
    pub fn command(&self) -> Option<&str> {
        match &self.payload {
            TaskPayload::Process(spec) => Some(spec.command.as_str()),
            TaskPayload::Function(_) => None,
        }
    }

    pub fn add_condition(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn add_dependency(&mut self, dep: impl Into<TaskName>) -> &mut Self {
        let dep = dep.into();
        if !self.deps.contains(&dep) {
            self.deps.push(dep);
        }
        self
    }

    pub fn add_transient(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        if let TaskPayload::Process(spec) = &mut self.payload {
            spec.transient.push(path.into());
        }
        self
    }
}
