// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::dag::task_info::TaskState;
use crate::dag::DagGraph;
use crate::engine::TaskName;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    states: &'a mut HashMap<TaskName, TaskState>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a DagGraph, states: &'a mut HashMap<TaskName, TaskState>) -> Self {
        Self { graph, states }
    }

    /// Move every `Pending` task whose dependencies are all satisfied to
    /// `Ready`, returning them in topological order.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<TaskName> {
        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<TaskName> = {
            let ro = ReadOnlyStateManager::new(self.graph, self.states);
            self.graph
                .tasks()
                .filter(|name| {
                    matches!(self.states.get(*name), Some(TaskState::Pending))
                        && ro.deps_satisfied(name)
                })
                .map(str::to_string)
                .collect()
        };

        for name in &candidates {
            debug!(task = %name, "dependencies satisfied; marking Ready");
            self.states.insert(name.clone(), TaskState::Ready);
        }

        candidates
    }

    /// Mark every transitive dependent of a failed task that has not started
    /// yet as `Blocked`.
    ///
    /// Returns the newly blocked tasks (excluding the failed task itself).
    pub fn mark_dependents_blocked(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_blocked = Vec::new();

        while let Some(name) = stack.pop() {
            match self.states.get(&name).copied() {
                Some(TaskState::Pending) | Some(TaskState::Ready) => {
                    self.states.insert(name.clone(), TaskState::Blocked);
                    debug!(
                        task = %name,
                        upstream = %failed_task,
                        "marking dependent as Blocked due to upstream failure"
                    );
                    stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    newly_blocked.push(name);
                }
                Some(TaskState::Running) => {
                    // Cannot happen: a dependent only runs once all of its
                    // dependencies are satisfied.
                    warn!(task = %name, upstream = %failed_task, "dependent already running");
                }
                Some(_) | None => {
                    // Already terminal.
                }
            }
        }

        newly_blocked
    }

    /// Mark every task that has not been launched yet as `Blocked`.
    pub fn block_unlaunched(&mut self) -> Vec<TaskName> {
        let mut blocked = Vec::new();
        for name in self.graph.tasks() {
            if let Some(state) = self.states.get_mut(name) {
                if matches!(state, TaskState::Pending | TaskState::Ready) {
                    *state = TaskState::Blocked;
                    blocked.push(name.to_string());
                }
            }
        }
        blocked
    }
}

/// A read-only view for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    graph: &'a DagGraph,
    states: &'a HashMap<TaskName, TaskState>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(graph: &'a DagGraph, states: &'a HashMap<TaskName, TaskState>) -> Self {
        Self { graph, states }
    }

    /// Whether every dependency of `task` is `Completed` or `Skipped`.
    pub fn deps_satisfied(&self, task: &str) -> bool {
        self.graph.dependencies_of(task).iter().all(|dep| {
            match self.states.get(dep) {
                Some(state) => state.is_satisfied(),
                None => {
                    warn!(task = %task, dep = %dep, "dependency missing from state map");
                    false
                }
            }
        })
    }
}
