use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task::Task;
use crate::dag::task_info::TaskState;
use crate::engine::{TaskName, TaskOutcome};

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - deciding when a task is "ready" (all deps Completed or Skipped)
/// - recording launches, skips, successes and failures
/// - blocking the transitive dependents of a failed task
///
/// It never looks at the filesystem or at resources; the engine core decides
/// whether a ready task is skipped, launched or held back.
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    states: HashMap<TaskName, TaskState>,
}

impl Scheduler {
    /// Construct a scheduler with every task `Pending`.
    pub fn new(graph: DagGraph) -> Self {
        let states = graph
            .tasks()
            .map(|name| (name.to_string(), TaskState::Pending))
            .collect();
        Self { graph, states }
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.graph.task(name)
    }

    /// Task names in topological order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// Read-only view of the given task's state.
    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.states.get(task).copied()
    }

    /// Snapshot of every task's state, sorted by name.
    pub fn states(&self) -> BTreeMap<TaskName, TaskState> {
        self.states
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    /// Whether the dependencies of `task` are all satisfied.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        if !self.states.contains_key(task) {
            return None;
        }
        let mgr = ReadOnlyStateManager::new(&self.graph, &self.states);
        Some(mgr.deps_satisfied(task))
    }

    /// Returns `true` once nothing is Pending, Ready or Running.
    pub fn is_finished(&self) -> bool {
        self.states.values().all(|s| s.is_terminal())
    }

    /// Promote every Pending task with satisfied dependencies to `Ready`.
    pub fn promote_ready(&mut self) -> Vec<TaskName> {
        StateManager::new(&self.graph, &mut self.states).collect_new_ready_tasks()
    }

    /// Ready -> Skipped.
    pub fn mark_skipped(&mut self, task: &str) -> bool {
        self.transition(task, TaskState::Ready, TaskState::Skipped)
    }

    /// Ready -> Running.
    pub fn mark_running(&mut self, task: &str) -> bool {
        self.transition(task, TaskState::Ready, TaskState::Running)
    }

    /// Ready -> Failed, for tasks whose preconditions do not hold. Their
    /// dependents are blocked.
    pub fn fail_before_launch(&mut self, task: &str) -> SchedulerStep {
        if !self.transition(task, TaskState::Ready, TaskState::Failed) {
            return SchedulerStep::default();
        }
        let newly_blocked = StateManager::new(&self.graph, &mut self.states)
            .mark_dependents_blocked(task);

        SchedulerStep {
            newly_ready: Vec::new(),
            newly_failed: vec![task.to_string()],
            newly_blocked,
            run_just_finished: self.is_finished(),
        }
    }

    /// Block everything that has not been launched yet.
    pub fn block_unlaunched(&mut self) -> Vec<TaskName> {
        let blocked = StateManager::new(&self.graph, &mut self.states).block_unlaunched();
        if !blocked.is_empty() {
            info!(count = blocked.len(), "blocking tasks that were not launched");
        }
        blocked
    }

    /// Handle completion of a running task with a concrete outcome.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        if self.state_of(task) != Some(TaskState::Running) {
            warn!(
                task = %task,
                state = ?self.state_of(task),
                "completion for a task that is not running; ignoring"
            );
            return SchedulerStep::default();
        }

        let mut step = SchedulerStep::default();

        match outcome {
            TaskOutcome::Success => {
                self.states.insert(task.to_string(), TaskState::Completed);
                debug!(task = %task, "task completed successfully");
                step.newly_ready = self.promote_ready();
            }
            TaskOutcome::Failed(code) => {
                self.states.insert(task.to_string(), TaskState::Failed);
                warn!(
                    task = %task,
                    exit_code = code,
                    "task failed; blocking dependents"
                );
                step.newly_failed.push(task.to_string());
                step.newly_blocked = StateManager::new(&self.graph, &mut self.states)
                    .mark_dependents_blocked(task);
            }
        }

        step.run_just_finished = self.is_finished();
        step
    }

    fn transition(&mut self, task: &str, from: TaskState, to: TaskState) -> bool {
        match self.states.get_mut(task) {
            Some(state) if *state == from => {
                *state = to;
                true
            }
            Some(state) => {
                warn!(task = %task, current = %state, wanted = %to, "invalid state transition");
                false
            }
            None => {
                warn!(task = %task, "transition for unknown task; ignoring");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::graph::TaskGraph;
    use crate::dag::task::{ProcessSpec, ResourceRequest};

    fn scheduler(edges: &[(&str, &[&str])]) -> Scheduler {
        let mut g = TaskGraph::new();
        for (name, deps) in edges {
            let mut t = Task::process(
                *name,
                ProcessSpec {
                    command: format!("echo {name}"),
                    stdout: None,
                    stderr: None,
                    transient: Vec::new(),
                },
                ResourceRequest::default(),
            );
            for d in *deps {
                t.add_dependency(*d);
            }
            g.add(t).unwrap();
        }
        Scheduler::new(g.build().unwrap())
    }

    #[test]
    fn chain_runs_in_order() {
        let mut s = scheduler(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]);

        assert_eq!(s.promote_ready(), vec!["A".to_string()]);
        assert!(s.mark_running("A"));
        assert_eq!(s.state_of("B"), Some(TaskState::Pending));

        let step = s.step_completion("A", TaskOutcome::Success);
        assert_eq!(step.newly_ready, vec!["B".to_string()]);
        assert!(!step.run_just_finished);

        assert!(s.mark_skipped("B"));
        assert_eq!(s.promote_ready(), vec!["C".to_string()]);
        assert!(s.mark_running("C"));

        let step = s.step_completion("C", TaskOutcome::Success);
        assert!(step.run_just_finished);
        assert!(s.is_finished());
    }

    #[test]
    fn failure_blocks_transitive_dependents_only() {
        let mut s = scheduler(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["B"]),
            ("X", &[]),
        ]);

        let ready = s.promote_ready();
        assert_eq!(ready.len(), 2);
        s.mark_running("A");
        s.mark_running("X");

        let step = s.step_completion("A", TaskOutcome::Failed(2));
        assert_eq!(step.newly_failed, vec!["A".to_string()]);
        let mut blocked = step.newly_blocked.clone();
        blocked.sort();
        assert_eq!(blocked, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(s.state_of("X"), Some(TaskState::Running));
        assert!(!step.run_just_finished);

        let step = s.step_completion("X", TaskOutcome::Success);
        assert!(step.run_just_finished);
    }

    #[test]
    fn precondition_failure_blocks_dependents() {
        let mut s = scheduler(&[("A", &[]), ("B", &["A"])]);
        s.promote_ready();
        let step = s.fail_before_launch("A");
        assert_eq!(step.newly_blocked, vec!["B".to_string()]);
        assert!(step.run_just_finished);
        assert_eq!(s.state_of("A"), Some(TaskState::Failed));
    }

    #[test]
    fn completion_of_non_running_task_is_ignored() {
        let mut s = scheduler(&[("A", &[])]);
        let step = s.step_completion("A", TaskOutcome::Success);
        assert_eq!(step, SchedulerStep::default());
        assert_eq!(s.state_of("A"), Some(TaskState::Pending));
    }

    #[test]
    fn block_unlaunched_leaves_running_tasks_alone() {
        let mut s = scheduler(&[("A", &[]), ("B", &[]), ("C", &["A"])]);
        s.promote_ready();
        s.mark_running("A");
        let mut blocked = s.block_unlaunched();
        blocked.sort();
        assert_eq!(blocked, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(s.state_of("A"), Some(TaskState::Running));
    }
}
