// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task::Task;
use crate::engine::TaskName;
use crate::errors::GraphError;

/// Registration-time view of the graph: tasks are added one by one and the
/// structure is only checked as a whole in [`TaskGraph::build`].
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<TaskName, usize>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Names must be unique within a run.
    pub fn add(&mut self, task: Task) -> Result<(), GraphError> {
        if self.index.contains_key(&task.name) {
            return Err(GraphError::DuplicateTask(task.name));
        }
        self.index.insert(task.name.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolve every dependency and reject cycles.
    pub fn build(self) -> Result<DagGraph, GraphError> {
        for task in &self.tasks {
            for dep in &task.deps {
                if !self.index.contains_key(dep) {
                    return Err(GraphError::UnknownDependency {
                        task: task.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let order = topological_order(&self.tasks)?;
        Ok(DagGraph::from_tasks(self.tasks, order))
    }
}

fn topological_order(tasks: &[Task]) -> Result<Vec<TaskName>, GraphError> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for task in tasks {
        graph.add_node(task.name.as_str());
    }
    for task in tasks {
        for dep in &task.deps {
            graph.add_edge(dep.as_str(), task.name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(GraphError::Cycle(cycle.node_id().to_string())),
    }
}

/// Internal node structure: the task plus its immediate dependents.
#[derive(Debug, Clone)]
struct DagNode {
    task: Task,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// Validated, acyclic task graph.
///
/// Dependency names are guaranteed to resolve, and [`DagGraph::tasks`]
/// yields names in a topological order.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<TaskName, DagNode>,
    order: Vec<TaskName>,
}

impl DagGraph {
    fn from_tasks(tasks: Vec<Task>, order: Vec<TaskName>) -> Self {
        let mut nodes: HashMap<TaskName, DagNode> = tasks
            .into_iter()
            .map(|task| {
                (
                    task.name.clone(),
                    DagNode {
                        task,
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        // Populate dependents in topological order so that they come out
        // deterministically.
        for name in &order {
            let deps = nodes
                .get(name)
                .map(|n| n.task.deps.clone())
                .unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes, order }
    }

    /// Return all task names in topological order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.nodes.get(name).map(|n| &n.task)
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.task.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
