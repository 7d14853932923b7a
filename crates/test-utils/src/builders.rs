#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use jobdag::config::{Manifest, RawManifest};
use jobdag::dag::{
    Condition, DagGraph, ProcessSpec, ResourceRequest, Task, TaskFunction, TaskGraph,
};
use jobdag::engine::PoolLimits;

/// Builder for `Task` to simplify test setup.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    /// A process task with one slot, untracked memory and no output
    /// redirection.
    pub fn process(name: &str, cmd: &str) -> Self {
        let spec = ProcessSpec {
            command: cmd.to_string(),
            stdout: None,
            stderr: None,
            transient: vec![],
        };
        Self {
            task: Task::process(name, spec, ResourceRequest::default()),
        }
    }

    pub fn function(name: &str, func: Arc<dyn TaskFunction>) -> Self {
        Self {
            task: Task::function(name, func, ResourceRequest::default()),
        }
    }

    pub fn slots(mut self, slots: u32) -> Self {
        self.task.request.slots = slots.max(1);
        self
    }

    pub fn memory(mut self, gib: u64) -> Self {
        self.task.request.memory_gib = Some(gib);
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.add_dependency(dep);
        self
    }

    pub fn condition(mut self, inputs: &[&str], outputs: &[&str]) -> Self {
        self.task.add_condition(Condition::new(
            inputs.iter().copied(),
            outputs.iter().copied(),
        ));
        self
    }

    pub fn log(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let jobdag::dag::TaskPayload::Process(spec) = &mut self.task.payload {
            let mut err = path.clone().into_os_string();
            err.push(".err");
            spec.stdout = Some(path);
            spec.stderr = Some(PathBuf::from(err));
        }
        self
    }

    pub fn transient(mut self, path: impl Into<PathBuf>) -> Self {
        self.task.add_transient(path);
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// Register `tasks` and build the graph, panicking on structural errors.
pub fn graph_of(tasks: impl IntoIterator<Item = Task>) -> DagGraph {
    let mut graph = TaskGraph::new();
    for task in tasks {
        graph.add(task).expect("duplicate task in test graph");
    }
    graph.build().expect("invalid test graph")
}

/// `names[0] -> names[1] -> ...`, each running `echo <name>`.
pub fn chain(names: &[&str]) -> DagGraph {
    graph_of(names.iter().enumerate().map(|(i, name)| {
        let mut b = TaskBuilder::process(name, &format!("echo {name}"));
        if i > 0 {
            b = b.after(names[i - 1]);
        }
        b.build()
    }))
}

/// Slot-only pool limits.
pub fn slots(max_slots: u32) -> PoolLimits {
    PoolLimits {
        max_slots,
        track_memory: false,
        max_memory_gib: None,
    }
}

/// Slot and memory pool limits.
pub fn slots_and_memory(max_slots: u32, max_memory_gib: u64) -> PoolLimits {
    PoolLimits {
        max_slots,
        track_memory: true,
        max_memory_gib: Some(max_memory_gib),
    }
}

/// Parse and validate a manifest from a TOML string.
pub fn manifest(toml_str: &str) -> Manifest {
    let raw: RawManifest = toml::from_str(toml_str).expect("invalid TOML in test manifest");
    Manifest::try_from(raw).expect("Failed to build valid manifest from TOML")
}
