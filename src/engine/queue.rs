// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::dag::ResourceRequest;

use super::{ResourcePool, TaskName};

/// Ready, stale tasks waiting for resource capacity.
///
/// Semantics:
/// - Tasks are enqueued in the order they became ready.
/// - [`LaunchQueue::admit`] walks the whole queue once and admits every task
///   the pool can currently hold; tasks that do not fit keep their position
///   for a later pass, so a large request does not hold back smaller ones
///   queued behind it.
#[derive(Debug, Default)]
pub struct LaunchQueue {
    entries: VecDeque<(TaskName, ResourceRequest)>,
}

impl LaunchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, task: TaskName, request: ResourceRequest) {
        debug!(task = %task, slots = request.slots, "queued for launch");
        self.entries.push_back((task, request));
    }

    /// Reserve resources for as many queued tasks as fit, in queue order,
    /// returning the admitted task names.
    pub fn admit(&mut self, pool: &mut ResourcePool) -> Vec<TaskName> {
        let mut admitted = Vec::new();
        let mut waiting = VecDeque::with_capacity(self.entries.len());

        while let Some((task, request)) = self.entries.pop_front() {
            if pool.try_reserve(&request) {
                admitted.push(task);
            } else {
                waiting.push_back((task, request));
            }
        }

        if !waiting.is_empty() {
            debug!(
                admitted = admitted.len(),
                waiting = waiting.len(),
                "some ready tasks wait for resources"
            );
        }
        self.entries = waiting;
        admitted
    }

    /// Remove everything still queued (used when the run is aborted).
    pub fn clear(&mut self) -> Vec<TaskName> {
        self.entries.drain(..).map(|(name, _)| name).collect()
    }
}
