// tests/scheduler_properties.rs

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use jobdag::dag::{DagGraph, Scheduler, TaskState};
use jobdag::engine::{CoreRuntime, RuntimeEvent, RuntimeOptions, TaskOutcome};
use jobdag::fs::mock::MockFileSystem;
use jobdag::types::FailureMode;
use jobdag_test_utils::builders::{graph_of, slots, TaskBuilder};

const MAX_SLOTS: u32 = 4;

// Strategy to generate a valid DAG with per-task slot requests.
// We ensure acyclicity by only allowing task N to depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = DagGraph> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );
        let slots_strat = proptest::collection::vec(1..=MAX_SLOTS, num_tasks);

        (deps_strat, slots_strat).prop_map(move |(raw_deps, task_slots)| {
            let tasks = raw_deps.into_iter().enumerate().map(|(i, potential_deps)| {
                let name = format!("task_{}", i);
                let mut builder =
                    TaskBuilder::process(&name, &format!("echo {}", name)).slots(task_slots[i]);

                // Sanitize dependencies: only allow deps < i
                let valid_deps: HashSet<usize> = if i > 0 {
                    potential_deps.into_iter().map(|d| d % i).collect()
                } else {
                    HashSet::new()
                };
                for dep_idx in valid_deps {
                    builder = builder.after(&format!("task_{}", dep_idx));
                }
                builder.build()
            });
            graph_of(tasks)
        })
    })
}

fn failure_mode_strategy() -> impl Strategy<Value = FailureMode> {
    prop_oneof![Just(FailureMode::Passive), Just(FailureMode::Abort)]
}

proptest! {
    #[test]
    fn resources_and_dependencies_hold_under_any_completion_order(
        dag in dag_strategy(10),
        // Which running task completes next, as an index into the running set.
        picks in proptest::collection::vec(any::<usize>(), 64),
        failing_indices in proptest::collection::vec(0..10usize, 0..4),
        failure_mode in failure_mode_strategy(),
    ) {
        let names: Vec<String> = dag.tasks().map(|s| s.to_string()).collect();
        let failing: HashSet<String> = failing_indices
            .iter()
            .filter(|&&i| i < names.len())
            .map(|&i| format!("task_{}", i))
            .collect();

        let fs = Arc::new(MockFileSystem::new());
        let options = RuntimeOptions { failure_mode };
        let mut core = CoreRuntime::new(Scheduler::new(dag), slots(MAX_SLOTS), options, fs)
            .expect("every request fits");

        let mut running: Vec<String> = Vec::new();
        let mut step = core.start();
        let mut steps = 0;
        let max_steps = 1000;

        loop {
            running.extend(step.launched().map(|t| t.name.clone()));

            // Slot invariant.
            prop_assert!(core.pool().reserved_slots() <= MAX_SLOTS);
            let held: u32 = running
                .iter()
                .filter_map(|n| core.scheduler().task(n))
                .map(|t| t.request.slots)
                .sum();
            prop_assert_eq!(held, core.pool().reserved_slots());

            // A running task never has an unsatisfied dependency.
            for name in &running {
                prop_assert_eq!(core.scheduler().state_of(name), Some(TaskState::Running));
                prop_assert_eq!(core.scheduler().deps_satisfied(name), Some(true));
            }

            if !step.keep_running {
                break;
            }
            prop_assert!(!running.is_empty(), "run is stuck with nothing running");

            steps += 1;
            prop_assert!(steps < max_steps, "Simulation timed out - infinite loop?");

            let pick = picks[steps % picks.len()] % running.len();
            let task = running.remove(pick);
            let outcome = if failing.contains(&task) {
                TaskOutcome::Failed(1)
            } else {
                TaskOutcome::Success
            };
            step = core.step(RuntimeEvent::TaskCompleted { task, outcome });
        }

        prop_assert!(core.is_finished());
        prop_assert!(running.is_empty());
        prop_assert_eq!(core.pool().reserved_slots(), 0);

        let result = core.result();
        let any_failed = result.count(TaskState::Failed) > 0;
        prop_assert_eq!(result.success, !any_failed);

        // Passive: exactly the transitive dependents of failed tasks are blocked.
        if failure_mode == FailureMode::Passive {
            for name in &names {
                if result.state_of(name) == Some(TaskState::Blocked) {
                    let deps = core.scheduler().graph().dependencies_of(name);
                    prop_assert!(deps.iter().any(|d| result
                        .state_of(d)
                        .is_some_and(|s| s.is_unsuccessful())));
                }
            }
        }
    }
}
