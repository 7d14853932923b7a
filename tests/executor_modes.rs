// tests/executor_modes.rs

use std::path::Path;

use jobdag::adapter::{Executor, ExecutorSettings};
use jobdag::config::{CalcEnvironment, RemoteSection};
use jobdag::dag::{ResourceRequest, TaskGraph, TaskPayload};
use jobdag::fs::FileSystem;
use jobdag::fs::mock::MockFileSystem;
use jobdag::items;
use jobdag::types::{ExecutionMode, JobClass};
use jobdag_test_utils::builders::manifest;

fn calc_env() -> CalcEnvironment {
    let fs = MockFileSystem::new();
    fs.add_file("/opt/calc/bin/calculon", "");
    CalcEnvironment::discover("/opt/calc", &fs).unwrap()
}

#[test]
fn local_8_exhaustive_sweep() {
    let ex = Executor::new(ExecutionMode::Local8, calc_env(), ExecutorSettings::default()).unwrap();
    let task = ex.create_task(JobClass::ExhaustiveSweep, "sweep", "C", "sweep.log");

    assert_eq!(task.request, ResourceRequest::new(8, Some(32)));
    assert_eq!(task.wall_hours, Some(8));
    assert_eq!(task.command(), Some("C"));
}

#[test]
fn remote_optimal_search_submission() {
    let ex = Executor::new(ExecutionMode::Remote, calc_env(), ExecutorSettings::default()).unwrap();
    let task = ex.create_task(JobClass::OptimalSearch, "opt", "C", "opt.log");

    let cmd = task.command().unwrap();
    assert!(cmd.contains("o_cpu_8G_8H"));
    assert!(cmd.contains("-n 8 -R 'span[hosts=1]'"));
    assert!(cmd.contains("-K"));
    assert!(cmd.starts_with("/home/nv/bin/qsub -P research_networking_misc -m rel75 -env all"));
    assert_eq!(task.request.memory_gib, None);
}

#[test]
fn remote_settings_come_from_the_manifest() {
    let settings = ExecutorSettings {
        remote: RemoteSection {
            submit_bin: "bsub".into(),
            project: "proj".into(),
            resource_class: "rc".into(),
            max_slots_per_user: 64,
            parallel_cores: 16,
        },
        ..Default::default()
    };
    let ex = Executor::new(ExecutionMode::Remote, calc_env(), settings).unwrap();
    assert_eq!(ex.pool_limits().max_slots, 64);
    assert_eq!(ex.slots_for(JobClass::ExhaustiveSweep), 16);

    let cmd = ex
        .create_task(JobClass::ExhaustiveSweep, "sw", "run", "sw.log")
        .command()
        .unwrap()
        .to_string();
    assert_eq!(
        cmd,
        "bsub -P proj -m rc -env all -q o_cpu_32G_8H -K -J sw -n 16 -R 'span[hosts=1]' \
         -oo sw.log -eo sw.log.err run"
    );
}

#[test]
fn remote_single_slot_tasks_are_not_redirected_locally() {
    let ex = Executor::new(ExecutionMode::Remote, calc_env(), ExecutorSettings::default()).unwrap();
    let task = ex.create_task(JobClass::MiscProcess, "misc", "plot", "misc.log");

    assert!(!task.command().unwrap().contains("-n "));
    assert!(task.command().unwrap().contains("-q o_cpu_16G_1H"));
    match &task.payload {
        TaskPayload::Process(spec) => {
            assert!(spec.stdout.is_none());
            assert!(spec.stderr.is_none());
        }
        TaskPayload::Function(_) => panic!("expected process task"),
    }
}

#[test]
fn same_manifest_targets_every_mode() {
    let m = manifest(
        r#"
[item.tab3]
output = "tab3/output"

[item.tab3.task.search]
class = "optimal-search"
cmd = "{calc_bin} llm-optimal-execution app 64 16 float16 sys {output}/opt.json -c {cores} -n -m -f true -t 5"
outputs = ["{output}/opt.json"]
"#,
    );

    for mode in ExecutionMode::ALL {
        let fs = MockFileSystem::new();
        let ex = Executor::new(mode, calc_env(), ExecutorSettings::default()).unwrap();
        let mut graph = TaskGraph::new();
        items::add_item_tasks(&mut graph, &ex, "tab3", m.item("tab3").unwrap(), &fs).unwrap();

        let dag = graph.build().unwrap();
        let task = dag.task("tab3_search").unwrap();
        let cmd = task.command().unwrap();
        assert!(
            cmd.contains(&format!("-c {}", ex.parallel_execution_cores())),
            "{mode}: {cmd}"
        );
        assert!(ex.pool_limits().max_slots >= task.request.slots);
        assert_eq!(mode == ExecutionMode::Remote, cmd.contains(" -K "));
        assert!(fs.is_dir(Path::new("tab3/output")));
    }
}
