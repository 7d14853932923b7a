// tests/process_execution.rs

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use jobdag::dag::{TaskFunction, TaskState};
use jobdag::engine::{RunResult, RuntimeOptions};
use jobdag::exec::ProcessOptions;
use jobdag::fs::RealFileSystem;
use jobdag::run_graph;
use jobdag_test_utils::builders::{graph_of, slots, TaskBuilder};

fn process_options(cleanup_files: bool) -> ProcessOptions {
    ProcessOptions {
        cleanup_files,
        fs: Arc::new(RealFileSystem),
    }
}

async fn run(dag: jobdag::dag::DagGraph, cleanup: bool) -> RunResult {
    with_timeout(run_graph(dag, slots(4), RuntimeOptions::default(), process_options(cleanup)))
        .await
        .expect("run failed")
}

#[tokio::test]
async fn in_out_three_run_scenario() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "v1").unwrap();

    let copy = |dir: &std::path::Path| {
        let input = dir.join("in.txt");
        let output = dir.join("out.txt");
        graph_of([TaskBuilder::process(
            "copy",
            &format!("cp {} {}", input.display(), output.display()),
        )
        .condition(&[input.to_str().unwrap()], &[output.to_str().unwrap()])
        .build()])
    };

    // 1. Output missing: runs.
    let result = run(copy(dir.path()), true).await;
    assert_eq!(result.state_of("copy"), Some(TaskState::Completed));
    assert_eq!(result.launched, 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "v1");

    // 2. Nothing changed: skipped.
    let result = run(copy(dir.path()), true).await;
    assert_eq!(result.state_of("copy"), Some(TaskState::Skipped));
    assert_eq!(result.launched, 0);

    // 3. Input modified after the output: runs again.
    fs::write(&input, "v2").unwrap();
    let later = SystemTime::now() + Duration::from_secs(10);
    fs::File::options()
        .write(true)
        .open(&input)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let result = run(copy(dir.path()), true).await;
    assert_eq!(result.state_of("copy"), Some(TaskState::Completed));
    assert_eq!(result.launched, 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "v2");
}

#[tokio::test]
async fn output_goes_to_log_and_err_log() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("logs/task.log");
    let dag = graph_of([TaskBuilder::process("talk", "echo out; echo err >&2")
        .log(&log)
        .build()]);

    let result = run(dag, true).await;
    assert!(result.success);
    assert_eq!(fs::read_to_string(&log).unwrap(), "out\n");
    assert_eq!(
        fs::read_to_string(dir.path().join("logs/task.log.err")).unwrap(),
        "err\n"
    );
}

#[tokio::test]
async fn transient_files_removed_only_after_success_with_cleanup() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch.bin");
    let make = |name: &str| {
        TaskBuilder::process(name, &format!("touch {}", scratch.display()))
            .transient(&scratch)
            .build()
    };

    let result = run(graph_of([make("keep")]), false).await;
    assert!(result.success);
    assert!(scratch.exists());

    let result = run(graph_of([make("clean")]), true).await;
    assert!(result.success);
    assert!(!scratch.exists());
}

#[tokio::test]
async fn nonzero_exit_fails_and_blocks_dependents() {
    init_tracing();

    let dag = graph_of([
        TaskBuilder::process("bad", "exit 3").build(),
        TaskBuilder::process("after_bad", "true").after("bad").build(),
        TaskBuilder::process("good", "true").build(),
    ]);

    let result = run(dag, true).await;
    assert!(!result.success);
    assert_eq!(result.state_of("bad"), Some(TaskState::Failed));
    assert_eq!(result.state_of("after_bad"), Some(TaskState::Blocked));
    assert_eq!(result.state_of("good"), Some(TaskState::Completed));
}

#[derive(Debug)]
struct WriteFile(std::path::PathBuf);

impl TaskFunction for WriteFile {
    fn call(&self) -> anyhow::Result<()> {
        fs::write(&self.0, "done")?;
        Ok(())
    }
}

#[derive(Debug)]
struct Explode;

impl TaskFunction for Explode {
    fn call(&self) -> anyhow::Result<()> {
        anyhow::bail!("boom")
    }
}

#[tokio::test]
async fn function_tasks_feed_process_tasks() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let copy = dir.path().join("copy");

    let dag = graph_of([
        TaskBuilder::function("write", Arc::new(WriteFile(marker.clone()))).build(),
        TaskBuilder::process(
            "copy",
            &format!("cp {} {}", marker.display(), copy.display()),
        )
        .after("write")
        .build(),
        TaskBuilder::function("explode", Arc::new(Explode)).build(),
    ]);

    let result = run(dag, true).await;
    assert_eq!(result.state_of("write"), Some(TaskState::Completed));
    assert_eq!(result.state_of("copy"), Some(TaskState::Completed));
    assert_eq!(result.state_of("explode"), Some(TaskState::Failed));
    assert_eq!(fs::read_to_string(copy).unwrap(), "done");
}

#[tokio::test]
async fn every_submitted_job_reports_one_completion() {
    init_tracing();

    use jobdag::dag::ProcessSpec;
    use jobdag::engine::{RuntimeEvent, TaskOutcome};
    use jobdag::exec::executor_loop::ProcessJob;
    use jobdag::exec::spawn_executor;
    use tokio::sync::mpsc;

    let (rt_tx, mut rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();
    let jobs = spawn_executor(rt_tx, process_options(false));

    let job = ProcessJob {
        name: "again".to_string(),
        spec: ProcessSpec {
            command: "sleep 0.2".to_string(),
            stdout: None,
            stderr: None,
            transient: Vec::new(),
        },
    };
    // Same name while the first is still running: both must complete.
    jobs.send(job.clone()).await.unwrap();
    jobs.send(job).await.unwrap();

    for _ in 0..2 {
        let event = with_timeout(rt_rx.recv()).await;
        assert!(matches!(
            event,
            Some(RuntimeEvent::TaskCompleted { ref task, outcome: TaskOutcome::Success })
                if task == "again"
        ));
    }
}
