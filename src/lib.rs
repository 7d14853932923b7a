// src/lib.rs

pub mod adapter;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod items;
pub mod logging;
pub mod selftest;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::adapter::{Executor, ExecutorSettings};
use crate::cli::{CliArgs, ModeArg};
use crate::config::{CalcEnvironment, Manifest, load_and_validate};
use crate::dag::{DagGraph, Scheduler, TaskGraph, TaskPayload, TaskState};
use crate::engine::{CoreRuntime, PoolLimits, RunResult, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::{ProcessOptions, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading and environment validation
/// - the executor for the chosen mode
/// - item task creation (with optional cleaning)
/// - scheduler / resource pool / runtime
/// - Ctrl-C handling
///
/// Returns `Ok(false)` when the run finished with failed or blocked tasks.
pub async fn run(args: CliArgs) -> Result<bool> {
    let manifest = load_manifest(&args)?;

    let mode = match args.mode {
        ModeArg::List => {
            print_items(&manifest);
            return Ok(true);
        }
        ModeArg::Execute(mode) => mode,
    };

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let env = CalcEnvironment::discover(&args.calc_dir, fs.as_ref())?;
    let settings = ExecutorSettings {
        local: manifest.local.clone(),
        remote: manifest.remote.clone(),
    };
    let executor = Executor::new(mode, env, settings)?;

    let failure_mode = match args.failure_mode {
        Some(mode) => mode,
        None => manifest.run.failure_mode()?,
    };
    let options = RuntimeOptions { failure_mode };
    let process = ProcessOptions {
        cleanup_files: manifest.run.cleanup_files,
        fs: fs.clone(),
    };

    if args.test_tasking {
        let dag = selftest::build_graph(&executor)?.build()?;
        let result = run_graph(dag, executor.pool_limits(), options, process).await?;
        if !result.success {
            println!("Task execution failed");
        }
        return Ok(result.success);
    }

    if args.items.is_empty() {
        println!("No items selected for execution mode '{mode}'");
        return Ok(true);
    }

    let selected = items::resolve_items(&manifest, &args.items)?;
    let mut graph = TaskGraph::new();
    for name in &selected {
        let Some(item) = manifest.item(name) else {
            continue;
        };
        // Items pulled in only through `after` keep their outputs.
        if args.clean && args.items.contains(name) {
            println!("Clean outputs for {name}");
            items::clean_item(&executor, name, item, fs.as_ref())?;
        }
        println!("Getting tasks for {name}");
        items::add_item_tasks(&mut graph, &executor, name, item, fs.as_ref())?;
    }
    let dag = graph.build()?;

    if args.skip_run {
        print_dry_run(&dag, &executor);
        return Ok(true);
    }

    println!("Running tasks");
    let result = run_graph(dag, executor.pool_limits(), options, process).await?;
    print_summary(&result);
    Ok(result.success)
}

/// Run a validated graph to completion with the real process executor.
pub async fn run_graph(
    dag: DagGraph,
    limits: PoolLimits,
    options: RuntimeOptions,
    process: ProcessOptions,
) -> Result<RunResult> {
    // Unbounded: function tasks report completion from inside the runtime's
    // own launch call.
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let fs = process.fs.clone();
    let executor = RealExecutorBackend::new(rt_tx.clone(), process);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested);
        });
    }

    let core = CoreRuntime::new(Scheduler::new(dag), limits, options, fs)?;
    let runtime = Runtime::new(core, rt_rx, executor);
    let result = runtime.run().await.context("task runtime failed")?;

    info!(
        success = result.success,
        launched = result.launched,
        "run finished"
    );
    Ok(result)
}

fn load_manifest(args: &CliArgs) -> Result<Manifest> {
    // The self-test needs no items; fall back to defaults when the manifest
    // is absent.
    if args.test_tasking && !args.manifest.exists() {
        debug!(path = %args.manifest.display(), "no manifest; using defaults");
        return Ok(Manifest::default());
    }
    load_and_validate(&args.manifest)
        .with_context(|| format!("failed to load manifest {}", args.manifest.display()))
}

fn print_items(manifest: &Manifest) {
    let names: Vec<_> = manifest.item_names().collect();
    println!("Available items: {names:?}");
    for (name, item) in manifest.items() {
        if let Some(desc) = &item.description {
            println!("  {name}: {desc}");
        }
    }
}

/// Dry-run output: tasks in launch order with requests, deps and commands.
fn print_dry_run(dag: &DagGraph, executor: &Executor) {
    println!("jobdag dry-run ({})", executor.mode());
    let limits = executor.pool_limits();
    println!(
        "  pool: {} slot(s), memory {}",
        limits.max_slots,
        match (limits.track_memory, limits.max_memory_gib) {
            (false, _) => "untracked".to_string(),
            (true, None) => "unbounded".to_string(),
            (true, Some(gib)) => format!("{gib} GiB"),
        }
    );
    println!();

    println!("tasks ({}):", dag.len());
    for name in dag.tasks() {
        let Some(task) = dag.task(name) else {
            continue;
        };
        println!("  - {name}");
        match &task.payload {
            TaskPayload::Process(spec) => println!("      cmd: {}", spec.command),
            TaskPayload::Function(func) => println!("      fn: {func:?}"),
        }
        println!(
            "      slots: {}, memory: {:?} GiB, wall: {:?} h",
            task.request.slots, task.request.memory_gib, task.wall_hours
        );
        if !task.deps.is_empty() {
            println!("      after: {:?}", task.deps);
        }
        if !task.conditions.is_empty() {
            println!("      conditions: {}", task.conditions.len());
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_summary(result: &RunResult) {
    println!(
        "{} completed, {} skipped, {} failed, {} blocked",
        result.count(TaskState::Completed),
        result.count(TaskState::Skipped),
        result.count(TaskState::Failed),
        result.count(TaskState::Blocked),
    );
    for (name, state) in &result.states {
        if state.is_unsuccessful() {
            println!("  {name}: {state}");
        }
    }
}
