// src/items/mod.rs

//! Work items: turn manifest `[item.*]` sections into graph tasks.

pub mod placeholders;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::adapter::Executor;
use crate::config::{ItemConfig, Manifest, TaskConfig};
use crate::dag::{Condition, TaskGraph};
use crate::errors::{JobdagError, Result};
use crate::fs::FileSystem;

pub use placeholders::Placeholders;

/// Graph name of task `task` of item `item`.
pub fn task_name(item: &str, task: &str) -> String {
    format!("{item}_{task}")
}

/// Resolve requested item names, adding every item they depend on through
/// cross-item `after` entries.
///
/// Requested items keep their order; pulled-in items follow.
pub fn resolve_items(manifest: &Manifest, requested: &[String]) -> Result<Vec<String>> {
    let mut ordered: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut pending: Vec<String> = Vec::new();

    for name in requested {
        if manifest.item(name).is_none() {
            return Err(JobdagError::UnknownItem(name.clone()));
        }
        if seen.insert(name.clone()) {
            ordered.push(name.clone());
            pending.push(name.clone());
        }
    }

    while let Some(name) = pending.pop() {
        let Some(item) = manifest.item(&name) else {
            continue;
        };
        for task in item.task.values() {
            for dep in &task.after {
                let (dep_item, _) = TaskConfig::resolve_dependency(&name, dep);
                if seen.insert(dep_item.to_string()) {
                    debug!(item = %name, dependency = %dep_item, "pulling in dependency item");
                    ordered.push(dep_item.to_string());
                    pending.push(dep_item.to_string());
                }
            }
        }
    }

    Ok(ordered)
}

fn item_placeholders(executor: &Executor, name: &str) -> Placeholders {
    Placeholders::new()
        .set("calc_dir", executor.calc_dir().display().to_string())
        .set("calc_bin", executor.calc_bin().display().to_string())
        .set("cores", executor.parallel_execution_cores().to_string())
        .set("item", name)
}

/// The item's output directory with placeholders expanded.
pub fn output_dir(executor: &Executor, name: &str, item: &ItemConfig) -> Result<PathBuf> {
    item_placeholders(executor, name)
        .expand(&item.output)
        .map(PathBuf::from)
}

/// Remove an item's output directory.
pub fn clean_item(
    executor: &Executor,
    name: &str,
    item: &ItemConfig,
    fs: &dyn FileSystem,
) -> Result<()> {
    let output = output_dir(executor, name, item)?;
    info!(item = %name, output = %output.display(), "cleaning item outputs");
    fs.remove_dir_all(&output)
        .with_context(|| format!("failed to clean outputs of item '{name}'"))?;
    Ok(())
}

/// Create the item's output directory and register its tasks in `graph`.
///
/// Returns the number of tasks added.
pub fn add_item_tasks(
    graph: &mut TaskGraph,
    executor: &Executor,
    name: &str,
    item: &ItemConfig,
    fs: &dyn FileSystem,
) -> Result<usize> {
    let base = item_placeholders(executor, name);
    let output = base.expand(&item.output)?;
    let vars = base.set("output", output.clone());

    fs.create_dir_all(Path::new(&output))
        .with_context(|| format!("failed to create output directory '{output}'"))?;

    for (task_key, cfg) in item.task.iter() {
        let log = match &cfg.log {
            Some(log) => vars.expand(log)?,
            None => format!("{output}/{task_key}.log"),
        };
        let cmd = vars.expand(&cfg.cmd)?;

        let class = cfg.job_class()?;
        let mut task = executor.create_task(class, task_name(name, task_key), cmd, &log);

        if !cfg.inputs.is_empty() || !cfg.outputs.is_empty() {
            task.add_condition(Condition::new(
                expand_paths(&vars, &cfg.inputs)?,
                expand_paths(&vars, &cfg.outputs)?,
            ));
        }
        for cond in &cfg.conditions {
            task.add_condition(Condition::new(
                expand_paths(&vars, &cond.inputs)?,
                expand_paths(&vars, &cond.outputs)?,
            ));
        }
        for path in expand_paths(&vars, &cfg.transient)? {
            task.add_transient(path);
        }
        for dep in &cfg.after {
            let (dep_item, dep_task) = TaskConfig::resolve_dependency(name, dep);
            task.add_dependency(task_name(dep_item, dep_task));
        }

        debug!(task = %task.name, %class, "created task");
        graph.add(task)?;
    }

    Ok(item.task.len())
}

fn expand_paths(vars: &Placeholders, paths: &[String]) -> Result<Vec<PathBuf>> {
    paths
        .iter()
        .map(|p| vars.expand(p).map(PathBuf::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ExecutorSettings;
    use crate::config::{CalcEnvironment, RawManifest};
    use crate::dag::TaskPayload;
    use crate::fs::mock::MockFileSystem;
    use crate::types::ExecutionMode;

    const MANIFEST: &str = r#"
[item.tab2]
output = "tab2/output"
[item.tab2.task.calc]
class = "optimal-search"
cmd = "{calc_bin} llm-optimal-execution app -c {cores} > {output}/opt.json"
inputs = ["{calc_dir}/models/app.json"]
outputs = ["{output}/opt.json"]
transient = ["{output}/scratch.bin"]

[item.fig2]
output = "{item}/output"
[item.fig2.task.plot]
class = "misc"
cmd = "./plot {output}"
log = "{output}/plot.txt"
after = ["tab2.calc"]
"#;

    fn setup() -> (Manifest, Executor, MockFileSystem) {
        let raw: RawManifest = toml::from_str(MANIFEST).unwrap();
        let manifest = Manifest::try_from(raw).unwrap();
        let fs = MockFileSystem::new();
        fs.add_file("/calc/bin/calculon", "");
        let env = CalcEnvironment::discover("/calc", &fs).unwrap();
        let executor = Executor::new(ExecutionMode::Local8, env, ExecutorSettings::default()).unwrap();
        (manifest, executor, fs)
    }

    #[test]
    fn cross_item_dependencies_pull_in_items() {
        let (manifest, _, _) = setup();
        let items = resolve_items(&manifest, &["fig2".to_string()]).unwrap();
        assert_eq!(items, vec!["fig2", "tab2"]);

        let err = resolve_items(&manifest, &["fig99".to_string()]).unwrap_err();
        assert!(matches!(err, JobdagError::UnknownItem(name) if name == "fig99"));
    }

    #[test]
    fn builds_tasks_with_expanded_templates() {
        let (manifest, executor, fs) = setup();
        let mut graph = TaskGraph::new();
        for name in ["tab2", "fig2"] {
            let item = manifest.item(name).unwrap();
            add_item_tasks(&mut graph, &executor, name, item, &fs).unwrap();
        }
        assert!(fs.is_dir(Path::new("tab2/output")));
        assert!(fs.is_dir(Path::new("fig2/output")));

        let dag = graph.build().unwrap();
        let calc = dag.task("tab2_calc").unwrap();
        assert_eq!(
            calc.command(),
            Some("/calc/bin/calculon llm-optimal-execution app -c 8 > tab2/output/opt.json")
        );
        assert_eq!(calc.conditions.len(), 1);
        assert_eq!(
            calc.conditions[0].inputs(),
            &[PathBuf::from("/calc/models/app.json")]
        );
        match &calc.payload {
            TaskPayload::Process(spec) => {
                assert_eq!(spec.stdout.as_deref(), Some(Path::new("tab2/output/calc.log")));
                assert_eq!(spec.transient, vec![PathBuf::from("tab2/output/scratch.bin")]);
            }
            TaskPayload::Function(_) => panic!("expected process"),
        }

        let plot = dag.task("fig2_plot").unwrap();
        assert_eq!(plot.deps, vec!["tab2_calc".to_string()]);
        assert!(plot.conditions.is_empty());
        assert_eq!(dag.dependents_of("tab2_calc"), &["fig2_plot".to_string()]);
    }

    #[test]
    fn clean_removes_output_tree() {
        let (manifest, executor, fs) = setup();
        fs.add_file("fig2/output/plot.txt", "");
        fs.add_file("tab2/output/opt.json", "{}");
        clean_item(&executor, "fig2", manifest.item("fig2").unwrap(), &fs).unwrap();
        assert!(!fs.exists(Path::new("fig2/output/plot.txt")));
        clean_item(&executor, "tab2", manifest.item("tab2").unwrap(), &fs).unwrap();
        assert!(!fs.exists(Path::new("tab2/output/opt.json")));
    }
}
