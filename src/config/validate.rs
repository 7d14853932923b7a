// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{Manifest, RawManifest, TaskConfig, bare_message};
use crate::errors::{GraphError, JobdagError, Result};

impl TryFrom<RawManifest> for Manifest {
    type Error = JobdagError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_raw_manifest(&raw)?;
        Ok(Manifest::new_unchecked(raw.run, raw.local, raw.remote, raw.item))
    }
}

fn validate_raw_manifest(cfg: &RawManifest) -> Result<()> {
    validate_capacity(cfg)?;
    cfg.run.failure_mode()?;
    validate_items(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn validate_capacity(cfg: &RawManifest) -> Result<()> {
    if cfg.local.cores == Some(0) {
        return Err(JobdagError::ConfigError(
            "[local].cores must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.remote.parallel_cores == 0 {
        return Err(JobdagError::ConfigError(
            "[remote].parallel_cores must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.remote.max_slots_per_user < cfg.remote.parallel_cores {
        return Err(JobdagError::ConfigError(format!(
            "[remote].max_slots_per_user ({}) must be >= parallel_cores ({})",
            cfg.remote.max_slots_per_user, cfg.remote.parallel_cores
        )));
    }

    Ok(())
}

fn validate_items(cfg: &RawManifest) -> Result<()> {
    if cfg.item.is_empty() {
        return Err(JobdagError::ConfigError(
            "manifest must declare at least one [item.<name>] section".to_string(),
        ));
    }

    for (name, item) in cfg.item.iter() {
        if item.task.is_empty() {
            return Err(JobdagError::ConfigError(format!(
                "item '{}' must contain at least one [item.{}.task.<name>] section",
                name, name
            )));
        }
        if item.output.trim().is_empty() {
            return Err(JobdagError::ConfigError(format!(
                "item '{}' has an empty `output` directory",
                name
            )));
        }
        for (task_name, task) in item.task.iter() {
            task.job_class().map_err(|err| {
                JobdagError::ConfigError(format!(
                    "task '{}.{}': {}",
                    name,
                    task_name,
                    bare_message(err)
                ))
            })?;
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawManifest) -> Result<()> {
    for (item_name, item) in cfg.item.iter() {
        for (task_name, task) in item.task.iter() {
            for dep in task.after.iter() {
                let (dep_item, dep_task) = TaskConfig::resolve_dependency(item_name, dep);
                let known = cfg
                    .item
                    .get(dep_item)
                    .is_some_and(|i| i.task.contains_key(dep_task));
                if !known {
                    return Err(JobdagError::ConfigError(format!(
                        "task '{}.{}' has unknown dependency '{}' in `after`",
                        item_name, task_name, dep
                    )));
                }
                if dep_item == item_name && dep_task == task_name {
                    return Err(JobdagError::ConfigError(format!(
                        "task '{}.{}' cannot depend on itself in `after`",
                        item_name, task_name
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawManifest) -> Result<()> {
    // Nodes are qualified "<item>.<task>" names; edge direction: dep -> task.
    let names: Vec<(String, Vec<String>)> = cfg
        .item
        .iter()
        .flat_map(|(item_name, item)| {
            item.task.iter().map(move |(task_name, task)| {
                let deps = task
                    .after
                    .iter()
                    .map(|dep| {
                        let (i, t) = TaskConfig::resolve_dependency(item_name, dep);
                        format!("{i}.{t}")
                    })
                    .collect();
                (format!("{item_name}.{task_name}"), deps)
            })
        })
        .collect();

    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (name, _) in &names {
        graph.add_node(name.as_str());
    }
    for (name, deps) in &names {
        for dep in deps {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(GraphError::Cycle(cycle.node_id().to_string()).into()),
    }
}
