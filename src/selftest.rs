// src/selftest.rs

//! `--test-tasking`: a small synthetic graph exercising every task kind.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::adapter::Executor;
use crate::dag::{TaskFunction, TaskGraph};
use crate::errors::Result;
use crate::types::JobClass;

/// Writes the sum of three integers to a log file.
#[derive(Debug, Clone)]
pub struct SumToLog {
    pub terms: [i64; 3],
    pub log: PathBuf,
}

impl TaskFunction for SumToLog {
    fn call(&self) -> anyhow::Result<()> {
        let sum: i64 = self.terms.iter().sum();
        std::fs::write(&self.log, format!("{sum}\n"))
            .with_context(|| format!("failed to write {}", self.log.display()))
    }
}

/// A log path under the system temp directory, unique to this process.
pub fn temp_log(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("jobdag-selftest-{}-{name}.log", std::process::id()))
}

/// One function task plus a single-run, an optimal-search and a misc task,
/// each running `<calc_bin> -h`.
pub fn build_graph(executor: &Executor) -> Result<TaskGraph> {
    let mut graph = TaskGraph::new();

    let sum = SumToLog {
        terms: [3, 4, 5],
        log: temp_log("tfunc"),
    };
    graph.add(executor.create_function_task("tfunc", Arc::new(sum)))?;

    let cmd = format!("{} -h", executor.calc_bin().display());
    for class in [JobClass::SingleRun, JobClass::OptimalSearch, JobClass::MiscProcess] {
        let name = format!("{class}-test");
        let log = temp_log(&name);
        graph.add(executor.create_task(class, name, &cmd, log))?;
    }

    Ok(graph)
}
