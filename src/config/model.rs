// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{JobdagError, Result};
use crate::types::{FailureMode, JobClass};

/// Manifest as read from a TOML file, before semantic validation.
///
/// ```toml
/// [run]
/// failure_mode = "passive"
///
/// [item.fig2]
/// output = "fig2/output"
///
/// [item.fig2.task.calc]
/// class = "single-run"
/// cmd = "{calc_bin} llm ..."
/// outputs = ["{output}/stats.json"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub local: LocalSection,

    #[serde(default)]
    pub remote: RemoteSection,

    /// Work items from `[item.<name>]`.
    #[serde(default)]
    pub item: BTreeMap<String, ItemConfig>,
}

/// Validated manifest. Only constructed through `TryFrom<RawManifest>`.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub run: RunSection,
    pub local: LocalSection,
    pub remote: RemoteSection,
    items: BTreeMap<String, ItemConfig>,
}

impl Manifest {
    pub(crate) fn new_unchecked(
        run: RunSection,
        local: LocalSection,
        remote: RemoteSection,
        items: BTreeMap<String, ItemConfig>,
    ) -> Self {
        Self {
            run,
            local,
            remote,
            items,
        }
    }

    pub fn items(&self) -> &BTreeMap<String, ItemConfig> {
        &self.items
    }

    pub fn item(&self, name: &str) -> Option<&ItemConfig> {
        self.items.get(name)
    }

    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(|s| s.as_str())
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// `passive` or `abort`; read through [`RunSection::failure_mode`].
    #[serde(default = "default_failure_mode")]
    pub failure_mode: String,

    /// Delete declared transient files after successful processes.
    #[serde(default = "default_cleanup_files")]
    pub cleanup_files: bool,
}

fn default_failure_mode() -> String {
    FailureMode::default().to_string()
}

fn default_cleanup_files() -> bool {
    true
}

impl RunSection {
    pub fn failure_mode(&self) -> Result<FailureMode> {
        self.failure_mode.parse().map_err(|err| {
            JobdagError::ConfigError(format!("[run].failure_mode: {}", bare_message(err)))
        })
    }
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            failure_mode: default_failure_mode(),
            cleanup_files: default_cleanup_files(),
        }
    }
}

/// `[local]` section: capacity of the shared host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalSection {
    /// Override for the detected core count in `local-full` mode.
    #[serde(default)]
    pub cores: Option<u32>,

    /// Memory budget in GiB; unbounded when absent.
    #[serde(default)]
    pub max_memory_gib: Option<u64>,
}

/// `[remote]` section: client side of the batch-queue submission.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSection {
    #[serde(default = "default_submit_bin")]
    pub submit_bin: String,

    #[serde(default = "default_project")]
    pub project: String,

    #[serde(default = "default_resource_class")]
    pub resource_class: String,

    /// Cluster-wide slot quota for one submitter.
    #[serde(default = "default_max_slots_per_user")]
    pub max_slots_per_user: u32,

    /// Cores requested by multicore job classes.
    #[serde(default = "default_parallel_cores")]
    pub parallel_cores: u32,
}

fn default_submit_bin() -> String {
    "/home/nv/bin/qsub".to_string()
}

fn default_project() -> String {
    "research_networking_misc".to_string()
}

fn default_resource_class() -> String {
    "rel75".to_string()
}

fn default_max_slots_per_user() -> u32 {
    600
}

fn default_parallel_cores() -> u32 {
    8
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            submit_bin: default_submit_bin(),
            project: default_project(),
            resource_class: default_resource_class(),
            max_slots_per_user: default_max_slots_per_user(),
            parallel_cores: default_parallel_cores(),
        }
    }
}

/// `[item.<name>]` section: one caller-facing work item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemConfig {
    /// Output directory; removed by `--clean` and created before tasks are
    /// built.
    pub output: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Tasks from `[item.<name>.task.<task>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[item.<name>.task.<task>]` section.
///
/// String fields may use the placeholders `{calc_dir}`, `{calc_bin}`,
/// `{cores}`, `{output}` and `{item}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Job class name; read through [`TaskConfig::job_class`].
    pub class: String,

    /// The command to execute.
    pub cmd: String,

    /// Stdout log; stderr goes to `<log>.err`. Defaults to
    /// `{output}/<task>.log`.
    #[serde(default)]
    pub log: Option<String>,

    /// Tasks of the same item, or `<item>.<task>` for another item.
    #[serde(default)]
    pub after: Vec<String>,

    /// Shorthand for a single condition.
    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,

    /// Additional conditions; the task runs if any condition is stale.
    #[serde(default)]
    pub conditions: Vec<ConditionConfig>,

    /// Scratch files deleted after a successful run.
    #[serde(default)]
    pub transient: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionConfig {
    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,
}

impl TaskConfig {
    pub fn job_class(&self) -> Result<JobClass> {
        self.class.parse()
    }

    /// Resolve an `after` entry to `(item, task)`.
    pub fn resolve_dependency<'a>(item: &'a str, dep: &'a str) -> (&'a str, &'a str) {
        match dep.split_once('.') {
            Some((other_item, task)) => (other_item, task),
            None => (item, dep),
        }
    }
}

/// Message of a configuration error without the variant prefix.
pub(crate) fn bare_message(err: JobdagError) -> String {
    match err {
        JobdagError::ConfigError(msg) => msg,
        other => other.to_string(),
    }
}
