// src/adapter/mod.rs

//! Backend adapter: turns abstract job classes into concrete tasks for one
//! execution mode.
//!
//! - [`profile`] maps a job class to its memory/wall budget.
//! - [`submit`] builds the remote submission command line.
//! - [`calc`] builds command lines for the simulation binary.
//!
//! An [`Executor`] is bound to a single [`ExecutionMode`] and a validated
//! [`CalcEnvironment`]; every task it creates carries a resource request
//! that fits the pool limits it reports.

pub mod calc;
pub mod profile;
pub mod submit;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapter::calc::SearchArgs;
use crate::adapter::profile::JobProfile;
use crate::adapter::submit::Submission;
use crate::config::{CalcEnvironment, LocalSection, RemoteSection};
use crate::dag::{ProcessSpec, ResourceRequest, Task, TaskFunction};
use crate::engine::{PoolLimits, TaskName};
use crate::errors::{JobdagError, Result};
use crate::types::{ExecutionMode, JobClass};

/// Parallel core count used by `local-8`.
pub const LOCAL_8_CORES: u32 = 8;

/// Backend capacity settings, usually the manifest's `[local]` and
/// `[remote]` sections.
#[derive(Debug, Clone, Default)]
pub struct ExecutorSettings {
    pub local: LocalSection,
    pub remote: RemoteSection,
}

/// Creates tasks for one execution mode.
#[derive(Debug, Clone)]
pub struct Executor {
    mode: ExecutionMode,
    env: CalcEnvironment,
    settings: ExecutorSettings,
    parallel_cores: u32,
    limits: PoolLimits,
}

impl Executor {
    pub fn new(mode: ExecutionMode, env: CalcEnvironment, settings: ExecutorSettings) -> Result<Self> {
        let parallel_cores = match mode {
            ExecutionMode::LocalFull => match settings.local.cores {
                Some(cores) => cores,
                None => detect_host_cores(),
            },
            ExecutionMode::Local8 => LOCAL_8_CORES,
            ExecutionMode::Remote => settings.remote.parallel_cores,
        };
        if parallel_cores == 0 {
            return Err(JobdagError::ConfigError(format!(
                "execution mode '{mode}' has no parallel cores"
            )));
        }

        let limits = match mode {
            ExecutionMode::LocalFull | ExecutionMode::Local8 => PoolLimits {
                max_slots: parallel_cores,
                track_memory: true,
                max_memory_gib: settings.local.max_memory_gib,
            },
            ExecutionMode::Remote => PoolLimits {
                max_slots: settings.remote.max_slots_per_user,
                track_memory: false,
                max_memory_gib: None,
            },
        };

        debug!(%mode, parallel_cores, ?limits, "executor configured");
        Ok(Self {
            mode,
            env,
            settings,
            parallel_cores,
            limits,
        })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn calc_dir(&self) -> &Path {
        self.env.calc_dir()
    }

    pub fn calc_bin(&self) -> &Path {
        self.env.calc_bin()
    }

    /// Core count multicore job classes use, and the value of the binary's
    /// `-c` flag.
    pub fn parallel_execution_cores(&self) -> u32 {
        self.parallel_cores
    }

    /// Pool capacity for a run of tasks created by this executor.
    pub fn pool_limits(&self) -> PoolLimits {
        self.limits
    }

    /// Slots a task of `class` requests in this mode.
    pub fn slots_for(&self, class: JobClass) -> u32 {
        JobProfile::for_class(class).slots(self.parallel_cores)
    }

    /// Create a process task for `class`.
    ///
    /// Local modes run `command` unchanged with stdout in `log` and stderr in
    /// `<log>.err`. Remote mode wraps it into a blocking submission that
    /// writes the same files remotely, so the output is not redirected here.
    pub fn create_task(
        &self,
        class: JobClass,
        name: impl Into<TaskName>,
        command: impl AsRef<str>,
        log: impl AsRef<Path>,
    ) -> Task {
        let name = name.into();
        let command = command.as_ref();
        let log = log.as_ref();
        let profile = JobProfile::for_class(class);
        let slots = profile.slots(self.parallel_cores);

        let (spec, request) = match self.mode {
            ExecutionMode::LocalFull | ExecutionMode::Local8 => (
                ProcessSpec {
                    command: command.to_string(),
                    stdout: Some(log.to_path_buf()),
                    stderr: Some(err_log(log)),
                    transient: Vec::new(),
                },
                ResourceRequest::new(slots, Some(profile.memory_gib)),
            ),
            ExecutionMode::Remote => {
                let submission = Submission {
                    remote: &self.settings.remote,
                    name: &name,
                    slots,
                    memory_gib: profile.memory_gib,
                    wall_hours: profile.wall_hours,
                    log,
                };
                (
                    ProcessSpec {
                        command: submission.wrap(command),
                        stdout: None,
                        stderr: None,
                        transient: Vec::new(),
                    },
                    ResourceRequest::new(slots, None),
                )
            }
        };

        let mut task = Task::process(name, spec, request);
        task.wall_hours = Some(profile.wall_hours);
        task
    }

    /// Create an in-process task: one slot, no memory.
    pub fn create_function_task(
        &self,
        name: impl Into<TaskName>,
        func: Arc<dyn TaskFunction>,
    ) -> Task {
        let memory = if self.limits.track_memory { Some(0) } else { None };
        Task::function(name, func, ResourceRequest::new(1, memory))
    }

    pub fn create_single_run_task(
        &self,
        name: impl Into<TaskName>,
        app: &Path,
        execution: &Path,
        system: &Path,
        stats: &Path,
        log: &Path,
    ) -> Task {
        let cmd = calc::single_run_command(self.calc_bin(), app, execution, system, stats);
        self.create_task(JobClass::SingleRun, name, cmd, log)
    }

    pub fn create_optimal_search_task(
        &self,
        name: impl Into<TaskName>,
        args: &SearchArgs<'_>,
        top_n: u32,
        log: &Path,
    ) -> Task {
        let cmd = calc::optimal_search_command(self.calc_bin(), args, self.parallel_cores, top_n);
        self.create_task(JobClass::OptimalSearch, name, cmd, log)
    }

    pub fn create_exhaustive_sweep_task(
        &self,
        name: impl Into<TaskName>,
        args: &SearchArgs<'_>,
        log: &Path,
    ) -> Task {
        let cmd = calc::exhaustive_sweep_command(self.calc_bin(), args, self.parallel_cores);
        self.create_task(JobClass::ExhaustiveSweep, name, cmd, log)
    }
}

/// `<log>.err`
pub fn err_log(log: &Path) -> PathBuf {
    let mut os = log.as_os_str().to_os_string();
    os.push(".err");
    PathBuf::from(os)
}

/// Cores available on this host; falls back to one core.
pub fn detect_host_cores() -> u32 {
    match std::thread::available_parallelism() {
        Ok(n) => u32::try_from(n.get()).unwrap_or(u32::MAX),
        Err(e) => {
            warn!(error = %e, "could not detect host cores; assuming 1");
            1
        }
    }
}
