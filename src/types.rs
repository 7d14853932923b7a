use std::fmt;
use std::str::FromStr;

use crate::errors::JobdagError;

/// Where and how tasks are executed.
///
/// - `LocalFull`: the current host, using every detected core.
/// - `Local8`: the current host, capped at 8 cores.
/// - `Remote`: each process is wrapped into a blocking batch-queue submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    LocalFull,
    Local8,
    Remote,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 3] = [
        ExecutionMode::LocalFull,
        ExecutionMode::Local8,
        ExecutionMode::Remote,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::LocalFull => "local-full",
            ExecutionMode::Local8 => "local-8",
            ExecutionMode::Remote => "remote",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = JobdagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local-full" | "local_full" => Ok(ExecutionMode::LocalFull),
            "local-8" | "local_8" => Ok(ExecutionMode::Local8),
            "remote" | "nvlsf" => Ok(ExecutionMode::Remote),
            other => Err(JobdagError::ConfigError(format!(
                "invalid execution mode: {other} (expected \"local-full\", \"local-8\" or \"remote\")"
            ))),
        }
    }
}

/// Abstract resource profile of a process task.
///
/// Manifests name the class as a string; it is parsed with [`FromStr`] so
/// the same names and legacy aliases are accepted everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobClass {
    /// One simulation run.
    SingleRun,
    /// Multicore search for the best execution strategy.
    OptimalSearch,
    /// Multicore sweep listing every execution strategy.
    ExhaustiveSweep,
    /// Single-threaded helper (plotting, parsing, ...).
    MiscProcess,
}

impl JobClass {
    pub fn as_str(self) -> &'static str {
        match self {
            JobClass::SingleRun => "single-run",
            JobClass::OptimalSearch => "optimal-search",
            JobClass::ExhaustiveSweep => "exhaustive-sweep",
            JobClass::MiscProcess => "misc-process",
        }
    }
}

impl fmt::Display for JobClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobClass {
    type Err = JobdagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single-run" | "singleexecution" => Ok(JobClass::SingleRun),
            "optimal-search" | "optimalexecution" => Ok(JobClass::OptimalSearch),
            "exhaustive-sweep" | "allexecutions" => Ok(JobClass::ExhaustiveSweep),
            "misc-process" | "misc" | "miscprocess" => Ok(JobClass::MiscProcess),
            other => Err(JobdagError::ConfigError(format!(
                "invalid job class: {other} (expected \"single-run\", \"optimal-search\", \"exhaustive-sweep\" or \"misc-process\")"
            ))),
        }
    }
}

/// What happens to the rest of the run when a task fails.
///
/// - `Passive`: only the failed task's transitive dependents are blocked;
///   unrelated branches keep running to completion.
/// - `Abort`: no further task is launched after the first failure. Tasks that
///   are already running are allowed to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    #[default]
    Passive,
    Abort,
}

impl FailureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureMode::Passive => "passive",
            FailureMode::Abort => "abort",
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureMode {
    type Err = JobdagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passive" | "passive_fail" => Ok(FailureMode::Passive),
            "abort" => Ok(FailureMode::Abort),
            other => Err(JobdagError::ConfigError(format!(
                "invalid failure mode: {other} (expected \"passive\" or \"abort\")"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_names() {
        assert_eq!("local_full".parse::<ExecutionMode>().unwrap(), ExecutionMode::LocalFull);
        assert_eq!("nvlsf".parse::<ExecutionMode>().unwrap(), ExecutionMode::Remote);
        assert_eq!("AllExecutions".parse::<JobClass>().unwrap(), JobClass::ExhaustiveSweep);
        assert_eq!("passive_fail".parse::<FailureMode>().unwrap(), FailureMode::Passive);
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        assert!(matches!(
            "cluster".parse::<ExecutionMode>(),
            Err(JobdagError::ConfigError(_))
        ));
        assert!(matches!(
            "huge".parse::<JobClass>(),
            Err(JobdagError::ConfigError(_))
        ));
    }

    #[test]
    fn failure_mode_defaults_to_passive() {
        assert_eq!(FailureMode::default(), FailureMode::Passive);
        assert_eq!(FailureMode::default().to_string(), "passive");
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for mode in ExecutionMode::ALL {
            assert_eq!(mode.to_string().parse::<ExecutionMode>().unwrap(), mode);
        }
    }
}
