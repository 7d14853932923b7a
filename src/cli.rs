// src/cli.rs

//! CLI argument parsing using `clap`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};

use crate::config::default_manifest_path;
use crate::errors::JobdagError;
use crate::types::{ExecutionMode, FailureMode};

/// Command-line arguments for `jobdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobdag",
    version,
    about = "Run simulation jobs as a dependency graph, locally or on a batch queue.",
    long_about = None
)]
pub struct CliArgs {
    /// Execution mode: `list`, `local-full`, `local-8` or `remote`.
    #[arg(value_name = "MODE")]
    pub mode: ModeArg,

    /// Work items to run (see `list`).
    #[arg(value_name = "ITEM")]
    pub items: Vec<String>,

    /// Remove item outputs before creating tasks.
    #[arg(long)]
    pub clean: bool,

    /// Create and validate tasks, print them, but don't run anything.
    #[arg(long)]
    pub skip_run: bool,

    /// Run a small synthetic graph to test the execution backend.
    #[arg(long)]
    pub test_tasking: bool,

    /// Verbose output (debug logging unless `--log-level` is given).
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the manifest (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_manifest_path())]
    pub manifest: PathBuf,

    /// Calculation base directory holding `bin/calculon`.
    #[arg(long, value_name = "PATH", env = "CALC", default_value = "./calc_proj")]
    pub calc_dir: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `-v`, `JOBDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override the manifest's failure mode (`passive` or `abort`).
    #[arg(long, value_name = "MODE")]
    pub failure_mode: Option<FailureMode>,
}

/// Positional mode argument: list items, or run in an execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    List,
    Execute(ExecutionMode),
}

impl FromStr for ModeArg {
    type Err = JobdagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("list") {
            return Ok(ModeArg::List);
        }
        s.parse().map(ModeArg::Execute)
    }
}

impl fmt::Display for ModeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeArg::List => f.write_str("list"),
            ModeArg::Execute(mode) => mode.fmt(f),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_items_and_flags() {
        let args = CliArgs::try_parse_from([
            "jobdag", "local-8", "fig2", "tab2", "--clean", "--failure-mode", "abort",
        ])
        .unwrap();
        assert_eq!(args.mode, ModeArg::Execute(ExecutionMode::Local8));
        assert_eq!(args.items, vec!["fig2", "tab2"]);
        assert!(args.clean);
        assert!(!args.skip_run);
        assert_eq!(args.failure_mode, Some(FailureMode::Abort));
        assert_eq!(args.manifest, PathBuf::from("Jobdag.toml"));
    }

    #[test]
    fn list_is_a_mode() {
        let args = CliArgs::try_parse_from(["jobdag", "list"]).unwrap();
        assert_eq!(args.mode, ModeArg::List);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(CliArgs::try_parse_from(["jobdag", "cloud"]).is_err());
    }
}
