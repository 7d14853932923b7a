// src/adapter/calc.rs

//! Command lines for the simulation binary's subcommands.

use std::path::Path;

/// Arguments shared by the search and sweep subcommands.
#[derive(Debug, Clone)]
pub struct SearchArgs<'a> {
    pub app: &'a Path,
    pub num_procs: u32,
    pub max_batch_size: u32,
    pub datatype: &'a str,
    pub system: &'a Path,
    pub output: &'a Path,
    pub fused_activation: bool,
}

impl SearchArgs<'_> {
    fn positional(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.app.display(),
            self.num_procs,
            self.max_batch_size,
            self.datatype,
            self.system.display(),
            self.output.display(),
        )
    }
}

/// `calculon llm <app> <exe> <sys> <stats>`
pub fn single_run_command(
    calc_bin: &Path,
    app: &Path,
    execution: &Path,
    system: &Path,
    stats: &Path,
) -> String {
    format!(
        "{} llm {} {} {} {}",
        calc_bin.display(),
        app.display(),
        execution.display(),
        system.display(),
        stats.display(),
    )
}

/// `calculon llm-optimal-execution ... -c <cores> -n -m -f <fused> -t <top_n>`
pub fn optimal_search_command(
    calc_bin: &Path,
    args: &SearchArgs<'_>,
    cores: u32,
    top_n: u32,
) -> String {
    format!(
        "{} llm-optimal-execution {} -c {} -n -m -f {} -t {}",
        calc_bin.display(),
        args.positional(),
        cores,
        args.fused_activation,
        top_n,
    )
}

/// `calculon llm-all-executions ... -c <cores> -n -f <fused>`
pub fn exhaustive_sweep_command(calc_bin: &Path, args: &SearchArgs<'_>, cores: u32) -> String {
    format!(
        "{} llm-all-executions {} -c {} -n -f {}",
        calc_bin.display(),
        args.positional(),
        cores,
        args.fused_activation,
    )
}
