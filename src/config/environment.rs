// src/config/environment.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{JobdagError, Result};
use crate::fs::FileSystem;

/// Location of the simulation binary relative to the base directory.
pub const CALC_BIN_RELATIVE: &str = "bin/calculon";

/// The calculation base directory: model and system definitions plus the
/// simulation binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcEnvironment {
    calc_dir: PathBuf,
    calc_bin: PathBuf,
}

impl CalcEnvironment {
    /// Validate `calc_dir` eagerly: the directory and `bin/calculon` must
    /// both exist.
    pub fn discover(calc_dir: impl AsRef<Path>, fs: &dyn FileSystem) -> Result<Self> {
        let calc_dir = calc_dir.as_ref().to_path_buf();
        if !fs.is_dir(&calc_dir) {
            return Err(JobdagError::ConfigError(format!(
                "calculation directory '{}' does not exist (set CALC or --calc-dir)",
                calc_dir.display()
            )));
        }

        let calc_bin = calc_dir.join(CALC_BIN_RELATIVE);
        if !fs.is_file(&calc_bin) {
            return Err(JobdagError::ConfigError(format!(
                "simulation binary '{}' does not exist",
                calc_bin.display()
            )));
        }

        debug!(calc_dir = %calc_dir.display(), "calculation environment found");
        Ok(Self { calc_dir, calc_bin })
    }

    pub fn calc_dir(&self) -> &Path {
        &self.calc_dir
    }

    pub fn calc_bin(&self) -> &Path {
        &self.calc_bin
    }
}
