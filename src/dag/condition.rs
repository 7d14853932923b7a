// src/dag/condition.rs

//! File-modification staleness conditions.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::fs::FileSystem;

/// A declared input artifact that does not exist when the condition is
/// evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput(pub PathBuf);

/// Staleness predicate over declared input and output artifacts.
///
/// A condition is stale (the task must run) when:
/// - it declares no outputs (nothing proves a previous run happened), or
/// - any output is missing, or
/// - any input was modified strictly after any output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
}

impl Condition {
    pub fn new<I, O, P, Q>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = P>,
        O: IntoIterator<Item = Q>,
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Evaluate the condition against the current state of `fs`.
    ///
    /// Inputs are checked first: a missing input is reported as
    /// [`MissingInput`] regardless of the outputs.
    pub fn is_stale(&self, fs: &dyn FileSystem) -> Result<bool, MissingInput> {
        let mut newest_input: Option<SystemTime> = None;
        for input in &self.inputs {
            let modified = mtime(fs, input).ok_or_else(|| MissingInput(input.clone()))?;
            newest_input = newest_input.max(Some(modified));
        }

        if self.outputs.is_empty() {
            return Ok(true);
        }

        let mut oldest_output: Option<SystemTime> = None;
        for output in &self.outputs {
            match mtime(fs, output) {
                Some(modified) => {
                    oldest_output = Some(oldest_output.map_or(modified, |o| o.min(modified)));
                }
                None => return Ok(true),
            }
        }

        Ok(match (newest_input, oldest_output) {
            (Some(input), Some(output)) => input > output,
            _ => false,
        })
    }
}

/// A task is stale if any of its conditions is stale. A task without
/// conditions always runs.
pub fn any_stale(conditions: &[Condition], fs: &dyn FileSystem) -> Result<bool, MissingInput> {
    if conditions.is_empty() {
        return Ok(true);
    }
    for condition in conditions {
        if condition.is_stale(fs)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn mtime(fs: &dyn FileSystem, path: &Path) -> Option<SystemTime> {
    if !fs.exists(path) {
        return None;
    }
    fs.modified(path).ok()
}
