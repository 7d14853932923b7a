// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Graph error: {0}")]
    GraphError(#[from] GraphError),

    #[error("Precondition failed for task '{task}': input {path:?} does not exist")]
    Precondition { task: String, path: PathBuf },

    #[error("Unknown work item: {0}")]
    UnknownItem(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Structural problems with the task graph, detected before any task runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("cycle detected in task DAG involving task '{0}'")]
    Cycle(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobdagError>;
