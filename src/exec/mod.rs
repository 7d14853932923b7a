// src/exec/mod.rs

//! Task execution layer.
//!
//! This module is responsible for actually running launched tasks, using
//! `tokio::process::Command` for processes, and reporting back to the
//! runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the background loop that manages task processes.
//! - [`task_runner`] runs individual processes (with stdout/stderr redirected
//!   to their log files) and function tasks.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` used in production, which tests can replace with
//!   a fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use task_runner::ProcessOptions;
