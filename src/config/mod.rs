// src/config/mod.rs

//! Manifest loading and the execution environment.
//!
//! - [`model`] holds the serde types for `Jobdag.toml`.
//! - [`validate`] turns a `RawManifest` into a checked `Manifest`.
//! - [`loader`] reads a manifest from disk.
//! - [`environment`] validates the calculation base directory.

pub mod environment;
pub mod loader;
pub mod model;
pub mod validate;

pub use environment::CalcEnvironment;
pub use loader::{default_manifest_path, load_and_validate, load_from_path};
pub use model::{
    ConditionConfig, ItemConfig, LocalSection, Manifest, RawManifest, RemoteSection, RunSection,
    TaskConfig,
};
