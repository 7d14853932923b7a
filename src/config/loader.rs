// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{Manifest, RawManifest};
use crate::errors::Result;

/// Load a manifest from a given path and return the raw `RawManifest`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (dependency resolution, cycles, capacities). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let manifest: RawManifest = toml::from_str(&contents)?;

    Ok(manifest)
}

/// Load a manifest from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` default functions).
/// - Checks for:
///   - items without tasks,
///   - unknown or self-referencing `after` entries,
///   - dependency cycles,
///   - inconsistent `[local]` / `[remote]` capacities.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(&path)?;
    let manifest = Manifest::try_from(raw)?;
    Ok(manifest)
}

/// `Jobdag.toml` in the current working directory.
pub fn default_manifest_path() -> PathBuf {
    PathBuf::from("Jobdag.toml")
}
