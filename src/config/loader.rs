// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{GraphConfig, RawGraphConfig};
use crate::errors::Result;

/// Load a graph manifest from `path` without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawGraphConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Parse a graph manifest from TOML text without semantic validation.
pub fn load_from_str(contents: &str) -> Result<RawGraphConfig> {
    let config: RawGraphConfig = toml::from_str(contents)?;
    Ok(config)
}

/// Load a graph manifest and validate it:
/// - at least one task,
/// - every `after` entry names a declared task, and no task names itself,
/// - the graph is acyclic.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<GraphConfig> {
    let raw = load_from_path(path)?;
    GraphConfig::try_from(raw)
}
