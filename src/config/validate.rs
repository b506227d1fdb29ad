// src/config/validate.rs

use crate::config::model::{GraphConfig, RawGraphConfig};
use crate::dag::graph::topological_order;
use crate::errors::{DagrunError, Result};

impl TryFrom<RawGraphConfig> for GraphConfig {
    type Error = DagrunError;

    fn try_from(raw: RawGraphConfig) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(GraphConfig::new_unchecked(raw.engine, raw.task))
    }
}

/// Semantic checks on a parsed manifest.
///
/// Bad `after` entries are `ConfigError`s pointing at the manifest; a cycle
/// is a `CircularDependency`.
pub fn validate_config(cfg: &RawGraphConfig) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DagrunError::ConfigError(
            "manifest must contain at least one [task.<name>] section".to_string(),
        ));
    }

    if let Some((name, _)) = cfg
        .task
        .iter()
        .find(|(name, tc)| tc.after.iter().any(|dep| dep == *name))
    {
        return Err(DagrunError::ConfigError(format!(
            "task '{name}' lists itself in `after`"
        )));
    }

    let nodes = cfg
        .task
        .iter()
        .map(|(name, tc)| (name.as_str(), tc.after.as_slice()));

    match topological_order(nodes) {
        Ok(_) => Ok(()),
        Err(DagrunError::UnknownDependency { task, dependency }) => Err(DagrunError::ConfigError(
            format!("task '{task}' has unknown dependency '{dependency}' in `after`"),
        )),
        Err(err) => Err(err),
    }
}
