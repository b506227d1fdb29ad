// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::EngineOptions;
use crate::types::LogLevel;

/// Graph manifest as read from a TOML file, before validation.
///
/// ```toml
/// [engine]
/// log_level = "debug"
///
/// [task.d]
///
/// [task.b]
/// after = ["d"]
/// ```
///
/// Work functions cannot live in TOML; they are bound by task name when the
/// registry is built (see [`Registry::from_config`](crate::dag::Registry::from_config)).
#[derive(Debug, Clone, Deserialize)]
pub struct RawGraphConfig {
    #[serde(default)]
    pub engine: EngineSection,

    /// Keys are the task names.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated graph manifest. Only obtainable through
/// `GraphConfig::try_from(RawGraphConfig)`.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub engine: EngineSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl GraphConfig {
    pub(crate) fn new_unchecked(engine: EngineSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { engine, task }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Level for [`crate::logging::init_logging`]; `None` defers to
    /// `DAGRUN_LOG`.
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Yield to the Tokio scheduler before each dispatch batch.
    #[serde(default = "default_yield_between_dispatches")]
    pub yield_between_dispatches: bool,
}

fn default_yield_between_dispatches() -> bool {
    true
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            log_level: None,
            yield_between_dispatches: default_yield_between_dispatches(),
        }
    }
}

impl EngineSection {
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            yield_between_dispatches: self.yield_between_dispatches,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Dependency names; their results reach the work function in this order.
    #[serde(default)]
    pub after: Vec<String>,
}
