// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum DagrunError {
    /// Missing work function, unresolvable task name, or duplicate registration.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A dependency cycle found before anything was dispatched.
    #[error("Circular dependency detected at task: {0}")]
    CircularDependency(TaskName),

    /// A task's completion handle was invoked more than once in one run.
    #[error("Completion reported more than once for task: {0}")]
    DuplicateCompletion(TaskName),

    /// A work function reported an error, returned `Err`, or panicked.
    #[error("Task '{task}' failed: {source}")]
    TaskError {
        task: TaskName,
        #[source]
        source: anyhow::Error,
    },

    #[error("Task '{task}' depends on unregistered task '{dependency}'")]
    UnknownDependency { task: TaskName, dependency: TaskName },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The process driver went away without reporting an outcome.
    #[error("Run aborted before completion: {0}")]
    Aborted(String),
}

impl DagrunError {
    /// Name of the task this error is attributed to, if any.
    pub fn task(&self) -> Option<&str> {
        match self {
            DagrunError::CircularDependency(task) | DagrunError::DuplicateCompletion(task) => {
                Some(task)
            }
            DagrunError::TaskError { task, .. } | DagrunError::UnknownDependency { task, .. } => {
                Some(task)
            }
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagrunError>;
