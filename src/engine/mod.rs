// src/engine/mod.rs

//! Execution engine for dagrun.
//!
//! - [`process`] holds the per-run driver: it owns the cloned tasks, routes
//!   results from producers to dependents and dispatches fulfilled tasks.
//! - [`completion`] is the handle a work function reports its outcome with.
//! - [`request`] is the option record describing one run.
//!
//! Completion handles talk to their process through [`ProcessEvent`]s on an
//! unbounded channel; the process is the sole consumer, so all state
//! transitions of a run happen on one Tokio task.

use std::any::Any;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Events flowing from completion handles into their process.
#[derive(Debug)]
pub enum ProcessEvent<T> {
    /// The task in `slot` reported a result.
    Responded { slot: usize, result: T },
    /// The task in `slot` reported, returned or panicked with an error.
    Failed { slot: usize, error: anyhow::Error },
    /// The last clone of the task's completion handle was dropped.
    Released { slot: usize },
}

/// Options shared by every process spawned from one registry.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Yield to the Tokio scheduler before each dispatch batch.
    pub yield_between_dispatches: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            yield_between_dispatches: true,
        }
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub mod completion;
pub mod process;
pub mod request;

pub use completion::Completion;
pub use process::{Process, ProcessHandle, Sink};
pub use request::{Observer, RunRequest};
