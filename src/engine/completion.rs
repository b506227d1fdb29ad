// src/engine/completion.rs

//! The completion handle passed to every work function.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::{ProcessEvent, TaskName};

/// Reports the outcome of one dispatched task back to its process.
///
/// Every method takes `&self`: calling the handle more than once is
/// possible, and the process answers it with
/// [`DagrunError::DuplicateCompletion`](crate::errors::DagrunError::DuplicateCompletion).
/// Calls made after the run has finished are discarded. Dropping every
/// clone of the handle without reporting fails the task.
pub struct Completion<T> {
    inner: Arc<Handle<T>>,
}

struct Handle<T> {
    task: TaskName,
    slot: usize,
    tx: mpsc::UnboundedSender<ProcessEvent<T>>,
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        // Sent after any report made through this handle.
        let _ = self.tx.send(ProcessEvent::Released { slot: self.slot });
    }
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("task", &self.inner.task)
            .field("slot", &self.inner.slot)
            .finish_non_exhaustive()
    }
}

impl<T> Completion<T> {
    pub(crate) fn new(
        task: TaskName,
        slot: usize,
        tx: mpsc::UnboundedSender<ProcessEvent<T>>,
    ) -> Self {
        Self {
            inner: Arc::new(Handle { task, slot, tx }),
        }
    }

    /// Name of the task this handle belongs to.
    pub fn task(&self) -> &str {
        &self.inner.task
    }

    /// Report a result.
    pub fn ok(&self, result: T) {
        self.send(ProcessEvent::Responded {
            slot: self.inner.slot,
            result,
        });
    }

    /// Report a failure; terminates the run.
    pub fn fail(&self, error: impl Into<anyhow::Error>) {
        self.send(ProcessEvent::Failed {
            slot: self.inner.slot,
            error: error.into(),
        });
    }

    /// Report either outcome.
    pub fn done(&self, outcome: anyhow::Result<T>) {
        match outcome {
            Ok(result) => self.ok(result),
            Err(error) => self.fail(error),
        }
    }

    fn send(&self, event: ProcessEvent<T>) {
        if self.inner.tx.send(event).is_err() {
            debug!(task = %self.inner.task, "run already finished; discarding response");
        }
    }
}
