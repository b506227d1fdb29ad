// src/dag/task_run.rs

//! Per-run task state.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::dag::Task;
use crate::engine::TaskName;
use crate::errors::{DagrunError, Result};

/// Lifecycle of one task within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Still waiting on at least one dependency.
    Pending,
    /// Every dependency has been embraced; eligible for dispatch.
    Fulfilled,
    /// Work function invoked; waiting on the completion handle.
    Dispatched,
    /// Completion handle reported a result.
    Responded,
    /// Completion handle reported an error, or the work function failed.
    Errored,
}

impl TaskState {
    /// Whether the completion handle has already been used.
    pub fn is_completed(self) -> bool {
        matches!(self, TaskState::Responded | TaskState::Errored)
    }
}

/// Outcome of [`TaskRun::embrace_dependency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embrace {
    /// The producer is not a dependency of this task.
    Ignored,
    /// Result stored; other dependencies are still outstanding.
    Waiting,
    /// Result stored and this was the last outstanding dependency. Reported
    /// exactly once per run.
    Fulfilled,
}

/// A task's run-scoped clone: shares the template's name and dependencies,
/// owns its own `requirements` and `results`.
#[derive(Debug)]
pub struct TaskRun<T> {
    name: TaskName,
    dependencies: Arc<[TaskName]>,
    /// Indices into `dependencies` that have not been resolved yet.
    requirements: Vec<usize>,
    results: Vec<Option<T>>,
    state: TaskState,
}

impl<T> TaskRun<T> {
    /// Clone `task` with fresh run state.
    pub fn new<C>(task: &Task<T, C>) -> Self {
        let mut run = Self {
            name: task.name().to_string(),
            dependencies: task.shared_dependencies(),
            requirements: Vec::new(),
            results: Vec::new(),
            state: TaskState::Pending,
        };
        run.reset();
        run
    }

    /// Reinitialise run state: every dependency outstanding, no results.
    pub fn reset(&mut self) {
        self.requirements = (0..self.dependencies.len()).collect();
        self.results = std::iter::repeat_with(|| None)
            .take(self.dependencies.len())
            .collect();
        self.state = if self.requirements.is_empty() {
            TaskState::Fulfilled
        } else {
            TaskState::Pending
        };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[TaskName] {
        &self.dependencies
    }

    /// Dependency names not resolved yet, in declared order.
    pub fn requirements(&self) -> Vec<&str> {
        self.requirements
            .iter()
            .map(|&i| self.dependencies[i].as_str())
            .collect()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Record the result published by dependency `dep`.
    ///
    /// A name listed twice in `dependencies` must be embraced twice; each
    /// call fills the first unresolved slot with that name.
    pub fn embrace_dependency(&mut self, dep: &str, result: T) -> Result<Embrace> {
        if !self.dependencies.iter().any(|d| d == dep) {
            warn!(task = %self.name, dep = %dep, "task does not depend on producer; ignoring result");
            return Ok(Embrace::Ignored);
        }

        let Some(pos) = self
            .requirements
            .iter()
            .position(|&i| self.dependencies[i] == dep)
        else {
            return Err(DagrunError::DuplicateCompletion(dep.to_string()));
        };

        let slot = self.requirements.remove(pos);
        self.results[slot] = Some(result);

        if self.requirements.is_empty() {
            debug!(task = %self.name, "all dependencies embraced; task fulfilled");
            self.state = TaskState::Fulfilled;
            Ok(Embrace::Fulfilled)
        } else {
            Ok(Embrace::Waiting)
        }
    }

    /// Hand the collected results over for dispatch and mark the task
    /// dispatched. Returns `None` unless the task is fulfilled and not yet
    /// dispatched.
    pub fn dispatch(&mut self) -> Option<Vec<T>> {
        if self.state != TaskState::Fulfilled || !self.is_fulfilled() {
            return None;
        }
        self.state = TaskState::Dispatched;
        Some(self.results.drain(..).flatten().collect())
    }

    /// Record a successful response.
    pub fn respond(&mut self) -> Result<()> {
        self.complete(TaskState::Responded)
    }

    /// Record a failed response.
    pub fn error(&mut self) -> Result<()> {
        self.complete(TaskState::Errored)
    }

    fn complete(&mut self, next: TaskState) -> Result<()> {
        if self.state.is_completed() {
            return Err(DagrunError::DuplicateCompletion(self.name.clone()));
        }
        self.state = next;
        Ok(())
    }
}
