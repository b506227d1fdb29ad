// src/engine/request.rs

//! Run requests.

use std::fmt;
use std::sync::Arc;

use crate::engine::TaskName;

/// Callback observing every successful response in a run.
pub type Observer<T> = Arc<dyn Fn(&str, &T) + Send + Sync>;

/// Explicit option record for [`Registry::run`](crate::dag::Registry::run).
///
/// - `dependencies`: the requested task names; their results reach the
///   completion in this order. May be empty.
/// - `context`: shared with every work function of this run.
/// - observers: notified of each `(task, result)` response.
pub struct RunRequest<T, C = ()> {
    pub dependencies: Vec<TaskName>,
    pub context: Arc<C>,
    observers: Vec<Observer<T>>,
}

impl<T, C: Default> RunRequest<T, C> {
    /// Request `dependencies` with a default context.
    pub fn new<I, S>(dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self::with_context(dependencies, C::default())
    }
}

impl<T, C> RunRequest<T, C> {
    pub fn with_context<I, S>(dependencies: I, context: C) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self::with_shared_context(dependencies, Arc::new(context))
    }

    pub fn with_shared_context<I, S>(dependencies: I, context: Arc<C>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            context,
            observers: Vec::new(),
        }
    }

    /// Observe every `(task, result)` response of this run.
    pub fn on_responded<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &T) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(f));
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<TaskName>, Arc<C>, Vec<Observer<T>>) {
        (self.dependencies, self.context, self.observers)
    }
}

impl<T, C> fmt::Debug for RunRequest<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunRequest")
            .field("dependencies", &self.dependencies)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
