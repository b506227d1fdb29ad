// src/dag/task.rs

//! Immutable task templates.
//!
//! A [`Task`] is what the registry owns: a name, an ordered dependency list
//! and a work function. It carries no run state; every run works on a
//! [`TaskRun`](crate::dag::TaskRun) created from it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::debug;

use crate::engine::{Completion, TaskName, panic_message};
use crate::errors::{DagrunError, Result};

/// Reserved name of the synthetic task standing for a run request.
pub const EMITTER_NAME: &str = "(run)";

/// Signature every work function is erased to.
///
/// Arguments: the run context, one result per declared dependency (in
/// declared order) and the completion handle. Returning `Err` is treated
/// exactly like `done.fail(err)`.
pub type WorkFn<T, C> =
    dyn Fn(&Arc<C>, Vec<T>, Completion<T>) -> anyhow::Result<()> + Send + Sync;

/// A shareable work function plus the identifier of the `fn` item it was
/// built from, if there was one.
pub struct Work<T, C = ()> {
    func: Arc<WorkFn<T, C>>,
    identifier: Option<String>,
}

impl<T, C> Clone for Work<T, C> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            identifier: self.identifier.clone(),
        }
    }
}

impl<T, C> fmt::Debug for Work<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Work")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

impl<T, C> Work<T, C>
where
    T: Send + 'static,
    C: Send + Sync + 'static,
{
    /// Wrap a handle-style work function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Arc<C>, Vec<T>, Completion<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            identifier: identifier_of::<F>(),
            func: Arc::new(f),
        }
    }

    /// Wrap a synchronous function whose return value is the task result.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&C, Vec<T>) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let identifier = identifier_of::<F>();
        let func = move |ctx: &Arc<C>, args: Vec<T>, done: Completion<T>| -> anyhow::Result<()> {
            let value = f(ctx.as_ref(), args)?;
            done.ok(value);
            Ok(())
        };
        Self {
            func: Arc::new(func),
            identifier,
        }
    }

    /// Wrap an async function. The future is spawned onto the Tokio runtime
    /// and its output completes the task; a panic inside it fails the task.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<C>, Vec<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let identifier = identifier_of::<F>();
        let func = move |ctx: &Arc<C>, args: Vec<T>, done: Completion<T>| -> anyhow::Result<()> {
            let work = tokio::spawn(f(Arc::clone(ctx), args));
            tokio::spawn(async move {
                let outcome = match work.await {
                    Ok(outcome) => outcome,
                    Err(err) if err.is_panic() => Err(anyhow!(
                        "task panicked: {}",
                        panic_message(err.into_panic().as_ref())
                    )),
                    Err(err) => Err(anyhow!("task cancelled: {err}")),
                };
                done.done(outcome);
            });
            Ok(())
        };
        Self {
            func: Arc::new(func),
            identifier,
        }
    }
}

impl<T, C> Work<T, C> {
    /// Identifier of the underlying `fn` item; `None` for closures.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub(crate) fn call(
        &self,
        ctx: &Arc<C>,
        args: Vec<T>,
        done: Completion<T>,
    ) -> anyhow::Result<()> {
        (self.func)(ctx, args, done)
    }
}

/// Identifier of a function type, if it is a plain named `fn` item.
///
/// Closures, trait objects, pointers and anything ending in generic
/// arguments have none: `Box<fetch>` and `fetch<i32>` look alike here, so
/// neither is trusted.
fn identifier_of<F>() -> Option<String> {
    let full = std::any::type_name::<F>();
    if full.contains("{{closure}}")
        || full.contains("dyn ")
        || full.starts_with("fn(")
        || full.starts_with('&')
        || full.ends_with('>')
    {
        return None;
    }

    let ident = full.rsplit("::").next()?;
    let mut chars = ident.chars();
    let head = chars.next()?;
    let valid = (head.is_alphabetic() || head == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');

    valid.then(|| ident.to_string())
}

/// Explicit option record used to create a [`Task`].
///
/// - `name`: optional; falls back to the work function's identifier.
/// - `dependencies`: defaults to none.
/// - `work`: required.
pub struct TaskSpec<T, C = ()> {
    pub name: Option<TaskName>,
    pub dependencies: Vec<TaskName>,
    pub work: Option<Work<T, C>>,
}

impl<T, C> Default for TaskSpec<T, C> {
    fn default() -> Self {
        Self {
            name: None,
            dependencies: Vec::new(),
            work: None,
        }
    }
}

impl<T, C> TaskSpec<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<TaskName>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn work(mut self, work: Work<T, C>) -> Self {
        self.work = Some(work);
        self
    }

    /// Validate the record and turn it into a [`Task`].
    pub fn build(self) -> Result<Task<T, C>> {
        Task::new(self)
    }
}

/// Immutable task template.
pub struct Task<T, C = ()> {
    name: TaskName,
    dependencies: Arc<[TaskName]>,
    work: Work<T, C>,
}

impl<T, C> Clone for Task<T, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dependencies: Arc::clone(&self.dependencies),
            work: self.work.clone(),
        }
    }
}

impl<T, C> fmt::Debug for Task<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl<T, C> Task<T, C> {
    /// Create a task from its option record.
    ///
    /// Name precedence: explicit name, then the work function's identifier.
    pub fn new(spec: TaskSpec<T, C>) -> Result<Self> {
        let work = spec.work.ok_or_else(|| {
            DagrunError::ValidationError(match &spec.name {
                Some(name) => format!("task '{name}' has no work function"),
                None => "task has no work function".to_string(),
            })
        })?;

        let name = spec
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| work.identifier().map(str::to_string))
            .ok_or_else(|| {
                DagrunError::ValidationError(
                    "name required: work function has no identifier".to_string(),
                )
            })?;

        debug!(task = %name, deps = ?spec.dependencies, "created task");

        Ok(Self {
            name,
            dependencies: spec.dependencies.into(),
            work,
        })
    }

    /// The synthetic task standing for a run request.
    pub(crate) fn emitter(dependencies: Vec<TaskName>) -> Self
    where
        T: Send + 'static,
        C: Send + Sync + 'static,
    {
        Self {
            name: EMITTER_NAME.to_string(),
            dependencies: dependencies.into(),
            work: Work::new(|_: &Arc<C>, _: Vec<T>, _: Completion<T>| Ok(())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[TaskName] {
        &self.dependencies
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }

    pub fn work(&self) -> &Work<T, C> {
        &self.work
    }

    pub(crate) fn shared_dependencies(&self) -> Arc<[TaskName]> {
        Arc::clone(&self.dependencies)
    }
}

/// What [`Registry::register`](crate::dag::Registry::register) accepts:
/// an already built task or an option record to build one from.
pub enum Registration<T, C = ()> {
    Task(Task<T, C>),
    Spec(TaskSpec<T, C>),
}

impl<T, C> From<Task<T, C>> for Registration<T, C> {
    fn from(task: Task<T, C>) -> Self {
        Registration::Task(task)
    }
}

impl<T, C> From<TaskSpec<T, C>> for Registration<T, C> {
    fn from(spec: TaskSpec<T, C>) -> Self {
        Registration::Spec(spec)
    }
}
