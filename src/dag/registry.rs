// src/dag/registry.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::model::GraphConfig;
use crate::dag::graph::topological_order;
use crate::dag::task::{EMITTER_NAME, Registration, Task, TaskSpec, Work};
use crate::engine::process::ProcessOptions;
use crate::engine::{EngineOptions, Process, ProcessHandle, RunRequest, TaskName};
use crate::errors::{DagrunError, Result};

/// Work functions bound by task name, used with [`Registry::from_config`].
pub struct WorkTable<T, C = ()> {
    works: HashMap<TaskName, Work<T, C>>,
}

impl<T, C> Default for WorkTable<T, C> {
    fn default() -> Self {
        Self {
            works: HashMap::new(),
        }
    }
}

impl<T, C> WorkTable<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<TaskName>, work: Work<T, C>) -> Self {
        self.works.insert(name.into(), work);
        self
    }
}

/// The durable collection of uniquely named task templates.
///
/// Templates are never mutated by a run: [`Registry::run`] clones the
/// required subset into a fresh [`Process`], so any number of runs may share
/// one registry.
pub struct Registry<T, C = ()> {
    /// Insertion-ordered templates.
    tasks: Vec<Task<T, C>>,
    index: HashMap<TaskName, usize>,
    engine: EngineOptions,
    run_counter: AtomicU64,
}

impl<T, C> Default for Registry<T, C> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            index: HashMap::new(),
            engine: EngineOptions::default(),
            run_counter: AtomicU64::new(0),
        }
    }
}

impl<T, C> std::fmt::Debug for Registry<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tasks", &self.tasks)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<T, C> Registry<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tasks.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task<T, C>>) -> Result<Self> {
        let mut registry = Self::new();
        for task in tasks {
            registry.add_task(task)?;
        }
        Ok(registry)
    }

    /// Build a registry from a validated graph manifest, taking each task's
    /// work from `works`.
    pub fn from_config(cfg: &GraphConfig, works: WorkTable<T, C>) -> Result<Self> {
        let mut works = works.works;
        let mut registry = Self::new().with_engine_options(cfg.engine.options());

        for (name, tc) in cfg.task.iter() {
            let work = works.remove(name).ok_or_else(|| {
                DagrunError::ValidationError(format!("no work bound for task '{name}'"))
            })?;
            registry.register(
                TaskSpec::new()
                    .named(name.clone())
                    .after(tc.after.iter().cloned())
                    .work(work),
            )?;
        }

        for name in works.keys() {
            warn!(task = %name, "work bound for a task the manifest does not declare; ignoring");
        }

        Ok(registry)
    }

    pub fn with_engine_options(mut self, engine: EngineOptions) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine_options(&self) -> EngineOptions {
        self.engine
    }

    /// Register a task or build one from its option record first.
    pub fn register(&mut self, registration: impl Into<Registration<T, C>>) -> Result<()> {
        let task = match registration.into() {
            Registration::Task(task) => task,
            Registration::Spec(spec) => Self::make_task(spec)?,
        };
        self.add_task(task)
    }

    /// Normalise an option record into a task.
    pub fn make_task(spec: TaskSpec<T, C>) -> Result<Task<T, C>> {
        Task::new(spec)
    }

    pub fn add_task(&mut self, task: Task<T, C>) -> Result<()> {
        let name = task.name();
        if name.is_empty() {
            return Err(DagrunError::ValidationError(
                "cannot register unnamed tasks".to_string(),
            ));
        }
        if name == EMITTER_NAME {
            return Err(DagrunError::ValidationError(format!(
                "task name '{EMITTER_NAME}' is reserved"
            )));
        }
        if self.index.contains_key(name) {
            return Err(DagrunError::ValidationError(format!(
                "task already registered: {name}"
            )));
        }

        debug!(task = %name, deps = ?task.dependencies(), "registered task");
        self.index.insert(name.to_string(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    pub fn task_by_name(&self, name: &str) -> Option<&Task<T, C>> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    /// Registered templates in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task<T, C>> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Immediate dependencies of `task`, in declared order. Names that were
    /// never registered yield `None`.
    pub fn dependency_list(&self, task: &Task<T, C>) -> Vec<Option<&Task<T, C>>> {
        task.dependencies()
            .iter()
            .map(|name| self.task_by_name(name))
            .collect()
    }

    /// Transitive dependencies of `task`, each listed once, in no
    /// guaranteed order.
    ///
    /// Fails on the first dependency name that was never registered.
    pub fn dependency_closure(&self, task: &Task<T, C>) -> Result<Vec<&Task<T, C>>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut closure = Vec::new();
        let mut stack: Vec<(&str, &str)> = task
            .dependencies()
            .iter()
            .rev()
            .map(|dep| (task.name(), dep.as_str()))
            .collect();

        while let Some((dependent, name)) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            let dep = self
                .task_by_name(name)
                .ok_or_else(|| DagrunError::UnknownDependency {
                    task: dependent.to_string(),
                    dependency: name.to_string(),
                })?;

            closure.push(dep);
            stack.extend(
                dep.dependencies()
                    .iter()
                    .rev()
                    .map(|d| (dep.name(), d.as_str())),
            );
        }

        Ok(closure)
    }

    /// Depth-first search for a dependency cycle reachable from `task`.
    ///
    /// Fails with the name of the first task found again on the current
    /// path. Unregistered names end a branch; they are reported when the
    /// closure is computed.
    pub fn detect_cycle(&self, task: &Task<T, C>) -> Result<()> {
        // Current path with the index of the next dependency to visit.
        let mut path: Vec<(&Task<T, C>, usize)> = vec![(task, 0)];
        let mut on_path: HashSet<&str> = HashSet::from([task.name()]);
        let mut cleared: HashSet<&str> = HashSet::new();

        while let Some(&mut (current, ref mut next)) = path.last_mut() {
            let Some(dep_name) = current.dependencies().get(*next) else {
                on_path.remove(current.name());
                cleared.insert(current.name());
                path.pop();
                continue;
            };
            *next += 1;

            let Some(dep) = self.task_by_name(dep_name) else {
                continue;
            };
            if on_path.contains(dep.name()) {
                return Err(DagrunError::CircularDependency(dep.name().to_string()));
            }
            if cleared.contains(dep.name()) {
                continue;
            }

            on_path.insert(dep.name());
            path.push((dep, 0));
        }

        Ok(())
    }

    /// Whole-registry check: every dependency is registered and the graph
    /// is acyclic.
    pub fn validate(&self) -> Result<()> {
        topological_order(self.tasks.iter().map(|t| (t.name(), t.dependencies())))?;
        Ok(())
    }
}

impl<T, C> Registry<T, C>
where
    T: Clone + Send + 'static,
    C: Send + Sync + 'static,
{
    /// Start a run resolving `request.dependencies`.
    ///
    /// `completion` is called exactly once: with the requested results in
    /// requested order, or with the first error. A cycle or an unregistered
    /// dependency is reported synchronously, before anything is dispatched,
    /// and no process is started.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run<F>(&self, request: RunRequest<T, C>, completion: F) -> Option<ProcessHandle>
    where
        F: FnOnce(&Arc<C>, Result<Vec<T>>) + Send + 'static,
    {
        let (dependencies, context, observers) = request.into_parts();
        let emitter = Task::emitter(dependencies);

        let chain = match self
            .detect_cycle(&emitter)
            .and_then(|()| self.dependency_closure(&emitter))
        {
            Ok(closure) => closure.into_iter().cloned().collect::<Vec<_>>(),
            Err(err) => {
                warn!(requested = ?emitter.dependencies(), error = %err, "run rejected before dispatch");
                completion(&context, Err(err));
                return None;
            }
        };

        let id = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!(run_id = id, requested = ?emitter.dependencies(), tasks = chain.len(), "starting run");

        let process = Process::new(ProcessOptions {
            id,
            emitter,
            chain,
            context,
            sink: Box::new(completion),
            observers,
            engine: self.engine,
        });

        Some(process.start())
    }

    /// Run `request` and wait for its results.
    pub async fn resolve(&self, request: RunRequest<T, C>) -> Result<Vec<T>> {
        let (tx, rx) = oneshot::channel();
        let _handle = self.run(request, move |_ctx, outcome| {
            let _ = tx.send(outcome);
        });

        rx.await
            .map_err(|_| DagrunError::Aborted("run dropped without an outcome".to_string()))?
    }
}
