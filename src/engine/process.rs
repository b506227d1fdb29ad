// src/engine/process.rs

//! Per-run execution driver.
//!
//! A [`Process`] owns clones of every task a run needs plus the synthetic
//! emitter task. Wiring is decentralised: each task subscribes, under the
//! names of its dependencies, to the "responded" signal, and a producer's
//! result is published once under its own name. A task whose last
//! dependency is embraced goes onto the ready queue; the driver dispatches
//! the queue only after the current batch of events has been handled, so
//! dispatch never happens from inside a fulfilment transition.
//!
//! The run is terminal as soon as either
//! - the emitter is dispatched (the caller's sink receives the results), or
//! - any task fails (the sink receives that error and nothing else).
//!
//! Work still in flight at that point is not cancelled; its completion
//! handles keep working but their reports are discarded. A task whose
//! handle is dropped without reporting fails the run; one that holds its
//! handle and never reports keeps the run waiting.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::{Embrace, Signals, Task, TaskRun, TaskState};
use crate::engine::{Completion, EngineOptions, Observer, ProcessEvent, panic_message};
use crate::errors::{DagrunError, Result};

/// Terminal sink of a run: the caller's completion function.
pub type Sink<T, C> = Box<dyn FnOnce(&Arc<C>, Result<Vec<T>>) + Send>;

/// Where a task lives inside a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Chain(usize),
    Emitter,
}

/// Whether the driver loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Finished,
}

/// Everything a process is built from.
pub struct ProcessOptions<T, C> {
    pub id: u64,
    /// Synthetic task whose dependencies are the requested names.
    pub emitter: Task<T, C>,
    /// Deep dependency closure of the emitter, one entry per task.
    pub chain: Vec<Task<T, C>>,
    pub context: Arc<C>,
    pub sink: Sink<T, C>,
    pub observers: Vec<Observer<T>>,
    pub engine: EngineOptions,
}

pub struct Process<T, C> {
    id: u64,
    context: Arc<C>,
    chain: Vec<Task<T, C>>,
    runs: Vec<TaskRun<T>>,
    emitter: TaskRun<T>,
    sink: Option<Sink<T, C>>,
    /// Producer name -> dependent slots (one entry per declared dependency).
    responded: Signals<Slot>,
    observers: Vec<Observer<T>>,
    ready: VecDeque<Slot>,
    events_tx: mpsc::UnboundedSender<ProcessEvent<T>>,
    events_rx: mpsc::UnboundedReceiver<ProcessEvent<T>>,
    engine: EngineOptions,
}

impl<T, C> fmt::Debug for Process<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("chain", &self.chain)
            .field("ready", &self.ready)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<T, C> Process<T, C>
where
    T: Clone + Send + 'static,
    C: Send + Sync + 'static,
{
    /// Clone run state for every task and wire result propagation.
    pub fn new(options: ProcessOptions<T, C>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let runs = options.chain.iter().map(TaskRun::new).collect();

        let mut process = Self {
            id: options.id,
            context: options.context,
            emitter: TaskRun::new(&options.emitter),
            chain: options.chain,
            runs,
            sink: Some(options.sink),
            responded: Signals::new(),
            observers: options.observers,
            ready: VecDeque::new(),
            events_tx,
            events_rx,
            engine: options.engine,
        };
        process.initialize();
        process
    }

    fn initialize(&mut self) {
        for (i, run) in self.runs.iter().enumerate() {
            for dep in run.dependencies() {
                self.responded.subscribe(dep.as_str(), Slot::Chain(i));
            }
        }
        for dep in self.emitter.dependencies() {
            self.responded.subscribe(dep.as_str(), Slot::Emitter);
        }

        debug!(
            run_id = self.id,
            tasks = self.runs.len(),
            subscriptions = self.responded.len(),
            "process wired"
        );
    }

    /// Queue every dependency-free task, or the emitter itself when nothing
    /// was requested.
    fn dissolve(&mut self) {
        let leaves: Vec<Slot> = self
            .runs
            .iter()
            .enumerate()
            .filter(|(_, run)| run.is_fulfilled())
            .map(|(i, _)| Slot::Chain(i))
            .collect();

        if leaves.is_empty() {
            self.ready.push_back(Slot::Emitter);
        } else {
            self.ready.extend(leaves);
        }
    }

    /// Spawn the driver onto the Tokio runtime.
    pub fn start(self) -> ProcessHandle {
        let id = self.id;
        let join = tokio::spawn(self.drive());
        ProcessHandle { id, join }
    }

    /// Drive the run on the current task until it is terminal.
    pub async fn drive(mut self) {
        info!(run_id = self.id, tasks = self.runs.len(), "run started");
        self.dissolve();

        loop {
            if self.dispatch_ready().await == Flow::Finished {
                return;
            }

            let Some(event) = self.events_rx.recv().await else {
                self.fail(DagrunError::Aborted("event channel closed".to_string()));
                return;
            };

            if self.turn(event) == Flow::Finished {
                return;
            }
        }
    }

    /// Handle `first` plus every event already queued behind it.
    fn turn(&mut self, first: ProcessEvent<T>) -> Flow {
        let mut next = Some(first);

        while let Some(event) = next {
            if let Err(err) = self.handle_event(event) {
                self.fail(err);
                return Flow::Finished;
            }
            next = self.events_rx.try_recv().ok();
        }

        Flow::Continue
    }

    fn handle_event(&mut self, event: ProcessEvent<T>) -> Result<()> {
        match event {
            ProcessEvent::Responded { slot, result } => {
                let Some(run) = self.runs.get_mut(slot) else {
                    warn!(run_id = self.id, slot, "response for unknown slot; ignoring");
                    return Ok(());
                };
                run.respond()?;
                let name = run.name().to_string();
                debug!(run_id = self.id, task = %name, "task responded");

                for observer in &self.observers {
                    observer(&name, &result);
                }
                self.publish_responded(&name, result)
            }
            ProcessEvent::Failed { slot, error } => {
                let Some(run) = self.runs.get_mut(slot) else {
                    warn!(run_id = self.id, slot, "failure for unknown slot; ignoring");
                    return Ok(());
                };
                run.error()?;
                Err(DagrunError::TaskError {
                    task: run.name().to_string(),
                    source: error,
                })
            }
            ProcessEvent::Released { slot } => {
                let Some(run) = self.runs.get_mut(slot) else {
                    return Ok(());
                };
                if run.state() != TaskState::Dispatched {
                    return Ok(());
                }
                run.error()?;
                Err(DagrunError::TaskError {
                    task: run.name().to_string(),
                    source: anyhow!("completion handle dropped without reporting"),
                })
            }
        }
    }

    /// Deliver `result` to everything subscribed under `name`.
    fn publish_responded(&mut self, name: &str, result: T) -> Result<()> {
        let subscribers = self.responded.subscribers(name).to_vec();

        for slot in subscribers {
            let run = match slot {
                Slot::Chain(i) => &mut self.runs[i],
                Slot::Emitter => &mut self.emitter,
            };
            if run.embrace_dependency(name, result.clone())? == Embrace::Fulfilled {
                self.ready.push_back(slot);
            }
        }

        Ok(())
    }

    async fn dispatch_ready(&mut self) -> Flow {
        if self.ready.is_empty() {
            return Flow::Continue;
        }
        if self.engine.yield_between_dispatches {
            tokio::task::yield_now().await;
        }

        while let Some(slot) = self.ready.pop_front() {
            let flow = match slot {
                Slot::Chain(i) => self.dispatch(i),
                Slot::Emitter => {
                    self.finish();
                    Flow::Finished
                }
            };
            if flow == Flow::Finished {
                return flow;
            }
        }

        Flow::Continue
    }

    fn dispatch(&mut self, i: usize) -> Flow {
        let run = &mut self.runs[i];
        let Some(args) = run.dispatch() else {
            warn!(run_id = self.id, task = %run.name(), state = ?run.state(), "task not dispatchable; skipping");
            return Flow::Continue;
        };

        let task = &self.chain[i];
        debug!(run_id = self.id, task = %task.name(), "dispatching task");

        let done = Completion::new(task.name().to_string(), i, self.events_tx.clone());
        let work = task.work();
        let context = &self.context;
        let error = match panic::catch_unwind(AssertUnwindSafe(|| work.call(context, args, done))) {
            Ok(Ok(())) => return Flow::Continue,
            Ok(Err(err)) => err,
            Err(payload) => anyhow!("task panicked: {}", panic_message(payload.as_ref())),
        };

        let name = task.name().to_string();
        if let Err(err) = self.runs[i].error() {
            self.fail(err);
        } else {
            self.fail(DagrunError::TaskError {
                task: name,
                source: error,
            });
        }
        Flow::Finished
    }

    fn finish(&mut self) {
        let results = self.emitter.dispatch().unwrap_or_default();
        info!(run_id = self.id, results = results.len(), "run finished");

        if let Some(sink) = self.sink.take() {
            sink(&self.context, Ok(results));
        }
    }

    fn fail(&mut self, err: DagrunError) {
        warn!(run_id = self.id, error = %err, "run failed");

        if let Some(sink) = self.sink.take() {
            sink(&self.context, Err(err));
        }
    }
}

/// Handle to a spawned process.
#[derive(Debug)]
pub struct ProcessHandle {
    id: u64,
    join: JoinHandle<()>,
}

impl ProcessHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the driver to stop. The run's outcome goes to its sink;
    /// this only reports whether the driver itself went away abnormally.
    pub async fn wait(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| DagrunError::Aborted(e.to_string()))
    }
}
