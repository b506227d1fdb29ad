// src/dag/mod.rs

//! Task graph representation.
//!
//! - [`task`] holds the immutable task templates and the option records
//!   they are built from.
//! - [`task_run`] is the run-scoped clone of a task: outstanding
//!   requirements, collected results and lifecycle state.
//! - [`registry`] owns the templates, checks the graph and starts runs.
//! - [`graph`] orders a whole graph and rejects cycles.
//! - [`signal`] is the name-keyed subscriber list used to route results.

pub mod graph;
pub mod registry;
pub mod signal;
pub mod task;
pub mod task_run;

pub use registry::{Registry, WorkTable};
pub use signal::Signals;
pub use task::{EMITTER_NAME, Registration, Task, TaskSpec, Work, WorkFn};
pub use task_run::{Embrace, TaskRun, TaskState};
