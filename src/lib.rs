// src/lib.rs

//! Resolve a named dependency graph of asynchronous work units and run each
//! unit exactly once, as soon as all of its dependencies have produced a
//! result.
//!
//! ```no_run
//! use dagrun::{Registry, RunRequest, TaskSpec, Work};
//!
//! # async fn demo() -> dagrun::errors::Result<()> {
//! let mut registry: Registry<String> = Registry::new();
//! registry.register(
//!     TaskSpec::new()
//!         .named("greeting")
//!         .work(Work::from_fn(|_ctx: &(), _args: Vec<String>| Ok("hello".to_string()))),
//! )?;
//! registry.register(
//!     TaskSpec::new()
//!         .named("shout")
//!         .after(["greeting"])
//!         .work(Work::from_fn(|_ctx: &(), args: Vec<String>| Ok(args[0].to_uppercase()))),
//! )?;
//!
//! let results = registry.resolve(RunRequest::new(["shout"])).await?;
//! assert_eq!(results, vec!["HELLO".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod types;

pub use dag::{Registry, Task, TaskSpec, Work, WorkTable};
pub use engine::{Completion, ProcessHandle, RunRequest, TaskName};
pub use errors::{DagrunError, Result};

/// Build a standalone task, e.g. for [`Registry::with_tasks`].
pub fn define<T, C>(spec: TaskSpec<T, C>) -> Result<Task<T, C>> {
    Task::new(spec)
}
