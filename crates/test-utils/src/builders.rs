#![allow(dead_code)]

use std::time::Duration;

use dagrun::{Registry, TaskSpec};
use serde_json::Value;

use crate::fake_work::{self, JsonWork};
use crate::recorder::DispatchLog;

/// Context used by the fixtures: prepended to every composed result.
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    pub plus: String,
}

impl TestContext {
    pub fn plus(plus: &str) -> Self {
        Self {
            plus: plus.to_string(),
        }
    }
}

pub type JsonRegistry = Registry<Value, TestContext>;

/// Builder for a `Registry<Value, TestContext>` whose tasks all record
/// into one shared [`DispatchLog`].
pub struct GraphBuilder {
    registry: JsonRegistry,
    log: DispatchLog,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            log: DispatchLog::new(),
        }
    }

    pub fn log(&self) -> DispatchLog {
        self.log.clone()
    }

    pub fn echo(self, name: &str, deps: &[&str]) -> Self {
        let work = fake_work::echo(name, self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn delayed_echo(self, name: &str, deps: &[&str], delay_ms: u64) -> Self {
        let work =
            fake_work::delayed_echo(name, Duration::from_millis(delay_ms), self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn failing(self, name: &str, deps: &[&str]) -> Self {
        let work = fake_work::failing(name, self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn returning_err(self, name: &str, deps: &[&str]) -> Self {
        let work = fake_work::returning_err(name, self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn panicking(self, name: &str, deps: &[&str]) -> Self {
        let work = fake_work::panicking(name, self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn double_completion(self, name: &str, deps: &[&str]) -> Self {
        let work = fake_work::double_completion(name, self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn async_panicking(self, name: &str, deps: &[&str]) -> Self {
        let work = fake_work::async_panicking(name, self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn dropping(self, name: &str, deps: &[&str]) -> Self {
        let work = fake_work::dropping(name, self.log.clone());
        self.with_work(name, deps, work)
    }

    pub fn with_work(mut self, name: &str, deps: &[&str], work: JsonWork) -> Self {
        let spec: TaskSpec<Value, TestContext> = TaskSpec::new()
            .named(name)
            .after(deps.iter().copied())
            .work(work);
        self.registry
            .register(spec)
            .expect("Failed to register task from builder");
        self
    }

    pub fn build(self) -> (JsonRegistry, DispatchLog) {
        (self.registry, self.log)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `a(b, c)`, `b(d)`, `c(d)`, `d()`, plus unrelated `e()`, `f(g)`, `g()`.
pub fn diamond() -> GraphBuilder {
    GraphBuilder::new()
        .echo("a", &["b", "c"])
        .echo("b", &["d"])
        .echo("c", &["d"])
        .echo("d", &[])
        .echo("e", &[])
        .echo("f", &["g"])
        .echo("g", &[])
}
