//! Work functions with scripted behaviour, all over `serde_json::Value`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use dagrun::{Completion, Work};
use serde_json::Value;

use crate::builders::TestContext;
use crate::recorder::DispatchLog;

pub type JsonWork = Work<Value, TestContext>;

/// `[plus + name, ...each dependency result flattened one level]`.
pub fn compose(ctx: &TestContext, name: &str, args: Vec<Value>) -> Value {
    let mut out = vec![Value::String(format!("{}{}", ctx.plus, name))];
    for arg in args {
        match arg {
            Value::Array(items) => out.extend(items),
            other => out.push(other),
        }
    }
    Value::Array(out)
}

/// Responds synchronously with [`compose`].
pub fn echo(name: &str, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::new(
        move |ctx: &Arc<TestContext>, args: Vec<Value>, done: Completion<Value>| {
            log.record(&name);
            done.ok(compose(ctx, &name, args));
            Ok(())
        },
    )
}

/// Responds with [`compose`] after `delay`, from a spawned Tokio task.
pub fn delayed_echo(name: &str, delay: Duration, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::new(
        move |ctx: &Arc<TestContext>, args: Vec<Value>, done: Completion<Value>| {
            log.record(&name);
            let ctx = Arc::clone(ctx);
            let name = name.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                done.ok(compose(&ctx, &name, args));
            });
            Ok(())
        },
    )
}

/// Reports an error through the completion handle.
pub fn failing(name: &str, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::new(
        move |_ctx: &Arc<TestContext>, _args: Vec<Value>, done: Completion<Value>| {
            log.record(&name);
            done.fail(anyhow!("Dummy error"));
            Ok(())
        },
    )
}

/// Returns `Err` from the work function itself.
pub fn returning_err(name: &str, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::new(
        move |_ctx: &Arc<TestContext>, _args: Vec<Value>, _done: Completion<Value>| {
            log.record(&name);
            Err(anyhow!("Dummy error"))
        },
    )
}

/// Panics inside the work function.
pub fn panicking(name: &str, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::new(
        move |_ctx: &Arc<TestContext>, _args: Vec<Value>, _done: Completion<Value>| {
            log.record(&name);
            panic!("Dummy panic");
        },
    )
}

/// Calls the completion handle twice with success.
pub fn double_completion(name: &str, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::new(
        move |_ctx: &Arc<TestContext>, _args: Vec<Value>, done: Completion<Value>| {
            log.record(&name);
            done.ok(Value::Null);
            done.ok(Value::Null);
            Ok(())
        },
    )
}

/// Async work whose future panics after one yield.
pub fn async_panicking(name: &str, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::from_async(move |_ctx: Arc<TestContext>, _args: Vec<Value>| {
        log.record(&name);
        let name = name.clone();
        async move {
            tokio::task::yield_now().await;
            if !name.is_empty() {
                panic!("Dummy async panic");
            }
            Ok::<_, anyhow::Error>(Value::Null)
        }
    })
}

/// Drops the completion handle without reporting.
pub fn dropping(name: &str, log: DispatchLog) -> JsonWork {
    let name = name.to_string();
    Work::new(
        move |_ctx: &Arc<TestContext>, _args: Vec<Value>, done: Completion<Value>| {
            log.record(&name);
            drop(done);
            Ok(())
        },
    )
}
