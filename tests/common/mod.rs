#![allow(dead_code)]

use serde_json::Value;

pub use dagrun_test_utils::builders::{GraphBuilder, JsonRegistry, TestContext, diamond};
pub use dagrun_test_utils::recorder::DispatchLog;
pub use dagrun_test_utils::{init_tracing, with_timeout};

/// Flatten nested JSON arrays into their string leaves, sorted.
pub fn sorted_leaves(value: &Value) -> Vec<String> {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            Value::String(s) => out.push(s.clone()),
            other => out.push(other.to_string()),
        }
    }

    let mut out = Vec::new();
    walk(value, &mut out);
    out.sort();
    out
}
