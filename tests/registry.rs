// tests/registry.rs

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use dagrun::dag::graph::topological_order;
use dagrun::errors::DagrunError;
use dagrun::{Completion, Registry, Task, TaskSpec, Work, define};

use crate::common::{diamond, init_tracing};

fn noop() -> Work<i32> {
    Work::new(|_ctx: &Arc<()>, _args: Vec<i32>, _done: Completion<i32>| Ok(()))
}

fn spec(name: &str, deps: &[&str]) -> TaskSpec<i32> {
    TaskSpec::new()
        .named(name)
        .after(deps.iter().copied())
        .work(noop())
}

fn names<T, C>(tasks: &[&Task<T, C>]) -> BTreeSet<String> {
    tasks.iter().map(|t| t.name().to_string()).collect()
}

#[test]
fn registers_specs_and_tasks() {
    init_tracing();
    let (registry, _log) = diamond().build();
    assert_eq!(registry.len(), 7);

    let order: Vec<&str> = registry.tasks().map(|t| t.name()).collect();
    assert_eq!(order, vec!["a", "b", "c", "d", "e", "f", "g"]);

    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("x", &[])).unwrap();
    registry.register(define(spec("z", &["x"])).unwrap()).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.task_by_name("z").unwrap().dependencies(), &["x".to_string()]);
}

#[test]
fn with_tasks_builds_from_a_list() {
    let tasks = vec![define(spec("a", &["b"])).unwrap(), define(spec("b", &[])).unwrap()];
    let registry = Registry::with_tasks(tasks).unwrap();
    assert_eq!(registry.len(), 2);
    assert!(!registry.is_empty());
}

#[test]
fn task_by_name_finds_registered_tasks_only() {
    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("a", &[])).unwrap();

    assert_eq!(registry.task_by_name("a").map(|t| t.name()), Some("a"));
    assert!(registry.task_by_name("not there").is_none());
}

#[test]
fn make_task_normalises_a_spec() {
    let task = Registry::<i32>::make_task(spec("b", &["c"])).unwrap();
    assert_eq!(task.name(), "b");
    assert!(task.depends_on("c"));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut registry: Registry<i32> = Registry::new();
    let task = define(spec("b", &[])).unwrap();
    registry.add_task(task.clone()).unwrap();

    match registry.add_task(task) {
        Err(DagrunError::ValidationError(msg)) => assert!(msg.contains("already registered: b")),
        other => panic!("Expected ValidationError, got: {:?}", other),
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn unnamed_registration_is_rejected() {
    let mut registry: Registry<i32> = Registry::new();
    let result = registry.register(TaskSpec::new().work(noop()));
    assert!(matches!(result, Err(DagrunError::ValidationError(_))));
    assert!(registry.is_empty());
}

#[test]
fn emitter_name_is_reserved() {
    let mut registry: Registry<i32> = Registry::new();
    let result = registry.register(spec(dagrun::dag::EMITTER_NAME, &[]));
    assert!(matches!(result, Err(DagrunError::ValidationError(msg)) if msg.contains("reserved")));
}

#[test]
fn dependency_list_returns_direct_dependencies() {
    let (registry, _log) = diamond().build();
    let a = registry.task_by_name("a").unwrap();

    let direct: Vec<&str> = registry
        .dependency_list(a)
        .into_iter()
        .map(|t| t.unwrap().name())
        .collect();
    assert_eq!(direct, vec!["b", "c"]);
}

#[test]
fn dependency_list_yields_placeholder_for_unregistered_names() {
    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("a", &["ghost", "b"])).unwrap();
    registry.register(spec("b", &[])).unwrap();

    let list = registry.dependency_list(registry.task_by_name("a").unwrap());
    assert!(list[0].is_none());
    assert_eq!(list[1].map(|t| t.name()), Some("b"));
}

#[test]
fn dependency_closure_is_transitive_and_deduplicated() {
    let (registry, _log) = diamond().build();
    let a = registry.task_by_name("a").unwrap();

    let closure = registry.dependency_closure(a).unwrap();
    assert_eq!(closure.len(), 3, "b, c and d; d only once");
    assert_eq!(
        names(&closure),
        ["b", "c", "d"].iter().map(|s| s.to_string()).collect()
    );

    let requester = define(
        TaskSpec::new()
            .named("requester")
            .after(["a"])
            .work(dagrun_test_utils::fake_work::echo("requester", Default::default())),
    )
    .unwrap();
    let closure = registry.dependency_closure(&requester).unwrap();
    assert_eq!(
        names(&closure),
        ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect()
    );
}

#[test]
fn dependency_closure_fails_on_unregistered_name() {
    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("a", &["b"])).unwrap();
    registry.register(spec("b", &["ghost"])).unwrap();

    match registry.dependency_closure(registry.task_by_name("a").unwrap()) {
        Err(DagrunError::UnknownDependency { task, dependency }) => {
            assert_eq!(task, "b");
            assert_eq!(dependency, "ghost");
        }
        other => panic!("Expected UnknownDependency, got: {:?}", other),
    }
}

#[test]
fn detect_cycle_accepts_acyclic_graphs() {
    let (registry, _log) = diamond().build();
    for task in registry.tasks() {
        registry.detect_cycle(task).unwrap();
    }
}

#[test]
fn detect_cycle_reports_two_task_cycle() {
    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("a", &["b"])).unwrap();
    registry.register(spec("b", &["a"])).unwrap();

    match registry.detect_cycle(registry.task_by_name("a").unwrap()) {
        Err(DagrunError::CircularDependency(name)) => assert_eq!(name, "a"),
        other => panic!("Expected CircularDependency, got: {:?}", other),
    }
}

#[test]
fn detect_cycle_reports_self_dependency_and_longer_cycles() {
    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("me", &["me"])).unwrap();
    registry.register(spec("top", &["x"])).unwrap();
    registry.register(spec("x", &["y"])).unwrap();
    registry.register(spec("y", &["z"])).unwrap();
    registry.register(spec("z", &["x"])).unwrap();

    assert!(matches!(
        registry.detect_cycle(registry.task_by_name("me").unwrap()),
        Err(DagrunError::CircularDependency(name)) if name == "me"
    ));
    assert!(matches!(
        registry.detect_cycle(registry.task_by_name("top").unwrap()),
        Err(DagrunError::CircularDependency(name)) if name == "x"
    ));
}

#[test]
fn validate_checks_the_whole_registry() {
    let (registry, _log) = diamond().build();
    registry.validate().unwrap();

    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("a", &["missing"])).unwrap();
    assert!(matches!(
        registry.validate(),
        Err(DagrunError::UnknownDependency { dependency, .. }) if dependency == "missing"
    ));

    let mut registry: Registry<i32> = Registry::new();
    registry.register(spec("a", &["b"])).unwrap();
    registry.register(spec("b", &["a"])).unwrap();
    assert!(matches!(registry.validate(), Err(DagrunError::CircularDependency(_))));
}

#[test]
fn topological_order_puts_dependencies_first() {
    let deps_a = vec!["b".to_string(), "c".to_string()];
    let deps_b = vec!["d".to_string()];
    let deps_c = vec!["d".to_string()];
    let none: Vec<String> = Vec::new();
    let nodes = vec![
        ("a", deps_a.as_slice()),
        ("b", deps_b.as_slice()),
        ("c", deps_c.as_slice()),
        ("d", none.as_slice()),
    ];

    let order = topological_order(nodes).unwrap();
    let pos = |name: &str| order.iter().position(|n| *n == name).unwrap();

    assert_eq!(order.len(), 4);
    assert!(pos("d") < pos("b"));
    assert!(pos("d") < pos("c"));
    assert!(pos("b") < pos("a"));
    assert!(pos("c") < pos("a"));
}

#[test]
fn topological_order_treats_self_dependency_as_a_cycle() {
    let deps = vec!["me".to_string()];
    let result = topological_order([("me", deps.as_slice())]);
    assert!(matches!(result, Err(DagrunError::CircularDependency(name)) if name == "me"));
}
