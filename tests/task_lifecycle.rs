// tests/task_lifecycle.rs

use std::sync::Arc;

use dagrun::dag::{Embrace, TaskRun, TaskState};
use dagrun::errors::DagrunError;
use dagrun::{Completion, Task, TaskSpec, Work, define};

fn noop() -> Work<i32> {
    Work::new(|_ctx: &Arc<()>, _args: Vec<i32>, _done: Completion<i32>| Ok(()))
}

fn fetch_user(_ctx: &Arc<()>, _args: Vec<i32>, done: Completion<i32>) -> anyhow::Result<()> {
    done.ok(1);
    Ok(())
}

fn generic_fetch<X>(_ctx: &Arc<()>, _args: Vec<i32>, done: Completion<i32>) -> anyhow::Result<()> {
    done.ok(std::mem::size_of::<X>() as i32);
    Ok(())
}

fn closure_work<X>() -> Work<i32> {
    Work::new(|_ctx: &Arc<()>, _args: Vec<i32>, done: Completion<i32>| {
        done.ok(0);
        Ok(())
    })
}

type BoxedWorkFn = Box<dyn Fn(&Arc<()>, Vec<i32>, Completion<i32>) -> anyhow::Result<()> + Send + Sync>;

fn assert_name_required(work: Work<i32>) {
    match define(TaskSpec::new().work(work)) {
        Err(DagrunError::ValidationError(msg)) => assert!(msg.contains("name required")),
        other => panic!("Expected ValidationError, got: {:?}", other),
    }
}

fn two_deps() -> Task<i32> {
    TaskSpec::new()
        .named("t")
        .after(["a", "b"])
        .work(noop())
        .build()
        .unwrap()
}

#[test]
fn explicit_name_wins() {
    let task = define(TaskSpec::new().named("explicit").work(Work::new(fetch_user))).unwrap();
    assert_eq!(task.name(), "explicit");
}

#[test]
fn name_falls_back_to_fn_identifier() {
    let task: Task<i32> = define(TaskSpec::new().work(Work::new(fetch_user))).unwrap();
    assert_eq!(task.name(), "fetch_user");
    assert!(task.dependencies().is_empty());
}

#[test]
fn closure_without_name_is_rejected() {
    let result = define(TaskSpec::new().after(["x"]).work(noop()));
    match result {
        Err(DagrunError::ValidationError(msg)) => assert!(msg.contains("name required")),
        other => panic!("Expected ValidationError, got: {:?}", other),
    }
}

#[test]
fn boxed_work_has_no_identifier() {
    let boxed: BoxedWorkFn = Box::new(fetch_user);
    let boxed: Work<i32> = Work::new(boxed);
    assert_eq!(boxed.identifier(), None);
    let boxed_item: Work<i32> = Work::new(Box::new(fetch_user));
    assert_eq!(boxed_item.identifier(), None);

    let boxed_closure: BoxedWorkFn = Box::new(
        |_ctx: &Arc<()>, _args: Vec<i32>, _done: Completion<i32>| -> anyhow::Result<()> { Ok(()) },
    );
    assert_name_required(Work::new(boxed_closure));
}

#[test]
fn closure_inside_generic_fn_has_no_identifier() {
    let work = closure_work::<u8>();
    assert_eq!(work.identifier(), None);
    assert_name_required(work);
}

#[test]
fn generic_fn_instance_needs_explicit_name() {
    assert_name_required(Work::new(generic_fetch::<u8>));

    let task = define(TaskSpec::new().named("sized").work(Work::new(generic_fetch::<u8>))).unwrap();
    assert_eq!(task.name(), "sized");
}

#[test]
fn missing_work_is_rejected() {
    let spec: TaskSpec<i32> = TaskSpec::new().named("lonely");
    assert!(matches!(
        define(spec),
        Err(DagrunError::ValidationError(msg)) if msg.contains("lonely")
    ));
}

#[test]
fn fresh_run_starts_pending_with_all_requirements() {
    let run = TaskRun::new(&two_deps());
    assert_eq!(run.state(), TaskState::Pending);
    assert_eq!(run.requirements(), vec!["a", "b"]);
    assert!(!run.is_fulfilled());
}

#[test]
fn dependency_free_task_is_fulfilled_immediately() {
    let task: Task<i32> = define(TaskSpec::new().named("leaf").work(noop())).unwrap();
    let mut run = TaskRun::new(&task);
    assert_eq!(run.state(), TaskState::Fulfilled);
    assert_eq!(run.dispatch(), Some(Vec::new()));
    assert_eq!(run.state(), TaskState::Dispatched);
}

#[test]
fn embrace_fills_declared_positions() {
    let mut run = TaskRun::new(&two_deps());

    assert_eq!(run.embrace_dependency("b", 2).unwrap(), Embrace::Waiting);
    assert_eq!(run.requirements(), vec!["a"]);
    assert_eq!(run.dispatch(), None, "not dispatchable before fulfilment");

    assert_eq!(run.embrace_dependency("a", 1).unwrap(), Embrace::Fulfilled);
    assert_eq!(run.state(), TaskState::Fulfilled);
    assert_eq!(run.dispatch(), Some(vec![1, 2]));
    assert_eq!(run.dispatch(), None, "dispatch happens once");
}

#[test]
fn unrelated_producer_is_ignored() {
    let mut run = TaskRun::new(&two_deps());
    assert_eq!(run.embrace_dependency("zzz", 9).unwrap(), Embrace::Ignored);
    assert_eq!(run.requirements(), vec!["a", "b"]);
}

#[test]
fn embracing_twice_is_a_duplicate_completion() {
    let mut run = TaskRun::new(&two_deps());
    run.embrace_dependency("a", 1).unwrap();

    match run.embrace_dependency("a", 1) {
        Err(DagrunError::DuplicateCompletion(dep)) => assert_eq!(dep, "a"),
        other => panic!("Expected DuplicateCompletion, got: {:?}", other),
    }
}

#[test]
fn repeated_dependency_name_needs_one_embrace_per_entry() {
    let task: Task<i32> = define(TaskSpec::new().named("pair").after(["d", "d"]).work(noop())).unwrap();
    let mut run = TaskRun::new(&task);

    assert_eq!(run.embrace_dependency("d", 7).unwrap(), Embrace::Waiting);
    assert_eq!(run.embrace_dependency("d", 7).unwrap(), Embrace::Fulfilled);
    assert_eq!(run.dispatch(), Some(vec![7, 7]));
}

#[test]
fn reset_restores_fresh_state() {
    let mut run = TaskRun::new(&two_deps());
    run.embrace_dependency("a", 1).unwrap();
    run.embrace_dependency("b", 2).unwrap();
    assert!(run.is_fulfilled());

    run.reset();
    assert_eq!(run.state(), TaskState::Pending);
    assert_eq!(run.requirements(), vec!["a", "b"]);
}

#[test]
fn second_completion_is_rejected() {
    let task: Task<i32> = define(TaskSpec::new().named("leaf").work(noop())).unwrap();
    let mut run = TaskRun::new(&task);
    run.dispatch().unwrap();

    run.respond().unwrap();
    assert_eq!(run.state(), TaskState::Responded);
    assert!(matches!(run.respond(), Err(DagrunError::DuplicateCompletion(_))));
    assert!(matches!(run.error(), Err(DagrunError::DuplicateCompletion(_))));
}

#[test]
fn runs_of_one_template_are_independent() {
    let task = two_deps();
    let mut first = TaskRun::new(&task);
    let second = TaskRun::new(&task);

    first.embrace_dependency("a", 1).unwrap();
    assert_eq!(first.requirements(), vec!["b"]);
    assert_eq!(second.requirements(), vec!["a", "b"]);
    assert_eq!(task.dependencies(), &["a".to_string(), "b".to_string()]);
}
