//! setTimeout / clearTimeout scheduling

use super::{console_output, events, run, tasks_run};
use looptrace::StepEvent;

#[test]
fn test_tasks_sorted_by_delay() {
    let run = run("setTimeout(function(){}, 100); setTimeout(function(){}, 10);");

    let queued = run.trace.get(2).unwrap();
    let delays: Vec<f64> = queued.tasks.iter().map(|task| task.delay).collect();
    assert_eq!(delays, vec![10.0, 100.0]);

    // The delay-10 task runs first: when it finishes only the 100 task is left
    let first_run = run
        .trace
        .iter()
        .find(|step| matches!(step.event, StepEvent::TaskRun { .. }))
        .unwrap();
    let remaining: Vec<f64> = first_run.tasks.iter().map(|task| task.delay).collect();
    assert_eq!(remaining, vec![100.0]);
    assert_eq!(first_run.clock, 10.0);
    assert_eq!(run.clock, 100.0);
}

#[test]
fn test_equal_delays_run_in_enqueue_order() {
    let run = run(
        "setTimeout(function a(){}, 5); setTimeout(function b(){}, 5); setTimeout(function c(){}, 1);",
    );
    assert_eq!(tasks_run(&run), vec!["c", "a", "b"]);
}

#[test]
fn test_enqueue_is_a_step() {
    let run = run("setTimeout(function tick(){}, 0);");
    assert_eq!(
        events(&run),
        vec![
            "start",
            "enqueue task tick (0ms)",
            "push tick",
            "pop tick",
            "ran task tick",
        ]
    );
    let enqueue = run.trace.get(1).unwrap();
    assert_eq!(enqueue.task_names(), vec!["tick"]);
    assert_eq!(enqueue.node.map(|node| node.kind), Some("CallExpression"));
}

#[test]
fn test_task_callback_is_not_invoked_synchronously() {
    let run = run("setTimeout(function later(){ console.log('later'); }, 0); console.log('now');");
    assert_eq!(console_output(&run), vec!["now", "later"]);
}

#[test]
fn test_clear_timeout_removes_task() {
    let run = run(
        "var id = setTimeout(function a(){}, 10); setTimeout(function b(){}, 20); clearTimeout(id);",
    );

    assert_eq!(tasks_run(&run), vec!["b"]);
    let cancel = run
        .trace
        .iter()
        .find(|step| matches!(step.event, StepEvent::TaskCancelled { .. }))
        .unwrap();
    assert_eq!(cancel.task_names(), vec!["b"]);
}

#[test]
fn test_clear_timeout_unknown_id_is_ignored() {
    let run = run("clearTimeout(42); clearTimeout('x'); clearTimeout();");
    assert_eq!(events(&run), vec!["start"]);
    assert!(run.diagnostics.is_empty());
}

#[test]
fn test_set_timeout_returns_increasing_ids() {
    let run = run("var a = setTimeout(function(){}, 0); var b = setTimeout(function(){}, 0); console.log(a, b);");
    assert_eq!(console_output(&run), vec!["1 2"]);
}

#[test]
fn test_extra_arguments_passed_to_callback() {
    let run = run("setTimeout(function(x, y){ console.log(x + y); }, 0, 2, 3);");
    assert_eq!(console_output(&run), vec!["5"]);
}

#[test]
fn test_non_literal_delay_is_zero() {
    let run = run("var d = 50; setTimeout(function late(){}, d); setTimeout(function lit(){}, 10);");
    assert_eq!(tasks_run(&run), vec!["late", "lit"]);
}

#[test]
fn test_negative_and_missing_delay_are_zero() {
    let run = run("setTimeout(function a(){}, 3); setTimeout(function b(){}, -5); setTimeout(function c(){});");
    assert_eq!(tasks_run(&run), vec!["b", "c", "a"]);
}

#[test]
fn test_nested_timer_ordering_and_clock() {
    let run = run(
        "setTimeout(function outer(){ setTimeout(function inner(){}, 0); }, 100);\n\
         setTimeout(function mid(){}, 50);",
    );
    assert_eq!(tasks_run(&run), vec!["mid", "outer", "inner"]);

    // The clock never moves backwards
    let clocks: Vec<f64> = run.trace.iter().map(|step| step.clock).collect();
    assert!(clocks.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(run.clock, 100.0);
}

#[test]
fn test_builtin_as_task_callback() {
    let run = run("setTimeout(console.log, 0, 'from timer');");
    assert_eq!(console_output(&run), vec!["from timer"]);
    assert_eq!(tasks_run(&run), vec!["log"]);
}
