//! Call stack push/pop recording

use super::{events, run};
use looptrace::StepEvent;

#[test]
fn test_sequential_calls_push_and_pop() {
    let run = run("function a(){} function b(){ } a(); b();");

    assert_eq!(events(&run), vec!["start", "push a", "pop a", "push b", "pop b"]);
    for step in &run.trace {
        assert!(step.tasks.is_empty());
        assert!(step.microtasks.is_empty());
    }
    assert!(run.trace.last().unwrap().call_stack.is_empty());
}

#[test]
fn test_nested_calls_show_full_stack() {
    let run = run("function inner() {} function outer() { inner(); } outer();");

    assert_eq!(
        events(&run),
        vec!["start", "push outer", "push inner", "pop inner", "pop outer"]
    );
    let deepest = run.trace.get(2).unwrap();
    assert_eq!(deepest.stack_names(), vec!["outer", "inner"]);
    let after_inner = run.trace.get(3).unwrap();
    assert_eq!(after_inner.stack_names(), vec!["outer"]);
}

#[test]
fn test_push_and_pop_highlight_the_function() {
    let source = "function a() {}\na();";
    let run = run(source);

    let push = run.trace.get(1).unwrap();
    let pop = run.trace.get(2).unwrap();
    let node = push.node.unwrap();
    assert_eq!(node.kind, "FunctionDeclaration");
    assert_eq!(source.get(node.span.start..node.span.end), Some("function a() {}"));
    assert_eq!(pop.node, push.node);
}

#[test]
fn test_start_step_has_no_node() {
    let run = run("function a() {} a();");
    let start = run.trace.get(0).unwrap();
    assert_eq!(start.event, StepEvent::Start);
    assert!(start.node.is_none());
    assert!(start.call_stack.is_empty());
}

#[test]
fn test_calls_in_expressions_are_recorded() {
    let run = run("function one() { return 1; } var x = one() + one();");
    assert_eq!(
        events(&run),
        vec!["start", "push one", "pop one", "push one", "pop one"]
    );
}

#[test]
fn test_return_skips_rest_of_body() {
    let run = run("function f() { return 1; missing(); } f();");
    assert!(run.diagnostics.is_empty());
    assert_eq!(events(&run), vec!["start", "push f", "pop f"]);
}

#[test]
fn test_recursion_balances() {
    let run = run(
        "function countdown(n) { if (n) {} return n > 0 ? countdown(n - 1) : 0; } countdown(3);",
    );
    let pushes = run
        .trace
        .iter()
        .filter(|step| matches!(step.event, StepEvent::Push { .. }))
        .count();
    let pops = run
        .trace
        .iter()
        .filter(|step| matches!(step.event, StepEvent::Pop { .. }))
        .count();
    assert_eq!(pushes, 4);
    assert_eq!(pops, 4);
    assert!(run.trace.last().unwrap().call_stack.is_empty());
}
