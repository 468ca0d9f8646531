//! Non-fatal diagnostics: evaluation always keeps going

use super::{console_output, diagnostic_names, events, run, run_with};
use looptrace::{DiagnosticKind, RunOutcome, SimConfig};

#[test]
fn test_unresolved_callee_leaves_stack_unchanged() {
    let run = run("function a(){} undefinedFn(); a();");

    assert_eq!(events(&run), vec!["start", "push a", "pop a"]);
    let diagnostic = run.diagnostics.first().unwrap();
    assert_eq!(
        diagnostic.kind,
        DiagnosticKind::UnresolvedCallee {
            name: "undefinedFn".to_string()
        }
    );
    assert_eq!(diagnostic.message, "undefinedFn is not a function");
    assert_eq!(diagnostic.step, 0);
    assert!(diagnostic.span.is_some());
}

#[test]
fn test_diagnostic_step_points_at_latest_step() {
    let run = run("function a(){} a(); missing();");
    assert_eq!(run.diagnostics.first().map(|d| d.step), Some(2));
}

#[test]
fn test_unresolved_member_callee() {
    let run = run("console.nope('x');");
    assert_eq!(
        run.diagnostics.first().map(|d| &d.kind),
        Some(&DiagnosticKind::UnresolvedCallee {
            name: "console.nope".to_string()
        })
    );
}

#[test]
fn test_unhandled_statement_is_skipped() {
    let run = run("if (x) { a(); }\nconsole.log('after');");

    assert_eq!(
        run.diagnostics.first().map(|d| &d.kind),
        Some(&DiagnosticKind::UnhandledNodeKind { kind: "IfStatement" })
    );
    assert_eq!(
        run.diagnostics.first().map(|d| d.message.as_str()),
        Some("Unhandled node type: IfStatement")
    );
    assert_eq!(console_output(&run), vec!["after"]);
}

#[test]
fn test_unhandled_expression_evaluates_to_undefined() {
    let run = run("var x = new Foo(); console.log(x);");
    assert_eq!(diagnostic_names(&run), vec!["UnhandledNodeKind"]);
    assert_eq!(console_output(&run), vec!["undefined"]);
}

#[test]
fn test_invalid_callbacks_are_not_queued() {
    let run = run("setTimeout(42, 10); queueMicrotask('x');");
    assert_eq!(events(&run), vec!["start"]);
    assert_eq!(
        run.diagnostics.iter().map(|d| d.kind.clone()).collect::<Vec<_>>(),
        vec![
            DiagnosticKind::InvalidCallback { source: "setTimeout" },
            DiagnosticKind::InvalidCallback {
                source: "queueMicrotask"
            },
        ]
    );
}

#[test]
fn test_evaluation_continues_after_diagnostics() {
    let run = run("missing(); nope.call(); console.log('after');");
    assert_eq!(diagnostic_names(&run), vec!["UnresolvedCallee", "UnresolvedCallee"]);
    assert_eq!(console_output(&run), vec!["after"]);
    assert_eq!(run.outcome, RunOutcome::Completed);
}

#[test]
fn test_call_depth_limit() {
    let config = SimConfig::default().with_max_call_depth(5);
    let run = run_with("function r(){ r(); } r();", config);

    assert_eq!(
        run.diagnostics.first().map(|d| &d.kind),
        Some(&DiagnosticKind::CallDepthExceeded { depth: 5 })
    );
    let pushes = events(&run).iter().filter(|e| e.as_str() == "push r").count();
    let pops = events(&run).iter().filter(|e| e.as_str() == "pop r").count();
    assert_eq!((pushes, pops), (5, 5));
    assert!(run.trace.last().unwrap().call_stack.is_empty());
    assert_eq!(run.outcome, RunOutcome::Completed);
}

#[test]
fn test_default_call_depth_limit_on_deep_recursion() {
    let run = run("function f(n){ return f(n + 1); } f(0); console.log('after');");

    assert_eq!(
        run.diagnostics.first().map(|d| &d.kind),
        Some(&DiagnosticKind::CallDepthExceeded {
            depth: SimConfig::DEFAULT_MAX_CALL_DEPTH
        })
    );
    assert!(run.trace.last().unwrap().call_stack.is_empty());
    assert_eq!(console_output(&run), vec!["after"]);
}

#[test]
fn test_step_limit_truncates_run() {
    let config = SimConfig::default().with_max_steps(50);
    let run = run_with("function tick(){ setTimeout(tick, 10); } tick();", config);

    assert!(run.is_truncated());
    assert_eq!(run.trace.len(), 50);
    assert_eq!(
        run.diagnostics.last().map(|d| &d.kind),
        Some(&DiagnosticKind::StepLimitReached { limit: 50 })
    );
}

#[test]
fn test_diagnostic_serializes_flat() {
    let run = run("missing();");
    let json = serde_json::to_value(run.diagnostics.first().unwrap()).unwrap();
    assert_eq!(json["type"], "UnresolvedCallee");
    assert_eq!(json["name"], "missing");
    assert_eq!(json["message"], "missing is not a function");
    assert_eq!(json["step"], 0);
    assert_eq!(json["span"]["line"], 1);
}
