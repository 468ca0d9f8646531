//! Bindings, closures and frame names

use super::{console_output, events, run, tasks_run};

#[test]
fn test_closures_keep_their_scope() {
    let run = run(
        "function make() { var n = 0; return function inc() { n = n + 1; return n; }; }\n\
         var counter = make();\n\
         counter();\n\
         console.log(counter());",
    );
    assert_eq!(console_output(&run), vec!["2"]);
    assert_eq!(
        events(&run),
        vec!["start", "push make", "pop make", "push inc", "pop inc", "push inc", "pop inc"]
    );
}

#[test]
fn test_parameters_shadow_globals() {
    let run = run("var x = 'global'; function f(x) { console.log(x); } f('param'); console.log(x);");
    assert_eq!(console_output(&run), vec!["param", "global"]);
}

#[test]
fn test_missing_arguments_are_undefined() {
    let run = run("function f(a, b) { console.log(a, b); } f(1);");
    assert_eq!(console_output(&run), vec!["1 undefined"]);
}

#[test]
fn test_function_declarations_are_hoisted() {
    let run = run("a(); function a() { console.log('hoisted'); }");
    assert_eq!(console_output(&run), vec!["hoisted"]);
    assert!(run.diagnostics.is_empty());
}

#[test]
fn test_anonymous_functions_take_binding_name() {
    let run = run("var f = function() {}; const g = () => {}; let h; h = function() {}; f(); g(); h();");
    assert_eq!(
        events(&run),
        vec!["start", "push f", "pop f", "push g", "pop g", "push h", "pop h"]
    );
}

#[test]
fn test_unbound_anonymous_callback_is_anonymous() {
    let run = run("setTimeout(() => {}, 0);");
    assert_eq!(tasks_run(&run), vec!["anonymous"]);
}

#[test]
fn test_assignment_to_undeclared_name_is_global() {
    let run = run("function f() { leaked = 1; } f(); console.log(leaked);");
    assert_eq!(console_output(&run), vec!["1"]);
}

#[test]
fn test_redeclaration_overwrites() {
    let run = run("var x = 1; var x = 2; console.log(x);");
    assert_eq!(console_output(&run), vec!["2"]);
}

#[test]
fn test_return_values() {
    let run = run("function add(a, b) { return a + b; } const sq = x => x * x; console.log(add(2, 3), sq(4));");
    assert_eq!(console_output(&run), vec!["5 16"]);
}

#[test]
fn test_timer_callback_sees_closure() {
    let run = run(
        "function schedule(label) { setTimeout(function fire() { console.log(label); }, 0); }\n\
         schedule('a'); schedule('b');",
    );
    assert_eq!(console_output(&run), vec!["a", "b"]);
}
