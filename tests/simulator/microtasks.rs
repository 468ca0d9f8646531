//! Microtask queue and promise reactions

use super::{console_output, events, microtasks_run, position, run, tasks_run};

#[test]
fn test_microtasks_run_before_tasks() {
    let run = run("setTimeout(function t(){}, 0); queueMicrotask(function m(){});");

    let micro = position(&run, "ran microtask m").unwrap();
    let task = position(&run, "ran task t").unwrap();
    assert!(micro < task);
    assert!(position(&run, "push m").unwrap() < position(&run, "push t").unwrap());
}

#[test]
fn test_queue_microtask_records_enqueue() {
    let run = run("queueMicrotask(function m(){});");
    assert_eq!(
        events(&run),
        vec!["start", "enqueue microtask m", "push m", "pop m", "ran microtask m"]
    );
    let enqueue = run.trace.get(1).unwrap();
    assert_eq!(enqueue.microtask_names(), vec!["m"]);
    let ran = run.trace.last().unwrap();
    assert!(ran.microtasks.is_empty());
}

#[test]
fn test_then_runs_after_synchronous_code() {
    let run = run("Promise.resolve(1).then(function h(v){ console.log(v); }); console.log('sync');");
    assert_eq!(console_output(&run), vec!["sync", "1"]);
    assert_eq!(
        events(&run),
        vec!["start", "enqueue microtask h", "push h", "pop h", "ran microtask h"]
    );
}

#[test]
fn test_classic_ordering() {
    let run = run(
        "console.log('1');\n\
         setTimeout(function timeout(){ console.log('4'); }, 0);\n\
         Promise.resolve().then(function micro(){ console.log('3'); });\n\
         console.log('2');",
    );
    assert_eq!(console_output(&run), vec!["1", "2", "3", "4"]);
}

#[test]
fn test_then_chain_passes_values() {
    let run = run(
        "Promise.resolve(1)\n\
           .then(function a(v){ return v + 1; })\n\
           .then(function b(v){ console.log(v); });",
    );
    assert_eq!(console_output(&run), vec!["2"]);
    assert_eq!(microtasks_run(&run), vec!["a", "b"]);

    // b is only queued once a's derived promise settles
    let queued_b = position(&run, "enqueue microtask b").unwrap();
    assert!(position(&run, "pop a").unwrap() < queued_b);
    assert!(queued_b < position(&run, "ran microtask a").unwrap());
}

#[test]
fn test_microtask_queued_by_task_runs_before_next_task() {
    let run = run(
        "setTimeout(function first(){ queueMicrotask(function inner(){ console.log('inner'); }); }, 0);\n\
         setTimeout(function second(){ console.log('second'); }, 0);",
    );
    assert_eq!(console_output(&run), vec!["inner", "second"]);
    assert_eq!(tasks_run(&run), vec!["first", "second"]);
}

#[test]
fn test_microtask_queued_while_draining_runs_in_same_drain() {
    let run = run(
        "setTimeout(function task(){}, 0);\n\
         queueMicrotask(function outer(){ queueMicrotask(function nested(){}); });",
    );
    assert_eq!(microtasks_run(&run), vec!["outer", "nested"]);
    assert!(position(&run, "ran microtask nested").unwrap() < position(&run, "push task").unwrap());
}

/// Four-link chain that logs one letter per microtask, used as a clock for
/// the chain under test
const LETTERS: &str = "Promise.resolve()\n\
   .then(function b(){ console.log('b'); })\n\
   .then(function c(){ console.log('c'); })\n\
   .then(function d(){ console.log('d'); })\n\
   .then(function e(){ console.log('e'); });";

#[test]
fn test_returned_promise_is_adopted() {
    let run = run(
        "Promise.resolve(1)\n\
           .then(function(){ return Promise.resolve(5); })\n\
           .then(function(v){ console.log(v); });",
    );
    assert_eq!(console_output(&run), vec!["5"]);
}

#[test]
fn test_adoption_takes_two_extra_microtasks() {
    let source = format!(
        "Promise.resolve(1)\n\
           .then(function inner(){{ return Promise.resolve(5); }})\n\
           .then(function adopted(v){{ console.log('adopted ' + v); }});\n{}",
        LETTERS
    );
    let run = run(&source);

    assert_eq!(console_output(&run), vec!["b", "c", "d", "adopted 5", "e"]);
    assert_eq!(
        microtasks_run(&run),
        vec!["inner", "b", "resolveThenable", "c", "then", "d", "adopted", "e"]
    );
}

#[test]
fn test_finally_passes_value_through() {
    let run = run(
        "Promise.resolve(7)\n\
           .finally(function f(){ console.log('fin'); })\n\
           .then(function(v){ console.log(v); });",
    );
    assert_eq!(console_output(&run), vec!["fin", "7"]);
}

#[test]
fn test_finally_waits_before_passing_value_on() {
    let source = format!(
        "Promise.resolve(7)\n\
           .finally(function f(){{ console.log('fin'); }})\n\
           .then(function after(v){{ console.log('after ' + v); }});\n{}",
        LETTERS
    );
    let run = run(&source);

    assert_eq!(console_output(&run), vec!["fin", "b", "c", "d", "after 7", "e"]);
    assert_eq!(
        microtasks_run(&run),
        vec!["f", "b", "finally", "resolveThenable", "c", "then", "d", "after", "e"]
    );
}

#[test]
fn test_catch_handler_is_skipped() {
    let run = run(
        "Promise.resolve(3)\n\
           .catch(function c(){ console.log('never'); })\n\
           .then(function(v){ console.log(v); });",
    );
    assert_eq!(console_output(&run), vec!["3"]);
    assert!(position(&run, "push c").is_none());
}

#[test]
fn test_then_on_settled_promise_variable() {
    let run = run(
        "var p = Promise.resolve('x');\n\
         p.then(function one(v){ console.log(v + 1); });\n\
         p.then(function two(v){ console.log(v + 2); });",
    );
    assert_eq!(console_output(&run), vec!["x1", "x2"]);
}

#[test]
fn test_promise_resolved_with_itself_stays_pending() {
    let run = run(
        "var p = Promise.resolve(1).then(function loop(){ return p; });\n\
         setTimeout(function show(){ console.log(p); }, 0);",
    );
    assert_eq!(console_output(&run), vec!["Promise { <pending> }"]);
    assert_eq!(microtasks_run(&run), vec!["loop"]);
    assert_eq!(tasks_run(&run), vec!["show"]);
}
