//! Property tests over generated programs

use proptest::prelude::*;

use super::{run, tasks_run};
use looptrace::{Run, RunOutcome, Session, StepEvent};

#[derive(Debug, Clone)]
enum Op {
    Timeout(u8),
    Microtask,
    Call(u8),
    Promise,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..100).prop_map(Op::Timeout),
        Just(Op::Microtask),
        (0u8..3).prop_map(Op::Call),
        Just(Op::Promise),
    ]
}

/// Render ops as a program. Tasks queue microtasks and microtasks queue
/// tasks so both queues interleave.
fn program(ops: &[Op]) -> String {
    let mut source = String::from("function f0() {}\nfunction f1() { f0(); }\nfunction f2() { f1(); f0(); }\n");
    for (i, op) in ops.iter().enumerate() {
        let stmt = match op {
            Op::Timeout(delay) => format!(
                "setTimeout(function t{i}() {{ f1(); queueMicrotask(function n{i}() {{}}); }}, {delay});"
            ),
            Op::Microtask => format!(
                "queueMicrotask(function m{i}() {{ setTimeout(function mt{i}() {{}}, 5); }});"
            ),
            Op::Call(depth) => format!("f{depth}();"),
            Op::Promise => format!(
                "Promise.resolve({i}).then(function p{i}(v) {{ return v; }}).then(function q{i}() {{ f0(); }});"
            ),
        };
        source.push_str(&stmt);
        source.push('\n');
    }
    source
}

fn balanced(run: &Run) -> bool {
    let mut depth: usize = 0;
    for step in &run.trace {
        match step.event {
            StepEvent::Push { .. } => depth += 1,
            StepEvent::Pop { .. } => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
        if step.call_stack.len() != depth {
            return false;
        }
    }
    depth == 0
}

proptest! {
    #[test]
    fn prop_call_stack_is_balanced(ops in prop::collection::vec(op_strategy(), 0..12)) {
        let run = run(&program(&ops));
        prop_assert_eq!(run.outcome, RunOutcome::Completed);
        prop_assert!(balanced(&run));
        prop_assert!(run.diagnostics.is_empty());
    }

    #[test]
    fn prop_task_queue_is_sorted(ops in prop::collection::vec(op_strategy(), 0..12)) {
        let run = run(&program(&ops));
        for step in &run.trace {
            let delays: Vec<f64> = step.tasks.iter().map(|task| task.delay).collect();
            prop_assert!(delays.windows(2).all(|pair| pair.first() <= pair.get(1)));
        }
    }

    #[test]
    fn prop_microtasks_drained_before_each_task(ops in prop::collection::vec(op_strategy(), 0..12)) {
        let run = run(&program(&ops));
        for step in &run.trace {
            if let StepEvent::TaskRun { first_step, .. } = step.event {
                let before = run.trace.get(first_step - 1).unwrap();
                prop_assert!(before.microtasks.is_empty());
            }
        }
    }

    #[test]
    fn prop_clock_never_decreases(ops in prop::collection::vec(op_strategy(), 0..12)) {
        let run = run(&program(&ops));
        let clocks: Vec<f64> = run.trace.iter().map(|step| step.clock).collect();
        prop_assert!(clocks.windows(2).all(|pair| pair.first() <= pair.get(1)));
    }

    #[test]
    fn prop_top_level_timers_run_in_stable_delay_order(delays in prop::collection::vec(0u32..50, 0..10)) {
        let source: String = delays
            .iter()
            .enumerate()
            .map(|(i, delay)| format!("setTimeout(function t{i}() {{}}, {delay});\n"))
            .collect();

        let mut expected: Vec<(u32, usize)> = delays.iter().copied().zip(0..).collect();
        expected.sort_by_key(|&(delay, _)| delay);
        let expected: Vec<String> = expected.iter().map(|(_, i)| format!("t{i}")).collect();

        prop_assert_eq!(tasks_run(&run(&source)), expected);
    }

    #[test]
    fn prop_session_steps_are_monotonic(
        ops in prop::collection::vec(op_strategy(), 0..6),
        commands in prop::collection::vec(0u8..4, 0..40),
    ) {
        let mut session = Session::new();
        session.set_code(program(&ops));
        session.run().unwrap();

        let mut last = session.step_index();
        for command in commands {
            match command {
                0 | 1 => {
                    session.step();
                }
                2 => session.pause(),
                _ => {
                    session.reset();
                    prop_assert_eq!(&session, &Session::new());
                    session.set_code(program(&ops));
                    session.run().unwrap();
                    last = 0;
                }
            }
            prop_assert!(session.step_index() >= last);
            last = session.step_index();
        }
    }
}
