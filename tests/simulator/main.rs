//! Integration tests for the simulator, organized by feature
//!
//! These tests exercise the simulator through the public API and check the
//! recorded trace, console output and diagnostics.

mod call_stack;
mod console;
mod diagnostics;
mod microtasks;
mod properties;
mod scopes;
mod session;
mod timers;

use looptrace::{Diagnostic, Run, SimConfig, StepEvent, simulate};

/// Simulate with default settings, panicking on syntax errors
#[allow(clippy::expect_used)]
pub fn run(source: &str) -> Run {
    simulate(source, &SimConfig::default()).expect("source should parse")
}

#[allow(clippy::expect_used)]
pub fn run_with(source: &str, config: SimConfig) -> Run {
    simulate(source, &config).expect("source should parse")
}

/// Human-readable event labels, e.g. `push a`, `ran task tick`
pub fn events(run: &Run) -> Vec<String> {
    run.trace.iter().map(|step| step.event.label()).collect()
}

pub fn console_output(run: &Run) -> Vec<String> {
    run.console.iter().map(|line| line.text.clone()).collect()
}

/// Names of tasks in the order they ran
pub fn tasks_run(run: &Run) -> Vec<String> {
    run.trace
        .iter()
        .filter_map(|step| match &step.event {
            StepEvent::TaskRun { name, .. } => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

/// Names of microtasks in the order they ran
pub fn microtasks_run(run: &Run) -> Vec<String> {
    run.trace
        .iter()
        .filter_map(|step| match &step.event {
            StepEvent::MicrotaskRun { name, .. } => Some(name.to_string()),
            _ => None,
        })
        .collect()
}

pub fn diagnostic_names(run: &Run) -> Vec<&'static str> {
    run.diagnostics.iter().map(Diagnostic::name).collect()
}

/// Index of the first step whose event label equals `label`
pub fn position(run: &Run, label: &str) -> Option<usize> {
    events(run).iter().position(|event| event == label)
}
