//! Execution snapshots and the append-only trace they form
//!
//! A snapshot copies the call stack and both queues out of the live
//! [`ExecutionContext`]. Recorded steps are never mutated afterwards.

use serde::Serialize;

use crate::ast::NodeRef;
use crate::interpreter::ExecutionContext;
use crate::scheduler::TaskEntry;
use crate::value::JsString;

/// The state transition a step records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StepEvent {
    /// Initial state before any statement runs
    Start,
    Push { frame: JsString },
    Pop { frame: JsString },
    TaskEnqueued { name: JsString, delay: f64 },
    TaskCancelled { name: JsString },
    MicrotaskEnqueued { name: JsString },
    /// A microtask finished. `first_step` is the first step it produced,
    /// or this step itself when it produced none.
    MicrotaskRun { name: JsString, first_step: usize },
    /// A task finished; `first_step` as for `MicrotaskRun`
    TaskRun { name: JsString, first_step: usize },
}

impl StepEvent {
    pub fn label(&self) -> String {
        match self {
            StepEvent::Start => "start".to_string(),
            StepEvent::Push { frame } => format!("push {}", frame),
            StepEvent::Pop { frame } => format!("pop {}", frame),
            StepEvent::TaskEnqueued { name, delay } => {
                format!("enqueue task {} ({}ms)", name, crate::value::number_to_string(*delay))
            }
            StepEvent::TaskCancelled { name } => format!("cancel task {}", name),
            StepEvent::MicrotaskEnqueued { name } => format!("enqueue microtask {}", name),
            StepEvent::MicrotaskRun { name, .. } => format!("ran microtask {}", name),
            StepEvent::TaskRun { name, .. } => format!("ran task {}", name),
        }
    }
}

/// Immutable snapshot of the simulator at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStep {
    pub event: StepEvent,
    /// Frame labels, bottom of the stack first
    pub call_stack: Vec<JsString>,
    /// Pending tasks in the order they will run
    pub tasks: Vec<TaskEntry>,
    /// Pending microtasks, head first
    pub microtasks: Vec<JsString>,
    /// Node active at this step, for highlighting
    pub node: Option<NodeRef>,
    /// Logical clock value
    pub clock: f64,
}

impl ExecutionStep {
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.call_stack.iter().map(JsString::as_str).collect()
    }

    pub fn microtask_names(&self) -> Vec<&str> {
        self.microtasks.iter().map(JsString::as_str).collect()
    }
}

/// Copy the observable state of `context` into a new step
pub fn snapshot(context: &ExecutionContext, event: StepEvent, node: Option<NodeRef>) -> ExecutionStep {
    ExecutionStep {
        event,
        call_stack: context.call_stack.clone(),
        tasks: context.tasks.entries(),
        microtasks: context.microtasks.names(),
        node,
        clock: context.clock.now(),
    }
}

/// Ordered steps of one run, indexed from 0
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExecutionTrace {
    steps: Vec<ExecutionStep>,
}

impl ExecutionTrace {
    pub fn get(&self, index: usize) -> Option<&ExecutionStep> {
        self.steps.get(index)
    }

    pub fn last(&self) -> Option<&ExecutionStep> {
        self.steps.last()
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExecutionTrace {
    type Item = &'a ExecutionStep;
    type IntoIter = std::slice::Iter<'a, ExecutionStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Returned when the step limit stops a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt;

/// Appends steps to a trace until the step limit is hit
#[derive(Debug)]
pub struct TraceRecorder {
    trace: ExecutionTrace,
    max_steps: usize,
}

impl TraceRecorder {
    pub fn new(max_steps: usize) -> Self {
        Self {
            trace: ExecutionTrace::default(),
            max_steps,
        }
    }

    /// Append a step, returning its index
    pub fn record(&mut self, step: ExecutionStep) -> Result<usize, Halt> {
        if self.trace.steps.len() >= self.max_steps {
            return Err(Halt);
        }
        self.trace.steps.push(step);
        Ok(self.trace.steps.len() - 1)
    }

    /// Number of steps recorded so far, which is also the index the next
    /// step will get
    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    /// Index of the most recent step (0 before anything is recorded)
    pub fn last_index(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }

    pub fn into_trace(self) -> ExecutionTrace {
        self.trace
    }
}
