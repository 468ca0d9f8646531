//! Run-to-completion event loop
//!
//! After the synchronous program finishes: drain every microtask (including
//! ones queued while draining), then run the single lowest-delay task, and
//! repeat until both queues are empty.

use tracing::debug;

use super::Interpreter;
use super::builtins::callback_node;
use crate::scheduler::MicrotaskJob;
use crate::trace::{Halt, StepEvent};

impl Interpreter {
    pub(crate) fn run_event_loop(&mut self) -> Result<(), Halt> {
        loop {
            self.drain_microtasks()?;

            let Some(task) = self.context.tasks.dequeue() else {
                return Ok(());
            };
            self.context.clock.advance_to(task.delay);
            debug!(
                task = %task.name,
                delay = task.delay,
                clock = self.context.clock.now(),
                "run task"
            );

            let first_step = self.step_count();
            let node = callback_node(&task.callback);
            self.call_value(&task.callback, task.args)?;
            self.record(
                StepEvent::TaskRun {
                    name: task.name,
                    first_step,
                },
                node,
            )?;
        }
    }

    fn drain_microtasks(&mut self) -> Result<(), Halt> {
        while let Some(microtask) = self.context.microtasks.dequeue() {
            debug!(microtask = %microtask.name, "run microtask");

            let first_step = self.step_count();
            let node = match &microtask.job {
                MicrotaskJob::Callback { callback } => callback_node(callback),
                MicrotaskJob::Reaction { reaction, .. } => reaction.callback().and_then(callback_node),
                MicrotaskJob::ResolveThenable { .. } => None,
            };

            match microtask.job {
                MicrotaskJob::Callback { callback } => {
                    self.call_value(&callback, Vec::new())?;
                }
                MicrotaskJob::Reaction { reaction, value } => self.run_reaction(reaction, value)?,
                MicrotaskJob::ResolveThenable { promise, thenable } => {
                    self.resolve_thenable(promise, thenable)?
                }
            }

            self.record(
                StepEvent::MicrotaskRun {
                    name: microtask.name,
                    first_step,
                },
                node,
            )?;
        }
        Ok(())
    }
}
