//! setTimeout, clearTimeout and queueMicrotask

use tracing::debug;

use super::{call_node, callback_name};
use crate::ast::{CallExpression, Expression, UnaryOp};
use crate::diagnostic::DiagnosticKind;
use crate::interpreter::Interpreter;
use crate::scheduler::{Microtask, MicrotaskJob, Task};
use crate::trace::{Halt, StepEvent};
use crate::value::Value;

impl Interpreter {
    /// `setTimeout(callback, delay, ...args)`. The delay only orders the
    /// task; it is taken from a literal argument and is 0 otherwise.
    pub(super) fn set_timeout(
        &mut self,
        args: Vec<Value>,
        site: Option<&CallExpression>,
    ) -> Result<Value, Halt> {
        let mut args = args.into_iter();
        let callback = args.next().unwrap_or(Value::Undefined);
        let delay_arg = args.next();

        if !callback.is_callable() {
            self.report(
                DiagnosticKind::InvalidCallback { source: "setTimeout" },
                site.map(|call| call.span),
            );
            return Ok(Value::Undefined);
        }

        let delay = match site {
            Some(call) => literal_delay(call.arguments.get(1)),
            None => delay_arg.map(|value| value.to_number()).unwrap_or(0.0),
        };
        let delay = if delay.is_finite() && delay > 0.0 { delay } else { 0.0 };

        let id = self.context.tasks.next_id();
        let name = callback_name(&callback);
        debug!(task = %name, delay, id, "enqueue task");

        self.context.tasks.enqueue(Task {
            id,
            name: name.clone(),
            delay,
            callback,
            args: args.collect(),
        });
        self.record(StepEvent::TaskEnqueued { name, delay }, call_node(site))?;

        Ok(Value::Number(id as f64))
    }

    /// `clearTimeout(id)`. Unknown or already-run ids are ignored.
    pub(super) fn clear_timeout(
        &mut self,
        args: &[Value],
        site: Option<&CallExpression>,
    ) -> Result<(), Halt> {
        let id = args.first().map(Value::to_number).unwrap_or(f64::NAN);
        if !(id >= 1.0 && id.fract() == 0.0 && id <= u64::MAX as f64) {
            return Ok(());
        }

        if let Some(task) = self.context.tasks.cancel(id as u64) {
            debug!(task = %task.name, id = task.id, "cancel task");
            self.record(StepEvent::TaskCancelled { name: task.name }, call_node(site))?;
        }
        Ok(())
    }

    /// `queueMicrotask(callback)`
    pub(super) fn queue_microtask(
        &mut self,
        args: Vec<Value>,
        site: Option<&CallExpression>,
    ) -> Result<(), Halt> {
        let callback = args.into_iter().next().unwrap_or(Value::Undefined);
        if !callback.is_callable() {
            self.report(
                DiagnosticKind::InvalidCallback {
                    source: "queueMicrotask",
                },
                site.map(|call| call.span),
            );
            return Ok(());
        }

        let name = callback_name(&callback);
        debug!(microtask = %name, "enqueue microtask");
        self.context.microtasks.enqueue(Microtask {
            name: name.clone(),
            job: MicrotaskJob::Callback { callback },
        });
        self.record(StepEvent::MicrotaskEnqueued { name }, call_node(site))
    }
}

/// Delay written as a literal (`100`, `-5`, `"10"`), or 0
fn literal_delay(arg: Option<&Expression>) -> f64 {
    match arg {
        Some(Expression::Literal(lit)) => literal_number(&lit.value),
        Some(Expression::Unary(unary)) if unary.operator == UnaryOp::Minus => match unary.argument.as_ref() {
            Expression::Literal(lit) => -literal_number(&lit.value),
            _ => 0.0,
        },
        _ => 0.0,
    }
}

fn literal_number(value: &crate::ast::LiteralValue) -> f64 {
    use crate::ast::LiteralValue;

    match value {
        LiteralValue::Null => 0.0,
        LiteralValue::Boolean(b) => f64::from(u8::from(*b)),
        LiteralValue::Number(n) => *n,
        LiteralValue::String(s) => Value::String(s.clone()).to_number(),
    }
}
