//! Host builtins: timers, microtasks, promises and console
//!
//! Builtins never run a callback directly. They queue work on the execution
//! context and record the queue mutation as a step.

mod console;
mod promise;
mod timers;

use crate::ast::{CallExpression, NodeRef};
use crate::interpreter::Interpreter;
use crate::trace::Halt;
use crate::value::{Builtin, JsString, ReactionKind, Value};

impl Interpreter {
    /// Call a builtin from a call expression in the source
    pub(crate) fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        call: &CallExpression,
    ) -> Result<Value, Halt> {
        self.dispatch_builtin(builtin, args, Some(call))
    }

    /// Call a builtin that was queued as a callback
    pub(crate) fn call_builtin_detached(&mut self, builtin: Builtin, args: Vec<Value>) -> Result<Value, Halt> {
        self.dispatch_builtin(builtin, args, None)
    }

    fn dispatch_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
        site: Option<&CallExpression>,
    ) -> Result<Value, Halt> {
        match builtin {
            Builtin::SetTimeout => self.set_timeout(args, site),
            Builtin::ClearTimeout => {
                self.clear_timeout(&args, site)?;
                Ok(Value::Undefined)
            }
            Builtin::QueueMicrotask => {
                self.queue_microtask(args, site)?;
                Ok(Value::Undefined)
            }
            Builtin::ConsoleMethod(level) => {
                self.console_method(level, &args);
                Ok(Value::Undefined)
            }
            Builtin::PromiseResolve => Ok(self.promise_resolve(args)),
            Builtin::PromiseThen(id) => self.promise_then(id, ReactionKind::Then, args),
            Builtin::PromiseCatch(id) => self.promise_then(id, ReactionKind::Catch, args),
            Builtin::PromiseFinally(id) => self.promise_then(id, ReactionKind::Finally, args),
            // Namespaces are rejected as callees before dispatch
            Builtin::Console | Builtin::Promise => Ok(Value::Undefined),
        }
    }
}

/// Label for a queued callback
pub(crate) fn callback_name(callback: &Value) -> JsString {
    match callback {
        Value::Function(callable) => callable.name.clone(),
        Value::Builtin(builtin) => JsString::from(builtin.name()),
        _ => JsString::from("anonymous"),
    }
}

/// Source node of a queued callback, for highlighting when it runs
pub(crate) fn callback_node(callback: &Value) -> Option<NodeRef> {
    match callback {
        Value::Function(callable) => Some(callable.function.node_ref()),
        _ => None,
    }
}

fn call_node(site: Option<&CallExpression>) -> Option<NodeRef> {
    site.map(|call| NodeRef::new("CallExpression", call.span))
}
