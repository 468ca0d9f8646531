//! Promise.resolve and the then/catch/finally reaction machinery
//!
//! Promises only ever fulfil in this subset. A reaction is queued as a
//! microtask as soon as its source promise is fulfilled; running it calls the
//! handler and settles the derived promise with the result.
//!
//! Job order follows real engines. Resolving a promise with another promise
//! queues a `resolveThenable` job, which subscribes to the inner promise, so
//! adoption costs two microtasks. `finally` resolves its callback's result,
//! chains a restore reaction onto it and adopts that, which costs three more
//! microtasks before the derived promise settles.

use tracing::debug;

use super::callback_name;
use crate::interpreter::Interpreter;
use crate::scheduler::{Microtask, MicrotaskJob};
use crate::trace::{Halt, StepEvent};
use crate::value::{JsString, PromiseId, Reaction, ReactionHandler, ReactionKind, Value};

impl Interpreter {
    /// `Promise.resolve(value)`; a promise argument is returned unchanged
    pub(super) fn promise_resolve(&mut self, args: Vec<Value>) -> Value {
        let value = args.into_iter().next().unwrap_or(Value::Undefined);
        Value::Promise(self.to_promise(value))
    }

    fn to_promise(&mut self, value: Value) -> PromiseId {
        match value {
            Value::Promise(id) => id,
            other => self.context.promises.create_fulfilled(other),
        }
    }

    /// `p.then(handler)`, `p.catch(handler)` and `p.finally(handler)`
    pub(super) fn promise_then(
        &mut self,
        source: PromiseId,
        kind: ReactionKind,
        args: Vec<Value>,
    ) -> Result<Value, Halt> {
        let handler = match args.into_iter().next().filter(Value::is_callable) {
            Some(callback) => ReactionHandler::Callback(callback),
            None => ReactionHandler::PassThrough,
        };
        let derived = self.context.promises.create_pending();
        self.subscribe(
            source,
            Reaction {
                kind,
                handler,
                derived,
            },
        )?;
        Ok(Value::Promise(derived))
    }

    /// Attach `reaction` to `source`, queueing it at once when `source` has
    /// already settled
    fn subscribe(&mut self, source: PromiseId, reaction: Reaction) -> Result<(), Halt> {
        match self.context.promises.subscribe(source, reaction.clone()) {
            Some(value) => self.enqueue_reaction(reaction, value),
            None => Ok(()),
        }
    }

    pub(crate) fn enqueue_reaction(&mut self, reaction: Reaction, value: Value) -> Result<(), Halt> {
        let name = match reaction.callback() {
            Some(handler) => callback_name(handler),
            None => JsString::from(reaction.kind.as_str()),
        };
        debug!(microtask = %name, kind = reaction.kind.as_str(), "enqueue reaction");

        self.context.microtasks.enqueue(Microtask {
            name: name.clone(),
            job: MicrotaskJob::Reaction { reaction, value },
        });
        self.record(StepEvent::MicrotaskEnqueued { name }, None)
    }

    /// Body of a reaction microtask
    pub(crate) fn run_reaction(&mut self, reaction: Reaction, value: Value) -> Result<(), Halt> {
        let result = match (reaction.kind, reaction.handler) {
            (ReactionKind::Then, ReactionHandler::Callback(handler)) => {
                self.call_value(&handler, vec![value])?
            }
            (ReactionKind::Finally, ReactionHandler::Callback(handler)) => {
                let outcome = self.call_value(&handler, Vec::new())?;
                self.restore_after(outcome, value)?
            }
            (_, ReactionHandler::Restore(saved)) => saved,
            // Nothing rejects, so catch handlers never run
            _ => value,
        };
        self.resolve_promise(reaction.derived, result)
    }

    /// `Promise.resolve(outcome).then(() => value)`: the promise `finally`
    /// hands on once its callback's result has settled
    fn restore_after(&mut self, outcome: Value, value: Value) -> Result<Value, Halt> {
        let waited = self.to_promise(outcome);
        let restored = self.context.promises.create_pending();
        self.subscribe(
            waited,
            Reaction {
                kind: ReactionKind::Finally,
                handler: ReactionHandler::Restore(value),
                derived: restored,
            },
        )?;
        Ok(Value::Promise(restored))
    }

    /// Settle `id` with `value`. A promise value is adopted through a
    /// `resolveThenable` job.
    fn resolve_promise(&mut self, id: PromiseId, value: Value) -> Result<(), Halt> {
        if let Value::Promise(thenable) = value {
            // Resolving a promise with itself would reject; it stays pending
            if thenable == id {
                debug!(promise = ?id, "promise resolved with itself");
                return Ok(());
            }
            let name = JsString::from("resolveThenable");
            debug!(microtask = %name, "enqueue thenable job");
            self.context.microtasks.enqueue(Microtask {
                name: name.clone(),
                job: MicrotaskJob::ResolveThenable {
                    promise: id,
                    thenable,
                },
            });
            return self.record(StepEvent::MicrotaskEnqueued { name }, None);
        }

        for reaction in self.context.promises.fulfill(id, value.clone()) {
            self.enqueue_reaction(reaction, value.clone())?;
        }
        Ok(())
    }

    /// Body of a `resolveThenable` job: `promise` follows `thenable`
    pub(crate) fn resolve_thenable(&mut self, promise: PromiseId, thenable: PromiseId) -> Result<(), Halt> {
        self.subscribe(
            thenable,
            Reaction {
                kind: ReactionKind::Then,
                handler: ReactionHandler::PassThrough,
                derived: promise,
            },
        )
    }
}
