//! Stack growth for the recursive parser and evaluator

/// Free stack below which the stack is grown before recursing
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment
const STACK_SEGMENT: usize = 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if little stack is left
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, f)
}
