//! Deterministic, steppable event-loop simulator for a JavaScript subset
//!
//! A program runs to completion in one pass. Every call-stack push and pop,
//! every task or microtask queue change and every queued invocation is
//! recorded as an [`ExecutionStep`], so the run can be played back one step
//! at a time through a [`Session`].
//!
//! # Example
//!
//! ```
//! use looptrace::{simulate, SimConfig};
//!
//! let run = simulate(
//!     "setTimeout(function slow() {}, 100); setTimeout(function fast() {}, 10);",
//!     &SimConfig::default(),
//! )
//! .unwrap();
//!
//! let last = run.trace.last().unwrap();
//! assert!(last.call_stack.is_empty());
//! assert_eq!(run.clock, 100.0);
//! ```

pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod platform;
pub mod scheduler;
pub mod session;
mod stack;
pub mod trace;
pub mod value;

pub use config::SimConfig;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::SimError;
pub use interpreter::{ConsoleLine, Interpreter, Run, RunOutcome};
pub use session::{Session, SessionStatus, SessionView};
pub use trace::{ExecutionStep, ExecutionTrace, StepEvent};
pub use value::JsString;

use parser::Parser;

/// Parse and run `source`, returning the full recorded run.
///
/// Only invalid configuration and syntax errors fail; everything the
/// evaluator cannot handle becomes a [`Diagnostic`] on the run.
pub fn simulate(source: &str, config: &SimConfig) -> Result<Run, SimError> {
    config.validate()?;
    let program = Parser::new(source).parse_program()?;
    Ok(Interpreter::new(config).run(&program))
}
