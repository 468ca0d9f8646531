//! Non-fatal problems found while evaluating a program
//!
//! Diagnostics never abort a run. The evaluator skips the offending node,
//! logs the diagnostic through `tracing` and keeps going.

use serde::Serialize;

use crate::lexer::Span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum DiagnosticKind {
    /// A node kind the evaluator does not implement
    UnhandledNodeKind { kind: &'static str },
    /// A call whose callee is not bound to anything callable
    UnresolvedCallee { name: String },
    UnsupportedOperator { operator: &'static str },
    /// A timer or microtask source was given something that cannot be called
    InvalidCallback { source: &'static str },
    CallDepthExceeded { depth: usize },
    StepLimitReached { limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Option<Span>,
    /// Index of the most recent recorded step when the problem occurred
    pub step: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Option<Span>, step: usize) -> Self {
        let message = match &kind {
            DiagnosticKind::UnhandledNodeKind { kind } => format!("Unhandled node type: {}", kind),
            DiagnosticKind::UnresolvedCallee { name } => format!("{} is not a function", name),
            DiagnosticKind::UnsupportedOperator { operator } => {
                format!("Unsupported operator '{}'", operator)
            }
            DiagnosticKind::InvalidCallback { source } => {
                format!("{}: callback is not a function", source)
            }
            DiagnosticKind::CallDepthExceeded { depth } => {
                format!("Maximum call depth of {} exceeded", depth)
            }
            DiagnosticKind::StepLimitReached { limit } => {
                format!("Step limit of {} reached, trace truncated", limit)
            }
        };
        Self {
            kind,
            message,
            span,
            step,
        }
    }

    /// Short name of the diagnostic kind
    pub fn name(&self) -> &'static str {
        match self.kind {
            DiagnosticKind::UnhandledNodeKind { .. } => "UnhandledNodeKind",
            DiagnosticKind::UnresolvedCallee { .. } => "UnresolvedCallee",
            DiagnosticKind::UnsupportedOperator { .. } => "UnsupportedOperator",
            DiagnosticKind::InvalidCallback { .. } => "InvalidCallback",
            DiagnosticKind::CallDepthExceeded { .. } => "CallDepthExceeded",
            DiagnosticKind::StepLimitReached { .. } => "StepLimitReached",
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.span {
            Some(span) => write!(
                f,
                "{}: {} at {}:{}",
                self.name(),
                self.message,
                span.line,
                span.column
            ),
            None => write!(f, "{}: {}", self.name(), self.message),
        }
    }
}
