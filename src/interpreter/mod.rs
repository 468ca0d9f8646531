//! Evaluator for the supported JavaScript subset
//!
//! The interpreter walks the AST directly. Calls push and pop frames on an
//! explicit call stack, timers and microtasks are queued instead of run, and
//! every state change is recorded as a step. After the synchronous program
//! finishes, [`event_loop`] drains the queues.

pub mod builtins;
pub mod event_loop;

use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ast::{
    AssignmentExpression, AssignmentOp, BinaryOp, CallExpression, Expression, FunctionBody,
    LiteralValue, LogicalOp, NodeRef, Program, Statement, UnaryOp, UpdateExpression, UpdateOp,
    VariableDeclaration,
};
use crate::config::SimConfig;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::lexer::Span;
use crate::platform::{ConsoleLevel, ConsoleProvider, StdConsoleProvider};
use crate::scheduler::{LogicalClock, MicrotaskQueue, TaskQueue};
use crate::stack::ensure_sufficient_stack;
use crate::trace::{self, ExecutionTrace, Halt, StepEvent, TraceRecorder};
use crate::value::{Builtin, Callable, EnvId, Environments, JsString, Promises, Value};

/// Mutable state of one run: what snapshots observe plus the scope and
/// promise arenas
#[derive(Debug, Default)]
pub struct ExecutionContext {
    pub call_stack: Vec<JsString>,
    pub environments: Environments,
    pub tasks: TaskQueue,
    pub microtasks: MicrotaskQueue,
    pub promises: Promises,
    pub clock: LogicalClock,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Completion record for statements
#[derive(Debug)]
pub enum Completion {
    Normal,
    Return(Value),
}

/// One line of `console.*` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
    /// Index of the most recent step when the line was written
    pub step: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Both queues drained
    Completed,
    /// The step limit stopped the run
    Truncated,
}

/// Everything one run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub trace: ExecutionTrace,
    pub diagnostics: Vec<Diagnostic>,
    pub console: Vec<ConsoleLine>,
    pub outcome: RunOutcome,
    /// Logical clock at the end of the run
    pub clock: f64,
}

impl Run {
    pub fn is_truncated(&self) -> bool {
        self.outcome == RunOutcome::Truncated
    }
}

/// The evaluator. One instance runs one program.
pub struct Interpreter {
    pub(crate) context: ExecutionContext,
    recorder: TraceRecorder,
    diagnostics: Vec<Diagnostic>,
    console: Vec<ConsoleLine>,
    console_provider: Box<dyn ConsoleProvider>,
    echo_console: bool,
    max_call_depth: usize,
}

impl Interpreter {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            context: ExecutionContext::new(),
            recorder: TraceRecorder::new(config.max_steps),
            diagnostics: Vec::new(),
            console: Vec::new(),
            console_provider: Box::new(StdConsoleProvider::new()),
            echo_console: config.echo_console,
            max_call_depth: config.max_call_depth,
        }
    }

    /// Replace the provider that receives echoed console output
    pub fn with_console_provider(mut self, provider: Box<dyn ConsoleProvider>) -> Self {
        self.console_provider = provider;
        self
    }

    /// Evaluate `program`, drain the event loop and return the recorded run
    #[tracing::instrument(skip_all, fields(statements = program.body.len()))]
    pub fn run(mut self, program: &Program) -> Run {
        let outcome = match self.run_to_completion(program) {
            Ok(()) => RunOutcome::Completed,
            Err(Halt) => {
                let limit = self.recorder.len();
                self.report(DiagnosticKind::StepLimitReached { limit }, None);
                RunOutcome::Truncated
            }
        };

        info!(
            steps = self.recorder.len(),
            diagnostics = self.diagnostics.len(),
            ?outcome,
            "simulation finished"
        );

        Run {
            clock: self.context.clock.now(),
            trace: self.recorder.into_trace(),
            diagnostics: self.diagnostics,
            console: self.console,
            outcome,
        }
    }

    fn run_to_completion(&mut self, program: &Program) -> Result<(), Halt> {
        self.record(StepEvent::Start, None)?;
        let global = self.context.environments.global();
        self.execute_body(&program.body, global)?;
        self.run_event_loop()
    }

    // ============ RECORDING ============

    pub(crate) fn record(&mut self, event: StepEvent, node: Option<NodeRef>) -> Result<(), Halt> {
        let step = trace::snapshot(&self.context, event, node);
        self.recorder.record(step).map(|_| ())
    }

    /// Number of steps recorded so far
    pub(crate) fn step_count(&self) -> usize {
        self.recorder.len()
    }

    pub(crate) fn report(&mut self, kind: DiagnosticKind, span: Option<Span>) {
        let diagnostic = Diagnostic::new(kind, span, self.recorder.last_index());
        warn!(
            kind = diagnostic.name(),
            step = diagnostic.step,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn write_console(&mut self, level: ConsoleLevel, text: String) {
        if self.echo_console {
            self.console_provider.write(level, &text);
        }
        self.console.push(ConsoleLine {
            level,
            text,
            step: self.recorder.last_index(),
        });
    }

    // ============ STATEMENTS ============

    /// Execute a statement list, binding its function declarations first
    fn execute_body(&mut self, body: &[Statement], env: EnvId) -> Result<Completion, Halt> {
        self.hoist_functions(body, env);

        for stmt in body {
            if let Completion::Return(value) = self.execute(stmt, env)? {
                return Ok(Completion::Return(value));
            }
        }
        Ok(Completion::Normal)
    }

    fn hoist_functions(&mut self, body: &[Statement], env: EnvId) {
        for stmt in body {
            if let Statement::FunctionDeclaration(func) = stmt {
                let Some(id) = &func.id else {
                    continue;
                };
                let callable = Callable::new(None, Rc::clone(func), env);
                self.context
                    .environments
                    .declare(env, id.name.clone(), Value::Function(Rc::new(callable)));
            }
        }
    }

    pub fn execute(&mut self, stmt: &Statement, env: EnvId) -> Result<Completion, Halt> {
        ensure_sufficient_stack(|| self.execute_statement(stmt, env))
    }

    fn execute_statement(&mut self, stmt: &Statement, env: EnvId) -> Result<Completion, Halt> {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                self.execute_variable_declaration(decl, env)?;
                Ok(Completion::Normal)
            }
            // Bound when the enclosing body was entered
            Statement::FunctionDeclaration(_) => Ok(Completion::Normal),
            Statement::Expression(stmt) => {
                self.evaluate(&stmt.expression, env)?;
                Ok(Completion::Normal)
            }
            Statement::Return(ret) => {
                let value = match &ret.argument {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Block(block) => self.execute_body(&block.body, env),
            Statement::Empty(_) => Ok(Completion::Normal),
            Statement::Unsupported(node) => {
                self.report(DiagnosticKind::UnhandledNodeKind { kind: node.kind }, Some(node.span));
                Ok(Completion::Normal)
            }
        }
    }

    fn execute_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
        env: EnvId,
    ) -> Result<(), Halt> {
        for declarator in &decl.declarations {
            let value = match &declarator.init {
                Some(init) => self.evaluate_named(init, &declarator.id.name, env)?,
                None => Value::Undefined,
            };
            self.context
                .environments
                .declare(env, declarator.id.name.clone(), value);
        }
        Ok(())
    }

    // ============ EXPRESSIONS ============

    /// Evaluate an expression whose value is bound to `name`, so anonymous
    /// functions take the binding's name
    fn evaluate_named(&mut self, expr: &Expression, name: &JsString, env: EnvId) -> Result<Value, Halt> {
        match expr {
            Expression::Function(func) if func.id.is_none() => {
                let callable = Callable::new(Some(name.clone()), Rc::clone(func), env);
                Ok(Value::Function(Rc::new(callable)))
            }
            _ => self.evaluate(expr, env),
        }
    }

    /// Evaluate `expr`. Each nested call of a JS function recurses through
    /// here, so the native stack grows on demand.
    pub fn evaluate(&mut self, expr: &Expression, env: EnvId) -> Result<Value, Halt> {
        ensure_sufficient_stack(|| self.evaluate_expression(expr, env))
    }

    fn evaluate_expression(&mut self, expr: &Expression, env: EnvId) -> Result<Value, Halt> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.value {
                LiteralValue::Null => Value::Null,
                LiteralValue::Boolean(b) => Value::Boolean(*b),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::String(s) => Value::String(s.clone()),
            }),

            Expression::Identifier(id) => Ok(self.lookup(&id.name, env)),

            Expression::Function(func) => {
                let callable = Callable::new(None, Rc::clone(func), env);
                Ok(Value::Function(Rc::new(callable)))
            }

            Expression::Unary(unary) => {
                let result = match unary.operator {
                    UnaryOp::Minus => Value::Number(-self.evaluate(&unary.argument, env)?.to_number()),
                    UnaryOp::Plus => Value::Number(self.evaluate(&unary.argument, env)?.to_number()),
                    UnaryOp::Not => Value::Boolean(!self.evaluate(&unary.argument, env)?.to_boolean()),
                    UnaryOp::Typeof => {
                        Value::from(self.evaluate(&unary.argument, env)?.type_of())
                    }
                    UnaryOp::BitNot | UnaryOp::Void | UnaryOp::Delete => {
                        self.report(
                            DiagnosticKind::UnsupportedOperator {
                                operator: unary.operator.as_str(),
                            },
                            Some(unary.span),
                        );
                        Value::Undefined
                    }
                };
                Ok(result)
            }

            Expression::Binary(bin) => {
                let left = self.evaluate(&bin.left, env)?;
                let right = self.evaluate(&bin.right, env)?;
                match binary_op(bin.operator, &left, &right) {
                    Some(value) => Ok(value),
                    None => {
                        self.report(
                            DiagnosticKind::UnsupportedOperator {
                                operator: bin.operator.as_str(),
                            },
                            Some(bin.span),
                        );
                        Ok(Value::Undefined)
                    }
                }
            }

            Expression::Logical(logical) => {
                let left = self.evaluate(&logical.left, env)?;
                let short_circuit = match logical.operator {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                    LogicalOp::NullishCoalescing => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(&logical.right, env)
                }
            }

            Expression::Conditional(cond) => {
                if self.evaluate(&cond.test, env)?.to_boolean() {
                    self.evaluate(&cond.consequent, env)
                } else {
                    self.evaluate(&cond.alternate, env)
                }
            }

            Expression::Assignment(assign) => self.evaluate_assignment(assign, env),

            Expression::Update(update) => Ok(self.evaluate_update(update, env)),

            Expression::Sequence(seq) => {
                let mut result = Value::Undefined;
                for expr in &seq.expressions {
                    result = self.evaluate(expr, env)?;
                }
                Ok(result)
            }

            Expression::Member(member) => {
                let object = self.evaluate(&member.object, env)?;
                Ok(get_property(&object, member.property.name.as_str()))
            }

            Expression::Call(call) => self.evaluate_call(call, env),

            Expression::Unsupported(node) => {
                self.report(DiagnosticKind::UnhandledNodeKind { kind: node.kind }, Some(node.span));
                Ok(Value::Undefined)
            }
        }
    }

    fn lookup(&self, name: &JsString, env: EnvId) -> Value {
        if let Some(value) = self.context.environments.lookup(env, name.as_str()) {
            return value.clone();
        }
        if let Some(builtin) = Builtin::global(name.as_str()) {
            return Value::Builtin(builtin);
        }
        match name.as_str() {
            "NaN" => Value::Number(f64::NAN),
            "Infinity" => Value::Number(f64::INFINITY),
            _ => Value::Undefined,
        }
    }

    fn evaluate_assignment(&mut self, assign: &AssignmentExpression, env: EnvId) -> Result<Value, Halt> {
        let value = match assign.operator {
            AssignmentOp::Assign => self.evaluate_named(&assign.value, &assign.target.name, env)?,
            op => {
                let Some(bin_op) = op.binary_op() else {
                    self.report(
                        DiagnosticKind::UnsupportedOperator {
                            operator: op.as_str(),
                        },
                        Some(assign.span),
                    );
                    return Ok(Value::Undefined);
                };
                let current = self.lookup(&assign.target.name, env);
                let right = self.evaluate(&assign.value, env)?;
                binary_op(bin_op, &current, &right).unwrap_or(Value::Undefined)
            }
        };

        self.context
            .environments
            .assign(env, &assign.target.name, value.clone());
        Ok(value)
    }

    fn evaluate_update(&mut self, update: &UpdateExpression, env: EnvId) -> Value {
        let old = self.lookup(&update.target.name, env).to_number();
        let new = match update.operator {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.context
            .environments
            .assign(env, &update.target.name, Value::Number(new));
        Value::Number(if update.prefix { new } else { old })
    }

    fn evaluate_call(&mut self, call: &CallExpression, env: EnvId) -> Result<Value, Halt> {
        let callee = self.evaluate(&call.callee, env)?;
        if !callee.is_callable() {
            self.report(
                DiagnosticKind::UnresolvedCallee {
                    name: call.callee_name(),
                },
                Some(call.span),
            );
            return Ok(Value::Undefined);
        }

        let mut args = Vec::with_capacity(call.arguments.len());
        for arg in &call.arguments {
            args.push(self.evaluate(arg, env)?);
        }

        match callee {
            Value::Builtin(builtin) => self.call_builtin(builtin, args, call),
            other => self.call_value(&other, args),
        }
    }

    /// Call a user function or a builtin that does not depend on the call
    /// site (used for queued callbacks)
    pub(crate) fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, Halt> {
        match callee {
            Value::Function(callable) => self.call_function(Rc::clone(callable), args),
            Value::Builtin(builtin) => self.call_builtin_detached(*builtin, args),
            _ => Ok(Value::Undefined),
        }
    }

    /// Invoke a user function: push a frame, run the body in a fresh scope,
    /// pop the frame. Entry and exit are both recorded.
    pub(crate) fn call_function(&mut self, callable: Rc<Callable>, args: Vec<Value>) -> Result<Value, Halt> {
        let node = callable.function.node_ref();

        if self.context.call_stack.len() >= self.max_call_depth {
            self.report(
                DiagnosticKind::CallDepthExceeded {
                    depth: self.max_call_depth,
                },
                Some(node.span),
            );
            return Ok(Value::Undefined);
        }

        let frame = callable.name.clone();
        self.context.call_stack.push(frame.clone());
        debug!(frame = %frame, depth = self.context.call_stack.len(), "push frame");
        self.record(StepEvent::Push { frame: frame.clone() }, Some(node))?;

        let scope = self.context.environments.create(callable.closure);
        let mut args = args.into_iter();
        for param in &callable.function.params {
            let value = args.next().unwrap_or(Value::Undefined);
            self.context
                .environments
                .declare(scope, param.name.clone(), value);
        }

        let result = match &callable.function.body {
            FunctionBody::Block(block) => match self.execute_body(&block.body, scope)? {
                Completion::Return(value) => value,
                Completion::Normal => Value::Undefined,
            },
            FunctionBody::Expression(expr) => self.evaluate(expr, scope)?,
        };

        self.context.call_stack.pop();
        debug!(frame = %frame, depth = self.context.call_stack.len(), "pop frame");
        self.record(StepEvent::Pop { frame }, Some(node))?;

        Ok(result)
    }
}

/// Apply a binary operator. `None` means the operator is not supported.
fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Option<Value> {
    let value = match op {
        BinaryOp::Add => {
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                let mut s = left.to_js_string().to_string();
                s.push_str(right.to_js_string().as_str());
                Value::String(JsString::from(s))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::StrictEq => Value::Boolean(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Boolean(!left.strict_equals(right)),
        BinaryOp::Eq => Value::Boolean(left.loose_equals(right)),
        BinaryOp::NotEq => Value::Boolean(!left.loose_equals(right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            Value::Boolean(compare(op, left, right))
        }
        BinaryOp::Exp
        | BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LShift
        | BinaryOp::RShift
        | BinaryOp::URShift
        | BinaryOp::In
        | BinaryOp::Instanceof => return None,
    };
    Some(value)
}

/// Relational comparison: strings compare by code units, everything else
/// numerically (NaN compares false)
fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        let ordering = a.as_str().encode_utf16().cmp(b.as_str().encode_utf16());
        return match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::LtEq => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            _ => ordering.is_ge(),
        };
    }

    let (a, b) = (left.to_number(), right.to_number());
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}

/// Named property lookup on the values that have properties in this subset
fn get_property(object: &Value, property: &str) -> Value {
    match object {
        Value::Builtin(builtin) => builtin
            .member(property)
            .map(Value::Builtin)
            .unwrap_or(Value::Undefined),
        Value::Promise(id) => match property {
            "then" => Value::Builtin(Builtin::PromiseThen(*id)),
            "catch" => Value::Builtin(Builtin::PromiseCatch(*id)),
            "finally" => Value::Builtin(Builtin::PromiseFinally(*id)),
            _ => Value::Undefined,
        },
        Value::String(s) if property == "length" => {
            Value::Number(s.as_str().encode_utf16().count() as f64)
        }
        Value::Function(callable) if property == "name" => Value::String(callable.name.clone()),
        _ => Value::Undefined,
    }
}
