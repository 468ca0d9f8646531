//! Runtime values, callables, the scope arena and promise state
//!
//! Everything here is owned by one interpreter instance. Scopes and promises
//! live in arenas addressed by index newtypes, so closures and reactions can
//! refer to them without reference cycles.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

use crate::ast::Function;
use crate::platform::ConsoleLevel;

/// Cheap-to-clone string (`Rc<str>`)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct JsString(Rc<str>);

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for JsString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ============ VALUES ============

/// A JavaScript value in the supported subset
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Function(Rc<Callable>),
    Builtin(Builtin),
    Promise(PromiseId),
}

impl Value {
    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Function(_) | Value::Builtin(_) | Value::Promise(_) => true,
        }
    }

    /// Convert to number (ToNumber)
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.as_str().trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Value::Function(_) | Value::Builtin(_) | Value::Promise(_) => f64::NAN,
        }
    }

    /// Convert to string (ToString)
    pub fn to_js_string(&self) -> JsString {
        match self {
            Value::Undefined => JsString::from("undefined"),
            Value::Null => JsString::from("null"),
            Value::Boolean(true) => JsString::from("true"),
            Value::Boolean(false) => JsString::from("false"),
            Value::Number(n) => JsString::from(number_to_string(*n)),
            Value::String(s) => s.clone(),
            Value::Function(callable) => {
                JsString::from(format!("function {}() {{ [code] }}", callable.name))
            }
            Value::Builtin(builtin) => {
                JsString::from(format!("function {}() {{ [native code] }}", builtin.name()))
            }
            Value::Promise(_) => JsString::from("[object Promise]"),
        }
    }

    /// The `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Builtin(builtin) if builtin.is_callable() => "function",
            Value::Builtin(_) | Value::Promise(_) => "object",
        }
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Value::Function(_) => true,
            Value::Builtin(builtin) => builtin.is_callable(),
            _ => false,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN !== NaN falls out of f64 comparison
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Promise(a), Value::Promise(b)) => a == b,
            _ => false,
        }
    }

    /// Loose equality (==) for primitives; objects compare by identity
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(_) | Value::String(_) | Value::Boolean(_), Value::Boolean(_))
            | (Value::Boolean(_), Value::Number(_) | Value::String(_))
            | (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_)) => self.to_number() == other.to_number(),
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Function(callable) => write!(f, "[Function: {}]", callable.name),
            Value::Builtin(builtin) => write!(f, "[Function: {}]", builtin.name()),
            Value::Promise(id) => write!(f, "Promise#{}", id.0),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(JsString::from(s))
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Value::String(s)
    }
}

/// Format a number the way JavaScript's `Number.prototype.toString` does for
/// the common cases (integers print without a fraction, `-0` prints as `0`)
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

// ============ CALLABLES ============

/// A user-defined function closed over the scope it was created in
#[derive(Debug)]
pub struct Callable {
    /// Frame label shown on the call stack
    pub name: JsString,
    pub function: Rc<Function>,
    pub closure: EnvId,
}

impl Callable {
    pub fn new(name: Option<JsString>, function: Rc<Function>, closure: EnvId) -> Self {
        let name = name
            .or_else(|| function.id.as_ref().map(|id| id.name.clone()))
            .unwrap_or_else(|| JsString::from("anonymous"));
        Self {
            name,
            function,
            closure,
        }
    }
}

/// Host-provided globals and the method values derived from them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    SetTimeout,
    ClearTimeout,
    QueueMicrotask,
    /// The `console` namespace object
    Console,
    ConsoleMethod(ConsoleLevel),
    /// The `Promise` namespace object
    Promise,
    PromiseResolve,
    PromiseThen(PromiseId),
    PromiseCatch(PromiseId),
    PromiseFinally(PromiseId),
}

impl Builtin {
    /// Global binding for a name not found in any scope
    pub fn global(name: &str) -> Option<Builtin> {
        match name {
            "setTimeout" => Some(Builtin::SetTimeout),
            "clearTimeout" => Some(Builtin::ClearTimeout),
            "queueMicrotask" => Some(Builtin::QueueMicrotask),
            "console" => Some(Builtin::Console),
            "Promise" => Some(Builtin::Promise),
            _ => None,
        }
    }

    /// Named property of a builtin namespace
    pub fn member(self, property: &str) -> Option<Builtin> {
        match self {
            Builtin::Console => ConsoleLevel::from_method(property).map(Builtin::ConsoleMethod),
            Builtin::Promise if property == "resolve" => Some(Builtin::PromiseResolve),
            _ => None,
        }
    }

    pub fn is_callable(self) -> bool {
        !matches!(self, Builtin::Console | Builtin::Promise)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::SetTimeout => "setTimeout",
            Builtin::ClearTimeout => "clearTimeout",
            Builtin::QueueMicrotask => "queueMicrotask",
            Builtin::Console => "console",
            Builtin::ConsoleMethod(level) => level.method_name(),
            Builtin::Promise => "Promise",
            Builtin::PromiseResolve => "resolve",
            Builtin::PromiseThen(_) => "then",
            Builtin::PromiseCatch(_) => "catch",
            Builtin::PromiseFinally(_) => "finally",
        }
    }
}

// ============ SCOPES ============

/// Index of a scope in [`Environments`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(usize);

#[derive(Debug, Default)]
pub struct EnvironmentData {
    pub bindings: FxHashMap<JsString, Value>,
    pub outer: Option<EnvId>,
}

/// Arena of scopes. Index 0 is the global scope.
#[derive(Debug)]
pub struct Environments {
    scopes: Vec<EnvironmentData>,
}

impl Environments {
    pub fn new() -> Self {
        Self {
            scopes: vec![EnvironmentData::default()],
        }
    }

    pub fn global(&self) -> EnvId {
        EnvId(0)
    }

    /// Create a child scope of `outer`
    pub fn create(&mut self, outer: EnvId) -> EnvId {
        self.scopes.push(EnvironmentData {
            bindings: FxHashMap::default(),
            outer: Some(outer),
        });
        EnvId(self.scopes.len() - 1)
    }

    /// Bind `name` in `env` itself, overwriting any previous binding there
    pub fn declare(&mut self, env: EnvId, name: JsString, value: Value) {
        if let Some(scope) = self.scopes.get_mut(env.0) {
            scope.bindings.insert(name, value);
        }
    }

    /// Resolve `name` through the scope chain starting at `env`
    pub fn lookup(&self, env: EnvId, name: &str) -> Option<&Value> {
        let mut current = Some(env);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if let Some(value) = scope.bindings.get(name) {
                return Some(value);
            }
            current = scope.outer;
        }
        None
    }

    /// Assign to the nearest scope binding `name`. Unbound names become
    /// globals, as sloppy-mode scripts do.
    pub fn assign(&mut self, env: EnvId, name: &JsString, value: Value) {
        let target = self.resolve(env, name.as_str()).unwrap_or(EnvId(0));
        self.declare(target, name.clone(), value);
    }

    fn resolve(&self, env: EnvId, name: &str) -> Option<EnvId> {
        let mut current = Some(env);
        while let Some(id) = current {
            let scope = self.scopes.get(id.0)?;
            if scope.bindings.contains_key(name) {
                return Some(id);
            }
            current = scope.outer;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}

// ============ PROMISES ============

/// Index of a promise in [`Promises`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PromiseId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseStatus {
    Pending,
    Fulfilled,
}

/// Which promise method registered a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Then,
    Catch,
    Finally,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Then => "then",
            ReactionKind::Catch => "catch",
            ReactionKind::Finally => "finally",
        }
    }
}

/// What running a reaction does with the value its source settled to
#[derive(Debug, Clone)]
pub enum ReactionHandler {
    /// A callback passed to `then`, `catch` or `finally`
    Callback(Value),
    /// Settle the derived promise with the incoming value
    PassThrough,
    /// Settle the derived promise with a value saved by `finally`
    Restore(Value),
}

/// Handler waiting on a promise, plus the derived promise it settles
#[derive(Debug, Clone)]
pub struct Reaction {
    pub kind: ReactionKind,
    pub handler: ReactionHandler,
    pub derived: PromiseId,
}

impl Reaction {
    pub fn callback(&self) -> Option<&Value> {
        match &self.handler {
            ReactionHandler::Callback(callback) => Some(callback),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct PromiseState {
    pub status: PromiseStatus,
    pub value: Value,
    pub reactions: Vec<Reaction>,
}

/// Arena of promises created during one run
#[derive(Debug, Default)]
pub struct Promises {
    states: Vec<PromiseState>,
}

impl Promises {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pending(&mut self) -> PromiseId {
        self.states.push(PromiseState {
            status: PromiseStatus::Pending,
            value: Value::Undefined,
            reactions: Vec::new(),
        });
        PromiseId(self.states.len() - 1)
    }

    pub fn create_fulfilled(&mut self, value: Value) -> PromiseId {
        self.states.push(PromiseState {
            status: PromiseStatus::Fulfilled,
            value,
            reactions: Vec::new(),
        });
        PromiseId(self.states.len() - 1)
    }

    pub fn get(&self, id: PromiseId) -> Option<&PromiseState> {
        self.states.get(id.0)
    }

    /// Fulfil a pending promise, returning the reactions now due. Settling
    /// an already settled promise does nothing.
    pub fn fulfill(&mut self, id: PromiseId, value: Value) -> Vec<Reaction> {
        match self.states.get_mut(id.0) {
            Some(state) if state.status == PromiseStatus::Pending => {
                state.status = PromiseStatus::Fulfilled;
                state.value = value;
                std::mem::take(&mut state.reactions)
            }
            _ => Vec::new(),
        }
    }

    /// Store a reaction on a pending promise. Returns the settled value
    /// instead when the promise is already fulfilled.
    pub fn subscribe(&mut self, id: PromiseId, reaction: Reaction) -> Option<Value> {
        let state = self.states.get_mut(id.0)?;
        match state.status {
            PromiseStatus::Pending => {
                state.reactions.push(reaction);
                None
            }
            PromiseStatus::Fulfilled => Some(state.value.clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
