//! Console built-in methods

use crate::interpreter::Interpreter;
use crate::platform::ConsoleLevel;
use crate::value::{Builtin, PromiseStatus, Value, number_to_string};

impl Interpreter {
    /// console.log/info/debug/warn/error: arguments joined with spaces
    pub(super) fn console_method(&mut self, level: ConsoleLevel, args: &[Value]) {
        let output: Vec<String> = args.iter().map(|value| self.inspect(value, true)).collect();
        self.write_console(level, output.join(" "));
    }

    /// Render a value the way Node's console does for this subset. Strings
    /// are quoted when nested inside another value.
    fn inspect(&self, value: &Value, top_level: bool) -> String {
        match value {
            Value::String(s) if top_level => s.to_string(),
            Value::String(s) => format!("'{}'", s),
            Value::Number(n) => number_to_string(*n),
            Value::Function(callable) if callable.name == "anonymous" => {
                "[Function (anonymous)]".to_string()
            }
            Value::Function(callable) => format!("[Function: {}]", callable.name),
            Value::Builtin(Builtin::Console) => "[object console]".to_string(),
            Value::Builtin(builtin) => format!("[Function: {}]", builtin.name()),
            Value::Promise(id) => match self.context.promises.get(*id) {
                Some(state) if state.status == PromiseStatus::Fulfilled => {
                    format!("Promise {{ {} }}", self.inspect(&state.value, false))
                }
                _ => "Promise { <pending> }".to_string(),
            },
            other => other.to_js_string().to_string(),
        }
    }
}
