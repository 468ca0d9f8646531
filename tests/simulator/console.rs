//! console.* capture and formatting

use std::cell::RefCell;
use std::rc::Rc;

use super::{console_output, run};
use looptrace::parser::Parser;
use looptrace::platform::{ConsoleLevel, ConsoleProvider};
use looptrace::{Interpreter, SimConfig};

struct Capture(Rc<RefCell<Vec<(ConsoleLevel, String)>>>);

impl ConsoleProvider for Capture {
    fn write(&self, level: ConsoleLevel, message: &str) {
        self.0.borrow_mut().push((level, message.to_string()));
    }
}

#[test]
fn test_values_are_formatted() {
    let run = run("console.log('s', 1, 1.5, true, null, undefined, function named() {}, () => {});");
    assert_eq!(
        console_output(&run),
        vec!["s 1 1.5 true null undefined [Function: named] [Function (anonymous)]"]
    );
}

#[test]
fn test_promises_are_formatted() {
    let run = run(
        "console.log(Promise.resolve(2));\n\
         console.log(Promise.resolve('x'));\n\
         console.log(Promise.resolve(1).then(function(){}));",
    );
    assert_eq!(
        console_output(&run),
        vec!["Promise { 2 }", "Promise { 'x' }", "Promise { <pending> }"]
    );
}

#[test]
fn test_levels_are_kept() {
    let run = run("console.log('l'); console.info('i'); console.warn('w'); console.error('e');");
    let levels: Vec<ConsoleLevel> = run.console.iter().map(|line| line.level).collect();
    assert_eq!(
        levels,
        vec![ConsoleLevel::Log, ConsoleLevel::Info, ConsoleLevel::Warn, ConsoleLevel::Error]
    );
}

#[test]
fn test_line_records_current_step() {
    let run = run("console.log('top'); function a() { console.log('in a'); } a();");
    let steps: Vec<usize> = run.console.iter().map(|line| line.step).collect();
    assert_eq!(steps, vec![0, 1]);
}

#[test]
fn test_console_does_not_create_steps() {
    let run = run("console.log('a'); console.log('b');");
    assert_eq!(run.trace.len(), 1);
}

#[test]
fn test_echo_goes_to_provider() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let program = Parser::new("console.log('hi'); console.warn('careful');")
        .parse_program()
        .unwrap();
    let config = SimConfig::default().with_echo_console(true);

    let run = Interpreter::new(&config)
        .with_console_provider(Box::new(Capture(Rc::clone(&lines))))
        .run(&program);

    assert_eq!(run.console.len(), 2);
    assert_eq!(
        *lines.borrow(),
        vec![
            (ConsoleLevel::Log, "hi".to_string()),
            (ConsoleLevel::Warn, "careful".to_string()),
        ]
    );
}

#[test]
fn test_no_echo_by_default() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let program = Parser::new("console.log('quiet');").parse_program().unwrap();

    let run = Interpreter::new(&SimConfig::default())
        .with_console_provider(Box::new(Capture(Rc::clone(&lines))))
        .run(&program);

    assert_eq!(console_output(&run), vec!["quiet"]);
    assert!(lines.borrow().is_empty());
}
