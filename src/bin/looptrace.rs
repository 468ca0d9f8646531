//! CLI tool for tracing the event loop of a JavaScript snippet
//!
//! Usage: looptrace [options] <file|->
//!
//! Options:
//!   --json             Print the whole run as JSON
//!   --config <file>    Read simulator settings from a JSON file
//!   --max-steps <n>    Maximum number of recorded steps (default: 10000)
//!   --max-depth <n>    Maximum call stack depth (default: 256)
//!   --interactive      Step through the trace with commands read from stdin
//!
//! Set RUST_LOG (e.g. `RUST_LOG=looptrace=debug`) to see evaluator logs on
//! stderr.

use std::env;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::sync::Once;

use looptrace::{ExecutionStep, Run, Session, SessionStatus, SimConfig, simulate};

static TRACING_INIT: Once = Once::new();

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install a stderr subscriber, only when RUST_LOG is set
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

/// CLI configuration
struct Config {
    source_path: String,
    json: bool,
    interactive: bool,
    config_path: Option<String>,
    max_steps: Option<usize>,
    max_depth: Option<usize>,
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("looptrace", |s| s.as_str());

    let mut json = false;
    let mut interactive = false;
    let mut config_path: Option<String> = None;
    let mut max_steps: Option<usize> = None;
    let mut max_depth: Option<usize> = None;
    let mut source_arg: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        let Some(arg) = args.get(i) else {
            break;
        };
        match arg.as_str() {
            "--json" => json = true,
            "--interactive" => interactive = true,
            "--config" => {
                i += 1;
                config_path = Some(
                    args.get(i)
                        .ok_or_else(|| "--config requires a value".to_string())?
                        .clone(),
                );
            }
            "--max-steps" => {
                i += 1;
                max_steps = Some(parse_count(args.get(i), "--max-steps")?);
            }
            "--max-depth" => {
                i += 1;
                max_depth = Some(parse_count(args.get(i), "--max-depth")?);
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown option: {}", other));
            }
            other => source_arg = Some(other),
        }
        i += 1;
    }

    let Some(source_path) = source_arg else {
        return Err(format!(
            "Usage: {} [--json] [--config <file>] [--max-steps <n>] [--max-depth <n>] [--interactive] <file|->",
            program_name
        ));
    };

    if interactive && source_path == "-" {
        return Err("--interactive reads commands from stdin and needs a source file path".to_string());
    }

    Ok(Config {
        source_path: source_path.to_string(),
        json,
        interactive,
        config_path,
        max_steps,
        max_depth,
    })
}

fn parse_count(value: Option<&String>, flag: &str) -> Result<usize, String> {
    value
        .ok_or_else(|| format!("{} requires a value", flag))?
        .parse::<usize>()
        .map_err(|_| format!("{} must be a positive integer", flag))
}

fn read_source(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    if path == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e).into())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = parse_args()?;

    let mut config = match &cli.config_path {
        Some(path) => SimConfig::from_json(&fs::read_to_string(path)?)?,
        None => SimConfig::default(),
    };
    if let Some(max_steps) = cli.max_steps {
        config.max_steps = max_steps;
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_call_depth = max_depth;
    }
    config.validate()?;

    let source = read_source(&cli.source_path)?;

    if cli.interactive {
        return interactive(source, config);
    }

    let run = simulate(&source, &config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_run(&run, !config.echo_console);
    }
    Ok(())
}

fn format_step(index: usize, step: &ExecutionStep) -> String {
    let tasks: Vec<String> = step
        .tasks
        .iter()
        .map(|task| format!("{}({})", task.name, task.delay))
        .collect();
    let mut line = format!(
        "{:>4}  {:<32} stack=[{}] tasks=[{}] microtasks=[{}]",
        index,
        step.event.label(),
        step.stack_names().join(", "),
        tasks.join(", "),
        step.microtask_names().join(", "),
    );
    if let Some(node) = &step.node {
        line.push_str(&format!(" @ {} {}:{}", node.kind, node.span.line, node.span.column));
    }
    line
}

fn print_run(run: &Run, show_console: bool) {
    for (index, step) in run.trace.iter().enumerate() {
        println!("{}", format_step(index, step));
    }

    if show_console && !run.console.is_empty() {
        println!("\nconsole:");
        for line in &run.console {
            println!("  [{}] {}", line.level.method_name(), line.text);
        }
    }

    if !run.diagnostics.is_empty() {
        println!("\ndiagnostics:");
        for diagnostic in &run.diagnostics {
            println!("  step {}: {}", diagnostic.step, diagnostic);
        }
    }

    if run.is_truncated() {
        println!("\n(trace truncated)");
    }
}

fn print_session(session: &Session) {
    match session.current_step() {
        Some(step) => println!("{}", format_step(session.step_index(), step)),
        None => println!("(no trace, use 'run')"),
    }
    if session.status() != SessionStatus::Running {
        println!("status: {:?}", session.status());
    }
}

fn interactive(source: String, config: SimConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::with_config(config);
    session.set_code(source.clone());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("commands: run, step, pause, reset, show, seek <n>, quit");

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command {
            "run" | "r" => match session.run() {
                Ok(run) => {
                    println!("{} steps, {} diagnostics", run.trace.len(), run.diagnostics.len());
                    print_session(&session);
                }
                Err(e) => println!("Error: {}", e),
            },
            "step" | "s" => {
                session.step();
                print_session(&session);
            }
            "pause" | "p" => {
                session.pause();
                print_session(&session);
            }
            "reset" => {
                session.reset();
                session.set_code(source.clone());
                print_session(&session);
            }
            "show" => print_session(&session),
            "seek" => match words.next().map(str::parse::<usize>) {
                Some(Ok(index)) => {
                    session.seek(index);
                    print_session(&session);
                }
                _ => println!("usage: seek <n>"),
            },
            "quit" | "q" | "exit" => break,
            other => println!("unknown command: {}", other),
        }
    }

    Ok(())
}
