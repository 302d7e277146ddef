//! CLI tool for running JavaScript files with stepjs
//!
//! Usage: stepjs [options] <file.js>
//!
//! Options:
//!   --max-steps <n>    Abandon the program after n steps (exit code 2)
//!   --estree           The input file is an ESTree JSON document
//!   --print-value      Print the completion value of the program
//!   -h, --help         Show this help
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use stepjs::{Interpreter, JsError, JsString, JsValue, ObjectId, Program, PropertyAttrs};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: stepjs [--max-steps <n>] [--estree] [--print-value] <file.js>";

/// CLI configuration
struct Config {
    path: PathBuf,
    max_steps: Option<u64>,
    estree: bool,
    print_value: bool,
}

fn main() -> ExitCode {
    init_tracing();

    let config = match parse_args() {
        Ok(Some(config)) => config,
        Ok(None) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    match run(&config) {
        Ok(Outcome::Finished(value)) => {
            if config.print_value {
                println!("{}", value);
            }
            ExitCode::SUCCESS
        }
        Ok(Outcome::OutOfSteps(steps)) => {
            eprintln!("Error: step budget of {} exhausted", steps);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `Ok(None)` when help was requested
fn parse_args() -> Result<Option<Config>, String> {
    let args: Vec<String> = env::args().collect();

    let mut max_steps: Option<u64> = None;
    let mut estree = false;
    let mut print_value = false;
    let mut path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        let Some(arg) = args.get(i) else {
            break;
        };
        match arg.as_str() {
            "--max-steps" => {
                i += 1;
                max_steps = Some(
                    args.get(i)
                        .ok_or_else(|| "--max-steps requires a value".to_string())?
                        .parse::<u64>()
                        .map_err(|_| "--max-steps must be a positive integer".to_string())?,
                );
            }
            "--estree" => estree = true,
            "--print-value" => print_value = true,
            "-h" | "--help" => return Ok(None),
            other if other.starts_with('-') => return Err(format!("Unknown option: {}", other)),
            other => path = Some(other),
        }
        i += 1;
    }

    let path = path.ok_or_else(|| USAGE.to_string())?;
    Ok(Some(Config {
        path: PathBuf::from(path),
        max_steps,
        estree,
        print_value,
    }))
}

enum Outcome {
    /// The completion value, converted to a string
    Finished(JsString),
    OutOfSteps(u64),
}

fn run(config: &Config) -> Result<Outcome, Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&config.path)
        .map_err(|e| format!("Cannot read {}: {}", config.path.display(), e))?;

    let mut interp = if config.estree {
        Interpreter::with_init(Program::from_estree_json(&source)?, install_natives)?
    } else {
        Interpreter::with_init(source, install_natives)?
    };

    let mut steps: u64 = 0;
    loop {
        if config.max_steps.is_some_and(|max| steps >= max) {
            return Ok(Outcome::OutOfSteps(steps));
        }
        if !interp.step()? {
            break;
        }
        if interp.is_paused() {
            return Err("program paused on an async function".into());
        }
        steps += 1;
    }

    tracing::debug!(steps, "program finished");
    let value = interp.value();
    Ok(Outcome::Finished(interp.to_string(&value)?))
}

/// `alert` and `print` write their arguments to stdout
fn install_natives(interp: &mut Interpreter, global: ObjectId) -> Result<(), JsError> {
    for name in ["alert", "print"] {
        let func = interp.create_native_function(name, 1, |interp, _this, args| {
            let mut parts = Vec::with_capacity(args.len());
            for value in args {
                parts.push(interp.to_string(value)?.to_string());
            }
            println!("{}", parts.join(" "));
            Ok(JsValue::Undefined)
        })?;
        interp.set_property(
            &JsValue::Object(global),
            name,
            JsValue::Object(func),
            PropertyAttrs::HIDDEN,
        )?;
    }
    Ok(())
}
