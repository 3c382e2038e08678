use anyhow::Result;
use clap::Parser;
use rustyline::{error::ReadlineError, DefaultEditor};

use bliks_lib::report::format_error;
use bliks_lib::vm::{Machine, Step};

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// script to run; without one an interactive prompt starts
    script: Option<PathBuf>,

    /// inputs preloaded into the machine's buffer
    args: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match &cli.script {
        Some(path) => run_file(path, &cli.args),
        None => prompt_loop(&cli.args),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_file(path: &PathBuf, args: &[String]) -> Result<bool> {
    let source = std::fs::read_to_string(path)?;
    let name = path.display().to_string();
    let mut machine = match Machine::from_source(&source) {
        Ok(m) => m,
        Err(e) => {
            eprint!("{}", format_error(&e, &source, &name));
            return Ok(false);
        }
    };
    for arg in args {
        machine.push(arg.clone());
    }
    run(&mut machine, &source, &name, &mut stdin_line)
}

/// drives a machine to completion. Outputs go to stdout with one trailing
/// newline each; when the buffer runs dry, `more_input` supplies the next
/// line or None for end of input
fn run(
    machine: &mut Machine,
    source: &str,
    name: &str,
    more_input: &mut dyn FnMut() -> Result<Option<String>>,
) -> Result<bool> {
    loop {
        match machine.step_until_output() {
            Ok(Step::Finished) => return Ok(true),
            Ok(Step::Output(value)) => println!("{value}"),
            Ok(Step::AwaitingInput) => match more_input()? {
                Some(line) => machine.push(line),
                None => {
                    eprintln!("{name}: input required but none is available");
                    return Ok(false);
                }
            },
            Ok(Step::Ran) => {}
            Err(e) => {
                eprint!("{}", format_error(&e.into(), source, name));
                return Ok(false);
            }
        }
    }
}

fn stdin_line() -> Result<Option<String>> {
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// one independent machine per prompt line; nothing survives between them
fn prompt_loop(args: &[String]) -> Result<bool> {
    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("bliks> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                let mut machine = match Machine::from_source(&line) {
                    Ok(m) => m,
                    Err(e) => {
                        eprint!("{}", format_error(&e, &line, "repl"));
                        continue;
                    }
                };
                for arg in args {
                    machine.push(arg.clone());
                }
                let mut more = || prompt_line(&mut rl);
                run(&mut machine, &line, "repl", &mut more)?;
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(true),
            Err(other) => return Err(other.into()),
        }
    }
}

fn prompt_line(rl: &mut DefaultEditor) -> Result<Option<String>> {
    match rl.readline("input> ") {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
        Err(other) => Err(other.into()),
    }
}
