//! buffered input and output
//!
//! `read`/`readnum` take whatever the buffer holds right now; only
//! `poll`/`pollnum` suspend the machine when it is empty, by re-pointing
//! the program counter at themselves and raising the await signal.

use crate::core::*;
use crate::stdlib::Library;
use crate::vm::Interface;

pub fn register(lib: &mut Library) {
    lib.run_time("read", "p", read_run);
    lib.run_time("readnum", "p", readnum_run);
    lib.run_time("poll", "p", poll_run);
    lib.run_time("pollnum", "p", pollnum_run);
    lib.run_time("write", "s*", write_run);
    lib.run_time("writef", "s s*", writef_run);
}

fn read_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let input = itf.pop_buffer().unwrap_or_default();
    itf.set_register(&args[0], Value::Str(input))
}

fn to_number(input: &str) -> Result<f64, String> {
    parse_num(input).ok_or_else(|| format!("input '{input}' is not a number"))
}

fn readnum_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let input = itf
        .pop_buffer()
        .ok_or_else(|| "the input buffer is empty".to_owned())?;
    let n = to_number(&input)?;
    itf.set_register(&args[0], Value::Num(n))
}

fn poll_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    match itf.pop_buffer() {
        Some(input) => itf.set_register(&args[0], Value::Str(input)),
        None => {
            itf.await_input();
            Ok(())
        }
    }
}

fn pollnum_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    match itf.pop_buffer() {
        Some(input) => {
            let n = to_number(&input)?;
            itf.set_register(&args[0], Value::Num(n))
        }
        None => {
            itf.await_input();
            Ok(())
        }
    }
}

fn write_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let text = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    itf.write(Value::Str(text))
}

/// substitutes `{}` placeholders left to right
fn writef_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let fmt = args[0].to_string();
    let mut values = args[1..].iter();
    let mut pieces = fmt.split("{}");
    let mut out = pieces.next().unwrap_or_default().to_owned();
    for piece in pieces {
        let value = values
            .next()
            .ok_or_else(|| "writef: missing argument for placeholder".to_owned())?;
        out.push_str(&value.to_string());
        out.push_str(piece);
    }
    itf.write(Value::Str(out))
}
