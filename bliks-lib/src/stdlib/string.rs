//! string helpers and predicates. Predicates write the canonical truthy
//! and falsy renderings, "true" and ""

use crate::core::*;
use crate::stdlib::{bool_value, num, Library};
use crate::vm::Interface;

pub fn register(lib: &mut Library) {
    lib.run_time("set", "p s", set_run);
    lib.run_time("concat", "p s s*", concat_run);
    lib.run_time("upper", "p s", upper_run);
    lib.run_time("lower", "p s", lower_run);
    lib.run_time("len", "p s", len_run);
    lib.run_time("tonum", "p s", tonum_run);
    lib.run_time("equal", "p s s", equal_run);
    lib.run_time("greater", "p n n", greater_run);
    lib.run_time("less", "p n n", less_run);
    lib.run_time("not", "p s", not_run);
    lib.run_time("and", "p s s*", and_run);
    lib.run_time("or", "p s s*", or_run);
}

fn set_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    itf.set_register(&args[0], args[1].clone())
}

fn concat_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let joined: String = args[1..].iter().map(Value::to_string).collect();
    itf.set_register(&args[0], Value::Str(joined))
}

fn upper_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    itf.set_register(&args[0], Value::Str(args[1].to_string().to_uppercase()))
}

fn lower_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    itf.set_register(&args[0], Value::Str(args[1].to_string().to_lowercase()))
}

fn len_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let count = args[1].to_string().chars().count();
    itf.set_register(&args[0], Value::Num(count as f64))
}

fn tonum_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let n = args[1]
        .as_num()
        .ok_or_else(|| format!("'{}' is not a number", args[1]))?;
    itf.set_register(&args[0], Value::Num(n))
}

/// equality on the rendered values, so 5 equals "5"
fn equal_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let eq = args[1].to_string() == args[2].to_string();
    itf.set_register(&args[0], bool_value(eq))
}

fn greater_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let result = num(&args[1])? > num(&args[2])?;
    itf.set_register(&args[0], bool_value(result))
}

fn less_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let result = num(&args[1])? < num(&args[2])?;
    itf.set_register(&args[0], bool_value(result))
}

fn not_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let result = !args[1].is_truthy();
    itf.set_register(&args[0], bool_value(result))
}

fn and_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let result = args[1..].iter().all(Value::is_truthy);
    itf.set_register(&args[0], bool_value(result))
}

fn or_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    let result = args[1..].iter().any(Value::is_truthy);
    itf.set_register(&args[0], bool_value(result))
}
