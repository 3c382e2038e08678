//! arithmetic helpers. Each one writes its result to the register named by
//! the pointer argument; division and modulo follow IEEE semantics

use crate::core::*;
use crate::stdlib::{num, Library};
use crate::vm::Interface;

pub fn register(lib: &mut Library) {
    lib.run_time("add", "p n n*", add_run);
    lib.run_time("sub", "p n n", sub_run);
    lib.run_time("mul", "p n n*", mul_run);
    lib.run_time("div", "p n n", div_run);
    lib.run_time("mod", "p n n", mod_run);
    lib.run_time("pow", "p n n", pow_run);
    lib.run_time("abs", "p n", abs_run);
    lib.run_time("floor", "p n", floor_run);
    lib.run_time("ceil", "p n", ceil_run);
    lib.run_time("round", "p n", round_run);
    lib.run_time("min", "p n n*", min_run);
    lib.run_time("max", "p n n*", max_run);
}

fn fold(
    itf: &mut Interface,
    args: &[Value],
    op: impl Fn(f64, f64) -> f64,
) -> Result<(), String> {
    let mut acc = num(&args[1])?;
    for v in &args[2..] {
        acc = op(acc, num(v)?);
    }
    itf.set_register(&args[0], Value::Num(acc))
}

fn unary(itf: &mut Interface, args: &[Value], op: impl Fn(f64) -> f64) -> Result<(), String> {
    let n = num(&args[1])?;
    itf.set_register(&args[0], Value::Num(op(n)))
}

fn add_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, |a, b| a + b)
}

fn sub_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, |a, b| a - b)
}

fn mul_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, |a, b| a * b)
}

fn div_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, |a, b| a / b)
}

fn mod_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, |a, b| a % b)
}

fn pow_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, f64::powf)
}

fn abs_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    unary(itf, args, f64::abs)
}

fn floor_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    unary(itf, args, f64::floor)
}

fn ceil_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    unary(itf, args, f64::ceil)
}

fn round_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    unary(itf, args, f64::round)
}

fn min_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, f64::min)
}

fn max_run(itf: &mut Interface, args: &[Value]) -> Result<(), String> {
    fold(itf, args, f64::max)
}
