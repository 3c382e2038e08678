//! resolves retrieval indirection against live registers
//!
//! Both the machine (every step) and the resolver (for compile-time
//! behaviors, against an empty register map) funnel arguments through this
//! routine. Errors are plain messages; the caller attaches the source
//! position it knows about.

use std::collections::BTreeMap;
use std::result::Result as StdResult;

use crate::core::*;
use crate::utils;

/// the machine's sparse register file
pub type Registers = BTreeMap<i64, Value>;

/// turns resolved arguments into the raw values a behavior receives.
/// Arguments whose expected type sits on the number chain come out as
/// numbers
pub fn expand(args: &[Argument], registers: &Registers) -> StdResult<Vec<Value>, String> {
    let mut out = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let value = match arg.kind {
            ArgKind::Value => arg.value.clone(),
            ArgKind::Retrieval => retrieve(arg, i, registers)?,
        };
        out.push(convert(value, arg.expected)?);
    }
    Ok(out)
}

/// the resolver's variant, for compile-time behaviors. Literal arguments
/// expand exactly like at run time; retrieval arguments reduce to empty
/// placeholders, because no registers exist yet and every behavior that
/// actually reads its arguments has fixed parameters, which already
/// rejected retrievals
pub fn expand_for_compile(args: &[Argument]) -> StdResult<Vec<Value>, String> {
    args.iter()
        .map(|arg| match arg.kind {
            ArgKind::Value => convert(arg.value.clone(), arg.expected),
            ArgKind::Retrieval => Ok(Value::Str(String::new())),
        })
        .collect()
}

/// chases one retrieval chain through the registers. Missing registers
/// read as the empty string
fn retrieve(arg: &Argument, index: usize, registers: &Registers) -> StdResult<Value, String> {
    let mut cur = arg.value.clone();
    let mut trace = vec![utils::clip(&cur.to_string())];
    for _ in 0..arg.depth {
        let t = type_of(&cur);
        if t != ValueType::Pointer {
            return Err(pointer_err(&trace, t));
        }
        let idx = cur.as_num().expect("pointers always read as numbers") as i64;
        cur = registers
            .get(&idx)
            .cloned()
            .unwrap_or_else(|| Value::Str(String::new()));
        trace.push(utils::clip(&cur.to_string()));
    }
    let t = type_of(&cur);
    if !is(t, arg.expected) {
        if arg.expected == ValueType::Pointer {
            return Err(pointer_err(&trace, t));
        }
        return Err(format!(
            "function expects a {} for argument {}, but retrieval expanded to '{}' (a {})",
            arg.expected.name(),
            index + 1,
            trace.join("' -> '"),
            t.name()
        ));
    }
    Ok(cur)
}

fn pointer_err(trace: &[String], t: ValueType) -> String {
    format!(
        "expected pointer during retrieval, but got '{}' (a {})",
        trace.join("' -> '"),
        t.name()
    )
}

fn convert(value: Value, expected: ValueType) -> StdResult<Value, String> {
    if !is(expected, ValueType::Number) {
        return Ok(value);
    }
    match value.as_num() {
        Some(n) => Ok(Value::Num(n)),
        // the resolver and the retrieval check above forbid this
        None => Err(format!(
            "a resolver bug was detected: '{value}' reached a numeric parameter"
        )),
    }
}
