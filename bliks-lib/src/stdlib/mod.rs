//! the catalog of named built-ins
//!
//! A built-in is a parameter spec plus up to two behaviors: one the
//! resolver runs while it builds the program, one the machine runs per
//! step. Control flow lives in [`control`], buffered i/o in [`io`], and
//! the pure helpers in [`math`] and [`string`].

mod control;
mod io;
mod math;
mod string;

use std::collections::BTreeMap;

use crate::core::*;
use crate::vm::Interface;

/// behavior the resolver runs while building the program
pub type CompileFn = fn(&mut CompiledProgram, &[Value]) -> Result<(), String>;
/// behavior the machine runs; errors are plain messages, the machine
/// attaches the instruction position
pub type RunFn = fn(&mut Interface, &[Value]) -> Result<(), String>;

#[derive(Debug)]
pub struct FuncDescriptor {
    pub params: ParameterList,
    pub compile: Option<CompileFn>,
    pub run: Option<RunFn>,
}

/// immutable name → descriptor catalog. Built once, then only read
#[derive(Default, Debug)]
pub struct Library {
    funcs: BTreeMap<String, FuncDescriptor>,
}

macro_rules! rt_err {
    ($msg:literal $(, $args:expr)*) => { return Err(format!($msg $(, $args)*)) };
}
pub(crate) use rt_err;

macro_rules! rt_assert {
    ($cond:expr, $msg:literal $(, $args:expr)*) => {
        if !$cond { return Err(format!($msg $(, $args)*)); }
    };
}
pub(crate) use rt_assert;

impl Library {
    pub fn get(&self, name: &str) -> Option<&FuncDescriptor> {
        self.funcs.get(name)
    }

    fn register(&mut self, name: &str, spec: &str, compile: Option<CompileFn>, run: Option<RunFn>) {
        assert!(
            compile.is_some() || run.is_some(),
            "built-in '{name}' has no behavior"
        );
        let params =
            parse_params(spec).unwrap_or_else(|e| panic!("bad parameter spec for '{name}': {e}"));
        self.funcs.insert(
            name.to_owned(),
            FuncDescriptor {
                params,
                compile,
                run,
            },
        );
    }

    /// registers a function that only exists at compile time
    pub fn compile_time(&mut self, name: &str, spec: &str, behavior: CompileFn) {
        self.register(name, spec, Some(behavior), None);
    }

    /// registers a function that only exists at run time
    pub fn run_time(&mut self, name: &str, spec: &str, behavior: RunFn) {
        self.register(name, spec, None, Some(behavior));
    }

    /// registers a function with both behaviors
    pub fn two_phase(&mut self, name: &str, spec: &str, compile: CompileFn, run: RunFn) {
        self.register(name, spec, Some(compile), Some(run));
    }

    /// the standard catalog
    pub fn standard() -> Self {
        let mut lib = Library::default();
        control::register(&mut lib);
        io::register(&mut lib);
        math::register(&mut lib);
        string::register(&mut lib);
        lib
    }
}

/// numeric reading of an already expanded argument. The expander converts
/// everything headed for a numeric parameter, so failure here is a bug
pub(crate) fn num(v: &Value) -> Result<f64, String> {
    v.as_num()
        .ok_or_else(|| format!("a vm bug was detected: '{v}' is not a number"))
}

/// the canonical truthy and falsy renderings
pub(crate) fn bool_value(b: bool) -> Value {
    if b {
        Value::from("true")
    } else {
        Value::from("")
    }
}
