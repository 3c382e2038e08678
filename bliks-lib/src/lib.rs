//! The bliks scripting language.
//!
//! Currently, what you need to do to execute a script is the following:
//! 1. load the source into a string.
//! 1. compile it with [`compile`] (or let [`vm::Machine::from_source`] do
//!    both steps at once).
//! 1. wrap the [`core::CompiledProgram`] in a [`vm::Machine`]. The program
//!    is immutable, so one compile can back any number of machines.
//! 1. push whatever input you already have with [`vm::Machine::push`].
//! 1. drive the machine with a loop like this:
//!
//!    ```
//!    use bliks_lib::vm::{Machine, Step};
//!
//!    let mut machine = Machine::from_source("write \"hi\"").unwrap();
//!    loop {
//!        match machine.step_until_output().unwrap() {
//!            Step::Finished => break,
//!            Step::Output(value) => println!("{}", value),
//!            Step::AwaitingInput => machine.push("some input"),
//!            Step::Ran => unreachable!(),
//!        }
//!    }
//!    ```
//!
//! Errors from any stage carry a byte position into the source;
//! [`report::format_error`] renders them with a caret.

pub mod compiler;
pub mod core;
pub mod expand;
pub mod parser;
pub mod report;
pub mod stdlib;
pub mod utils;
pub mod vm;

use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::core::CompiledProgram;
use crate::stdlib::Library;

/// any error the pipeline can produce
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] parser::Error),

    #[error(transparent)]
    Compile(#[from] compiler::Error),

    #[error(transparent)]
    Runtime(#[from] vm::Error),
}

impl Error {
    /// 1-based byte offset into the source
    pub fn position(&self) -> usize {
        match self {
            Error::Parse(e) => e.position(),
            Error::Compile(e) => e.position(),
            Error::Runtime(e) => e.position(),
        }
    }
}

/// compiles source against the standard library
pub fn compile(source: &str) -> Result<CompiledProgram, Error> {
    compile_with(source, &standard_library())
}

/// compiles source against a custom library
pub fn compile_with(source: &str, library: &Library) -> Result<CompiledProgram, Error> {
    let lines = parser::parse(source)?;
    Ok(compiler::resolve(lines, library)?)
}

/// the standard built-in catalog; built once, then shared
pub fn standard_library() -> Arc<Library> {
    static STANDARD: OnceLock<Arc<Library>> = OnceLock::new();
    STANDARD
        .get_or_init(|| Arc::new(Library::standard()))
        .clone()
}
