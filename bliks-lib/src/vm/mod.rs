//! the stepwise register machine
//!
//! A machine owns its registers, input buffer and program counter, and
//! shares its program and library. Nothing runs unless the host calls
//! [`Machine::step`]; the only suspension point is a poll on an empty
//! buffer, which surfaces as [`Step::AwaitingInput`] with the program
//! counter rewound onto the polling instruction.

mod interface;
pub use interface::{Interface, Output};

use std::collections::VecDeque;
use std::result::Result as StdResult;
use std::sync::Arc;
use thiserror::Error;

use crate::core::*;
use crate::expand::{self, Registers};
use crate::stdlib::Library;
use crate::{compile_with, standard_library};

pub type Result<T> = StdResult<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{msg}")]
    Runtime { msg: String, pos: usize },

    #[error("register {index} exceeds the configured maximum of {max}")]
    RegisterLimit { index: i64, max: usize, pos: usize },

    #[error("a vm bug was detected: {msg}")]
    Bug { msg: String, pos: usize },
}

impl Error {
    /// 1-based byte offset of the instruction that failed
    pub fn position(&self) -> usize {
        match self {
            Error::Runtime { pos, .. }
            | Error::RegisterLimit { pos, .. }
            | Error::Bug { pos, .. } => *pos,
        }
    }
}

/// outcome of a single step
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// the program counter ran past the last instruction
    Finished,
    /// an instruction executed without producing output
    Ran,
    Output(Value),
    /// a poll found the buffer empty; push input and step again
    AwaitingInput,
}

#[derive(Debug)]
pub struct Machine {
    program: Arc<CompiledProgram>,
    library: Arc<Library>,
    registers: Registers,
    buffer: VecDeque<String>,
    next_instruction: i64,
    return_target: Option<i64>,
    max_registers: Option<usize>,
}

impl Machine {
    pub fn from_compiled(program: Arc<CompiledProgram>) -> Self {
        Self::with_library(program, standard_library())
    }

    pub fn with_library(program: Arc<CompiledProgram>, library: Arc<Library>) -> Self {
        let next_instruction = program.begin;
        Machine {
            program,
            library,
            registers: Registers::new(),
            buffer: VecDeque::new(),
            next_instruction,
            return_target: None,
            max_registers: None,
        }
    }

    pub fn from_source(source: &str) -> StdResult<Self, crate::Error> {
        Ok(Self::from_compiled(Arc::new(crate::compile(source)?)))
    }

    pub fn from_source_with(
        source: &str,
        library: Arc<Library>,
    ) -> StdResult<Self, crate::Error> {
        let program = Arc::new(compile_with(source, &library)?);
        Ok(Self::with_library(program, library))
    }

    /// caps how many registers the program may address
    pub fn with_register_limit(mut self, max: usize) -> Self {
        self.max_registers = Some(max);
        self
    }

    /// enqueues one input at the end of the buffer
    pub fn push(&mut self, input: impl Into<String>) {
        self.buffer.push_back(input.into());
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn program(&self) -> &Arc<CompiledProgram> {
        &self.program
    }

    /// executes one instruction. Any error marks the machine non-running;
    /// further steps report [`Step::Finished`]
    pub fn step(&mut self) -> Result<Step> {
        match self.dispatch() {
            Ok(step) => Ok(step),
            Err(e) => {
                self.next_instruction = -1;
                Err(e)
            }
        }
    }

    /// steps until something other than a plain instruction happened
    pub fn step_until_output(&mut self) -> Result<Step> {
        loop {
            match self.step()? {
                Step::Ran => continue,
                other => return Ok(other),
            }
        }
    }

    fn dispatch(&mut self) -> Result<Step> {
        let cur = self.next_instruction;
        let Some(inst) = self.program.instruction(cur) else {
            return Ok(Step::Finished);
        };
        let pos = inst.pos;
        let desc = self.library.get(&inst.func).ok_or_else(|| Error::Bug {
            msg: format!("no descriptor for '{}'", inst.func),
            pos,
        })?;
        let run = desc.run.ok_or_else(|| Error::Bug {
            msg: format!("'{}' has no run behavior", inst.func),
            pos,
        })?;
        let expanded = expand::expand(&inst.args, &self.registers)
            .map_err(|msg| Error::Runtime { msg, pos })?;

        self.next_instruction = cur + 1;
        let mut itf = Interface::new(
            &self.program,
            cur,
            self.next_instruction,
            &mut self.buffer,
            &mut self.return_target,
        );
        run(&mut itf, &expanded).map_err(|msg| Error::Runtime { msg, pos })?;

        let Interface {
            next_instruction,
            reg_writes,
            output,
            ..
        } = itf;
        self.next_instruction = next_instruction;
        for (index, value) in reg_writes {
            if let Some(max) = self.max_registers {
                if index > max as i64 {
                    return Err(Error::RegisterLimit { index, max, pos });
                }
            }
            self.registers.insert(index, value);
        }
        Ok(match output {
            None => Step::Ran,
            Some(Output::Value(v)) => Step::Output(v),
            Some(Output::NeedInput) => Step::AwaitingInput,
        })
    }
}
