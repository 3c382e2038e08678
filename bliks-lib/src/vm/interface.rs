//! the transient view a run behavior gets onto the machine
//!
//! One interface exists per step. Register writes accumulate in it and the
//! machine commits them once the behavior has returned, so the behavior
//! never touches the register file directly.

use std::collections::VecDeque;

use crate::core::*;

/// what a step left in its output slot
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Value(Value),
    /// the buffer ran dry; the host must push input and step again
    NeedInput,
}

pub struct Interface<'m> {
    pub program: &'m CompiledProgram,
    /// index of the instruction being executed
    pub cur_instruction: i64,
    /// where execution continues; behaviors may redirect it
    pub next_instruction: i64,
    /// the single outstanding call, if any
    pub return_target: &'m mut Option<i64>,
    pub(crate) reg_writes: Vec<(i64, Value)>,
    pub(crate) output: Option<Output>,
    pub(crate) buffer: &'m mut VecDeque<String>,
}

impl<'m> Interface<'m> {
    pub(crate) fn new(
        program: &'m CompiledProgram,
        cur_instruction: i64,
        next_instruction: i64,
        buffer: &'m mut VecDeque<String>,
        return_target: &'m mut Option<i64>,
    ) -> Self {
        Interface {
            program,
            cur_instruction,
            next_instruction,
            return_target,
            reg_writes: vec![],
            output: None,
            buffer,
        }
    }

    /// takes the oldest buffered input, if any
    pub fn pop_buffer(&mut self) -> Option<String> {
        self.buffer.pop_front()
    }

    /// queues a register write; the machine commits it after the step
    pub fn set_register(&mut self, pointer: &Value, value: Value) -> Result<(), String> {
        let index = pointer
            .as_num()
            .ok_or_else(|| format!("a vm bug was detected: register index '{pointer}' is not numeric"))?
            as i64;
        self.reg_writes.push((index, value));
        Ok(())
    }

    /// emits the step's output; at most one per step
    pub fn write(&mut self, value: Value) -> Result<(), String> {
        if self.output.is_some() {
            return Err("output was already written during this step".to_owned());
        }
        self.output = Some(Output::Value(value));
        Ok(())
    }

    /// raises the await signal and re-points the program counter at the
    /// current instruction, so it re-runs once input arrives
    pub fn await_input(&mut self) {
        self.output = Some(Output::NeedInput);
        self.next_instruction = self.cur_instruction;
    }
}
