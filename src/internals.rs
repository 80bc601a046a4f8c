// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use super::*;

/// Convert an Intcode address into an index into memory
pub(crate) fn to_index(address: i64) -> Result<usize, NegativeMemAccess> {
    usize::try_from(address).map_err(|_| NegativeMemAccess(address))
}

impl<R, W> Interpreter<R, W> {
    /// Decode the instruction at the instruction pointer
    pub(crate) fn current_instruction(&self) -> Instruction {
        Instruction::decode(self.operand(-1))
    }

    /// The raw int stored for parameter `n` (counting from 0) of the current instruction
    pub(crate) fn operand(&self, n: i64) -> i64 {
        // past the end of the address space, memory reads as 0 like anywhere else unallocated
        self.index
            .checked_add(1 + n)
            .and_then(|i| to_index(i).ok())
            .map_or(0, |i| self.code.get(i))
    }

    /// Move the instruction pointer past an instruction of `width` ints
    ///
    /// Saturates, so an instruction at the very end of the address space leaves the pointer at
    /// [`i64::MAX`], where the next fetch reads 0 and faults as illegal.
    pub(crate) fn advance(&mut self, width: i64) {
        self.index = self.index.saturating_add(width);
    }

    fn mode(&self, instr: &Instruction, n: usize) -> Result<ParamMode, InterpreterError> {
        instr.mode(n).map_err(|mode| InterpreterError::UnknownMode {
            mode,
            instruction: instr.word(),
            address: self.index,
        })
    }

    fn address(&self, instr: &Instruction, address: i64) -> Result<usize, InterpreterError> {
        to_index(address).map_err(|access| InterpreterError::NegativeMemAccess {
            opcode: instr.opcode(),
            address: self.index,
            access,
        })
    }

    /// Store `value` at `dest`, growing memory if needed
    pub(crate) fn store(
        &mut self,
        instr: &Instruction,
        dest: usize,
        value: i64,
    ) -> Result<(), InterpreterError> {
        self.code
            .set(dest, value)
            .map_err(|access| InterpreterError::OutOfMemory {
                opcode: instr.opcode(),
                address: self.index,
                access,
            })
    }

    /// Processes parameter `n` of `instr` into a concrete value using the method appropriate for
    /// its mode.
    pub(crate) fn resolve_param(
        &self,
        instr: &Instruction,
        n: usize,
    ) -> Result<i64, InterpreterError> {
        let raw = self.operand(n as i64);
        match self.mode(instr, n)? {
            ParamMode::Immediate => Ok(raw),
            ParamMode::Positional => Ok(self.code.get(self.address(instr, raw)?)),
            ParamMode::Relative => Ok(self
                .code
                .get(self.address(instr, raw.wrapping_add(self.rel_offset))?)),
        }
    }

    /// Processes parameter `n` of `instr` into an address to write to.
    /// Destinations in [ParamMode::Immediate] are rejected.
    pub(crate) fn resolve_dest(
        &self,
        instr: &Instruction,
        n: usize,
    ) -> Result<usize, InterpreterError> {
        let raw = self.operand(n as i64);
        match self.mode(instr, n)? {
            ParamMode::Positional => self.address(instr, raw),
            ParamMode::Relative => self.address(instr, raw.wrapping_add(self.rel_offset)),
            ParamMode::Immediate => Err(InterpreterError::WriteToImmediate {
                opcode: instr.opcode(),
                address: self.index,
                operand: raw,
            }),
        }
    }
}

impl<R: IntReader, W: IntWriter> Interpreter<R, W> {
    /// common logic of all 4 instructions that take 3 parameters
    pub(crate) fn op3(
        &mut self,
        instr: &Instruction,
        operation: impl Fn(i64, i64) -> i64,
    ) -> Result<StepOutcome, InterpreterError> {
        let a = self.resolve_param(instr, 0)?;
        let b = self.resolve_param(instr, 1)?;
        let dest = self.resolve_dest(instr, 2)?;
        let val = operation(a, b);
        self.store(instr, dest, val)?;
        self.record(instr, &[a, b, val]);
        self.advance(4);
        Ok(StepOutcome::Running)
    }

    pub(crate) fn jump(
        &mut self,
        instr: &Instruction,
        func: impl Fn(i64) -> bool,
    ) -> Result<StepOutcome, InterpreterError> {
        let expr = self.resolve_param(instr, 0)?;
        let dest = self.resolve_param(instr, 1)?;
        self.record(instr, &[expr, dest]);
        if func(expr) {
            if dest < 0 {
                return Err(InterpreterError::JumpToNegative {
                    opcode: instr.opcode(),
                    address: self.index,
                    target: dest,
                });
            }
            self.index = dest;
        } else {
            self.advance(3);
        }
        Ok(StepOutcome::Running)
    }
}
