// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Execution tracing
//!
//! Every instruction is logged at [`log::Level::Trace`] as a signature line before it executes:
//!
//! ```text
//! [0004] add(a=9, b=#10, addr=3+$2)  // 21001, 9, 10, 3
//! ```
//!
//! Positional parameters are shown bare, immediate ones are prefixed with `#`, and relative ones
//! have the relative base appended. The comment lists the raw ints of the instruction.
//!
//! Separately, an [`Interpreter`] can record a [`Trace`] of the instructions it executes, along
//! with the values their parameters resolved to.
use std::fmt::{self, Debug, Display};

use itertools::Itertools;

use super::{Instruction, Interpreter, OpCode, ParamMode, UnknownMode};

#[derive(Clone, Copy, PartialEq, Eq)]
struct PackedModes(u8);
impl PackedModes {
    const fn pack(modes: [ParamMode; 3]) -> Self {
        Self(modes[0] as u8 | ((modes[1] as u8) << 2) | ((modes[2] as u8) << 4))
    }
    const fn unpack(self) -> [ParamMode; 3] {
        const fn unpack_bit_pair(bit_pair: u8) -> ParamMode {
            match bit_pair {
                0b01 => ParamMode::Immediate,
                0b10 => ParamMode::Relative,
                _ => ParamMode::Positional,
            }
        }
        [
            unpack_bit_pair(self.0 & 0b11),
            unpack_bit_pair((self.0 & 0b1100) >> 2),
            unpack_bit_pair((self.0 & 0b110000) >> 4),
        ]
    }
}

/// The signature line of an instruction about to execute
pub(crate) struct Signature {
    address: i64,
    word: i64,
    opcode: OpCode,
    rel_base: i64,
    modes: [Result<ParamMode, UnknownMode>; 3],
    operands: [i64; 3],
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.opcode.param_names();
        write!(f, "[{:04}] {}(", self.address, self.opcode.name())?;
        for (i, (name, operand)) in params.iter().zip(self.operands).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match self.modes[i] {
                Ok(ParamMode::Positional) => write!(f, "{name}={operand}")?,
                Ok(ParamMode::Immediate) => write!(f, "{name}=#{operand}")?,
                Ok(ParamMode::Relative) => write!(f, "{name}={operand}+${}", self.rel_base)?,
                Err(UnknownMode(m)) => write!(f, "{name}=<mode {m}>{operand}")?,
            }
        }
        write!(
            f,
            ")  // {}",
            std::iter::once(self.word)
                .chain(self.operands.into_iter().take(params.len()))
                .format(", ")
        )
    }
}

#[derive(Clone, PartialEq, Eq)]
/// An opaque type containing information about what instruction was executed, which can be queried
/// with its various methods, or converted into a [String] using its [Display] impl.
pub struct TracedInstr {
    op_int: i64,
    instr_ptr: i64,
    rel_base: i64,
    packed_modes: PackedModes,
    opcode: OpCode,
    operands: [i64; 3],
    resolved: [i64; 3],
}

impl TracedInstr {
    /// Return the relative base at the time the traced instruction was excuted
    pub fn rel_base(&self) -> i64 {
        self.rel_base
    }

    /// Return the instruction pointer's position when the traced instruction was executed
    pub fn instr_ptr(&self) -> i64 {
        self.instr_ptr
    }

    /// Return the actual integer of the traced instruction
    pub fn op_int(&self) -> i64 {
        self.op_int
    }

    /// Return the opcode of the traced instruction
    pub fn op_code(&self) -> OpCode {
        self.opcode
    }

    /// If the instruction stored a value, return that value
    pub fn stored_val(&self) -> Option<i64> {
        self.opcode
            .writes()
            .then(|| self.resolved[self.opcode.arity() - 1])
    }

    /// Return an array of the parameter modes of the traced instruction
    ///
    /// Modes of parameters the instruction doesn't have are reported as
    /// [positional](ParamMode::Positional).
    pub fn param_modes(&self) -> [ParamMode; 3] {
        self.packed_modes.unpack()
    }

    /// The raw parameters, followed by what they resolved to
    ///
    /// For instructions that write to memory, the value stored stands in for the destination.
    pub fn params(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.operands
            .into_iter()
            .zip(self.resolved)
            .take(self.opcode.arity())
    }

    fn build(
        instr: &Instruction,
        instr_ptr: i64,
        rel_base: i64,
        operands: [i64; 3],
        resolved_params: &[i64],
    ) -> Self {
        let opcode = instr.opcode();
        debug_assert_eq!(resolved_params.len(), opcode.arity());
        let mut modes = [ParamMode::Positional; 3];
        for (n, mode) in modes.iter_mut().enumerate().take(opcode.arity()) {
            *mode = instr.mode(n).unwrap_or(ParamMode::Positional);
        }
        let mut resolved = [0; 3];
        for (slot, &val) in resolved.iter_mut().zip(resolved_params) {
            *slot = val;
        }
        Self {
            op_int: instr.word(),
            instr_ptr,
            rel_base,
            packed_modes: PackedModes::pack(modes),
            opcode,
            operands,
            resolved,
        }
    }

    fn signature(&self) -> Signature {
        Signature {
            address: self.instr_ptr,
            word: self.op_int,
            opcode: self.opcode,
            rel_base: self.rel_base,
            modes: self.packed_modes.unpack().map(Ok),
            operands: self.operands,
        }
    }
}

impl<R, W> Interpreter<R, W> {
    /// Begin a [Trace] of executed instructions. If a trace is already running, this replaces that
    /// trace and returns in a [`Some`], otherwise, it returns [`None`].
    ///
    /// # Example
    /// ```
    ///# use intcode::prelude::*;
    /// let mut interp = Interpreter::new([1101, 90, 9, 4]);
    /// assert!(interp.start_trace().is_none());
    /// interp.run().unwrap();
    /// let trace = interp.end_trace().unwrap();
    /// assert_eq!(trace.0.len(), 2);
    /// assert_eq!(trace.0[0].stored_val(), Some(99));
    /// assert_eq!(
    ///     trace.0[0].to_string(),
    ///     "[0000] add(a=#90, b=#9, addr=4)  // 1101, 90, 9, 4  => stored 99"
    /// );
    /// ```
    pub fn start_trace(&mut self) -> Option<Trace> {
        self.trace.replace(Trace::new())
    }

    /// Stop tracing executed instructions into a [Trace]. If no trace was active, returns [`None`]
    ///
    /// see [Interpreter::start_trace]
    pub fn end_trace(&mut self) -> Option<Trace> {
        self.trace.take()
    }

    /// Get a view of the current trace
    pub fn show_trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    pub(crate) fn signature(&self, instr: &Instruction) -> Signature {
        Signature {
            address: self.index,
            word: instr.word(),
            opcode: instr.opcode(),
            rel_base: self.rel_offset,
            modes: [instr.mode(0), instr.mode(1), instr.mode(2)],
            operands: [self.operand(0), self.operand(1), self.operand(2)],
        }
    }

    /// Add `instr` to the active trace, if any
    pub(crate) fn record(&mut self, instr: &Instruction, resolved_params: &[i64]) {
        if self.trace.is_none() {
            return;
        }
        let traced = TracedInstr::build(
            instr,
            self.index,
            self.rel_offset,
            [self.operand(0), self.operand(1), self.operand(2)],
            resolved_params,
        );
        if let Some(trace) = self.trace.as_mut() {
            trace.0.push(traced);
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// A log of instructions that an [Interpreter] has executed since a call to
/// [Interpreter::start_trace]
///
/// see [Interpreter::start_trace]
pub struct Trace(pub Vec<TracedInstr>);

impl Trace {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }
}

impl Debug for TracedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedInstr")
            .field("op_int", &self.op_int)
            .field("instr_ptr", &self.instr_ptr)
            .field("rel_base", &self.rel_base)
            .field("modes", &self.packed_modes.unpack())
            .field("opcode", &self.opcode)
            .field("params", &self.params().collect::<Vec<_>>())
            .finish()
    }
}

impl Display for TracedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())?;
        let [a, b, _] = self.resolved;
        match self.opcode {
            OpCode::Add | OpCode::Mul | OpCode::Lt | OpCode::Eq | OpCode::In => {
                write!(f, "  => stored {}", self.resolved[self.opcode.arity() - 1])
            }
            OpCode::Out => write!(f, "  => output {a}"),
            OpCode::Jnz if a != 0 => write!(f, "  => jumped to {b}"),
            OpCode::Jz if a == 0 => write!(f, "  => jumped to {b}"),
            OpCode::Jnz | OpCode::Jz => write!(f, "  => didn't jump"),
            OpCode::Rbo => write!(
                f,
                "  => relative base {} to {}",
                self.rel_base,
                self.rel_base.wrapping_add(a)
            ),
            OpCode::Halt | OpCode::Illegal => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_mode_packing() {
        const MODES: [ParamMode; 3] = [
            ParamMode::Positional,
            ParamMode::Immediate,
            ParamMode::Relative,
        ];

        for a in MODES {
            for b in MODES {
                for c in MODES {
                    assert_eq!(PackedModes::pack([a, b, c]).unpack(), [a, b, c]);
                }
            }
        }
    }

    #[test]
    fn signature_format() {
        let mut interp = Interpreter::new([109, 2, 21001, 9, 10, 3, 99]);
        interp.step().unwrap();
        let instr = interp.current_instruction();
        assert_eq!(
            interp.signature(&instr).to_string(),
            "[0002] add(a=9, b=#10, addr=3+$2)  // 21001, 9, 10, 3"
        );
    }

    #[test]
    fn signature_of_unknown_mode() {
        let interp = Interpreter::new([304, 7, 99]);
        let instr = interp.current_instruction();
        assert_eq!(
            interp.signature(&instr).to_string(),
            "[0000] output(v=<mode 3>7)  // 304, 7"
        );
    }

    #[test]
    fn traced_jumps_and_output() {
        // JZ #0, #5; OUT #1 (skipped); RBO #-3; HALT
        let mut interp = Interpreter::new([1106, 0, 5, 104, 1, 109, -3, 99]);
        interp.start_trace();
        interp.run().unwrap();
        let lines: Vec<String> = interp
            .end_trace()
            .unwrap()
            .0
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            lines,
            [
                "[0000] jump-if-false(v=#0, addr=#5)  // 1106, 0, 5  => jumped to 5",
                "[0005] adjust-rel-base(offset=#-3)  // 109, -3  => relative base 0 to -3",
                "[0007] halt()  // 99",
            ]
        );
    }
}
