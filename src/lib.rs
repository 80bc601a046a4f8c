// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD
#![warn(missing_docs)]

//! Library providing an Intcode virtual machine with pluggable blocking I/O
//!
//! The interpreter is fully functional, with all of the [Opcodes] and [Parameter Modes] defined in
//! the completed Intcode computer for [Day 9].
//!
//! # Example
//!
//! ```rust
//! use intcode::prelude::*;
//! let mut interpreter = Interpreter::new(vec![104, 1024, 99]);
//!
//! assert_eq!(
//!     interpreter.run_through_inputs(empty()).unwrap(),
//!     (vec![1024], State::Halted)
//! );
//! ```
//!
//! An [`Interpreter`] reads and writes through an [`IntReader`](io::IntReader) and an
//! [`IntWriter`](io::IntWriter). By default these are in-memory [`IntBuffer`](io::IntBuffer)s,
//! but any endpoint can be attached with [`Interpreter::with_io`]:
//!
//! ```rust
//! use intcode::prelude::*;
//! use intcode::io::ByteWriter;
//!
//! let mut out = Vec::new();
//! let mut interpreter = Interpreter::with_io(
//!     [104, 104, 104, 105, 104, 10, 99],
//!     IntBuffer::new(),
//!     ByteWriter::new(&mut out),
//! );
//! interpreter.run().unwrap();
//! drop(interpreter);
//! assert_eq!(out, b"hi\n");
//! ```
//!
//! [Opcodes]: https://esolangs.org/wiki/Intcode#Opcodes
//! [Parameter Modes]: https://esolangs.org/wiki/Intcode#Parameter_Modes
//! [Day 9]: https://adventofcode.com/2019/day/9

mod decode;
pub mod error;
/// A module implementing internal logic that doesn't fit cleanly into the module hierarchy
mod internals;
pub mod io;
/// Flat growable memory
mod memory;
pub mod network;
pub mod program;
pub mod sync_io;
pub mod trace;

pub use decode::{Instruction, OpCode, ParamMode};
pub use error::{
    InterpreterError, IoError, MemoryError, NegativeMemAccess, OutOfMemory, ProgramError,
    UnknownMode,
};

use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::ops::{Index, IndexMut, Range};

use io::{IntBuffer, IntReader, IntWriter};
use memory::IntcodeMem;

/// A small module that re-exports items useful when working with the Intcode interpreter
pub mod prelude {
    pub use crate::io::{IntBuffer, IntReader, IntWriter};
    pub use crate::{Interpreter, ParamMode, State, Status, StepOutcome};
    pub use std::iter::empty;
}

/// Why [`Interpreter::run_through_inputs`] stopped
///
/// [Awaiting](State::Awaiting) means that there are more instructions to execute, but all input
/// has been consumed and the next instruction requires input.
///
/// [Halted](State::Halted) means that a `HALT` instruction has been executed. Once it's been
/// returned, no more instructions will be executed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
    /// Execution is awaiting input
    Awaiting,
    /// Execution has halted
    Halted,
}

/// Lifecycle of an [`Interpreter`]
///
/// Both [`Halted`](Status::Halted) and [`Faulted`](Status::Faulted) are terminal.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    /// More instructions can be executed
    Running,
    /// A `HALT` instruction was executed
    Halted,
    /// An instruction failed
    Faulted,
}

/// The outcome when an [Interpreter] executes a single instruction
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StepOutcome {
    /// The instruction ran, and there are more to run
    Running,
    /// The instruction was `HALT`
    Halted,
}

/// An intcode interpreter, generic over its input endpoint `R` and output endpoint `W`
#[derive(Clone)]
pub struct Interpreter<R = IntBuffer, W = IntBuffer> {
    index: i64,
    rel_offset: i64,
    code: IntcodeMem,
    status: Status,
    input: R,
    output: W,
    trace: Option<trace::Trace>,
}

// ignore the endpoints and the trace
impl<R, W> PartialEq for Interpreter<R, W> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.rel_offset == other.rel_offset
            && self.status == other.status
            && self.code == other.code
    }
}

impl<R, W> Debug for Interpreter<R, W> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Interpreter")
            .field("code", &self.code)
            .field("rbo", &self.rel_offset)
            .field("ip", &self.index)
            .field("status", &self.status)
            .field("tracing", &self.trace.is_some())
            .finish_non_exhaustive()
    }
}

impl<R, W> Index<i64> for Interpreter<R, W> {
    type Output = i64;

    fn index(&self, i: i64) -> &Self::Output {
        let i = usize::try_from(i).expect("intcode memory cannot be at a negative index");
        self.code.index(i)
    }
}

impl<R, W> IndexMut<i64> for Interpreter<R, W> {
    fn index_mut(&mut self, i: i64) -> &mut Self::Output {
        let i = usize::try_from(i).expect("intcode memory cannot be at a negative index");
        self.code.index_mut(i)
    }
}

impl Interpreter {
    /// Create a new interpreter with empty in-memory buffers for input and output. Collects
    /// `code` into the starting memory state.
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        Self::with_io(code, IntBuffer::new(), IntBuffer::new())
    }

    /// Queue `value` for the program to read.
    ///
    /// If `block` is set, execute instructions until the program has consumed all queued input.
    ///
    /// # Errors
    ///
    /// | Condition                                      | Error                        |
    /// |------------------------------------------------|------------------------------|
    /// | The input queue is full                        | [`IoError::BufferFull`]      |
    /// | The program halted without consuming the input | [`IoError::Halted`]          |
    /// | An instruction faulted                         | [`IoError::Interpreter`]     |
    #[doc(alias = "iopush")]
    pub fn io_push(&mut self, value: i64, block: bool) -> Result<(), IoError> {
        log::trace!("iopush({value})");
        self.input.write_int(value)?;
        while block && !self.input.is_empty() {
            if self.step()? == StepOutcome::Halted {
                return Err(IoError::Halted);
            }
        }
        Ok(())
    }

    /// Take the oldest value the program has output.
    ///
    /// If `block` is set and there is no output yet, execute instructions until there is.
    ///
    /// # Errors
    ///
    /// | Condition                                           | Error                    |
    /// |-----------------------------------------------------|--------------------------|
    /// | No output is buffered and `block` isn't set         | [`IoError::NoOutput`]    |
    /// | The program is waiting on input that isn't queued   | [`IoError::NoInput`]     |
    /// | The program halted without producing output         | [`IoError::Halted`]      |
    /// | An instruction faulted                              | [`IoError::Interpreter`] |
    ///
    /// Waiting on input does not fault the interpreter, so it can continue after [`io_push`].
    ///
    /// [`io_push`]: Interpreter::io_push
    #[doc(alias = "iopop")]
    pub fn io_pop(&mut self, block: bool) -> Result<i64, IoError> {
        while block && self.output.is_empty() {
            if self.status == Status::Halted {
                return Err(IoError::Halted);
            }
            if self.awaiting_input() {
                return Err(IoError::NoInput);
            }
            self.step()?;
        }
        let value = self.output.pop().ok_or(IoError::NoOutput)?;
        log::trace!("iopop() -> {value}");
        Ok(value)
    }

    /// Whether the next instruction is `IN` and there's no queued input for it
    pub fn awaiting_input(&self) -> bool {
        self.status == Status::Running
            && self.input.is_empty()
            && self.current_instruction().opcode() == OpCode::In
    }

    /// Execute until either the program halts, or it tries to read nonexistent input.
    /// Returns `Ok((v, s))`, where `v` is a [`Vec<i64>`] containing all outputs that it found, and
    /// `s` is the [`State`] at the time it stopped.
    ///
    /// Running out of input is not a fault: the interpreter can be resumed by calling this again
    /// with more input.
    ///
    /// # Errors
    ///
    /// If an internal call to [`self.step`][Interpreter::step] fails, returns the resulting
    /// [`InterpreterError`] unchanged.
    pub fn run_through_inputs(
        &mut self,
        inputs: impl IntoIterator<Item = i64>,
    ) -> Result<(Vec<i64>, State), InterpreterError> {
        let mut inputs = inputs.into_iter();
        let state = loop {
            if self.status == Status::Halted {
                break State::Halted;
            }
            if self.awaiting_input() {
                match inputs.next() {
                    Some(i) => self.input.push(i),
                    None => break State::Awaiting,
                }
            }
            self.step()?;
        };
        Ok((self.output.drain(), state))
    }
}

impl<R: IntReader, W: IntWriter> Interpreter<R, W> {
    /// Create a new interpreter reading from `input` and writing to `output`. Collects `code`
    /// into the starting memory state.
    pub fn with_io(code: impl IntoIterator<Item = i64>, input: R, output: W) -> Self {
        Self {
            index: 0,
            rel_offset: 0,
            code: code.into_iter().collect(),
            status: Status::Running,
            input,
            output,
            trace: None,
        }
    }

    /// Fetch, decode, and execute a single instruction
    ///
    /// `IN` and `OUT` block for as long as the attached endpoint does.
    ///
    /// # Example
    ///
    /// ```
    /// use intcode::prelude::*;
    /// let mut interp = Interpreter::new([1101, 90, 9, 8, 3, 7, 4, -1]);
    ///
    /// // the first instruction is `ADD #90, #9, 8`
    /// assert_eq!(interp.step().unwrap(), StepOutcome::Running);
    /// // the second instruction is `IN 7`, which overwrites the `OUT` operand
    /// interp.io_push(8, false).unwrap();
    /// assert_eq!(interp.step().unwrap(), StepOutcome::Running);
    /// // `OUT 8` now outputs the 99 the first instruction stored
    /// assert_eq!(interp.step().unwrap(), StepOutcome::Running);
    /// assert_eq!(interp.io_pop(false).unwrap(), 99);
    /// // which is also the next instruction
    /// assert_eq!(interp.step().unwrap(), StepOutcome::Halted);
    /// ```
    ///
    /// # Errors
    ///
    /// If the interpreter previously halted, returns [`InterpreterError::Halted`], and if it
    /// previously faulted, returns [`InterpreterError::Poisoned`], before attempting to do
    /// anything.
    ///
    /// Otherwise, if any of the following conditions occur, it marks itself as faulted and
    /// returns the listed [`InterpreterError`] variant:
    ///
    /// | Condition                                           | Error type             |
    /// |-----------------------------------------------------|------------------------|
    /// | Opcode is unrecognized                              | [`IllegalInstruction`] |
    /// | Mode digit is unrecognized                          | [`UnknownMode`]        |
    /// | Instruction accesses a negative index               | [`NegativeMemAccess`]  |
    /// | Memory can't grow to hold a written address         | [`OutOfMemory`]        |
    /// | Jump instruction would jump to negative index       | [`JumpToNegative`]     |
    /// | Add, Mul, In, Lt, or Eq output is in immediate mode | [`WriteToImmediate`]   |
    /// | The input endpoint fails                            | [`NoInput`]            |
    /// | The output endpoint fails                           | [`NoOutput`]           |
    ///
    /// [`IllegalInstruction`]: InterpreterError::IllegalInstruction
    /// [`UnknownMode`]: InterpreterError::UnknownMode
    /// [`NegativeMemAccess`]: InterpreterError::NegativeMemAccess
    /// [`OutOfMemory`]: InterpreterError::OutOfMemory
    /// [`JumpToNegative`]: InterpreterError::JumpToNegative
    /// [`WriteToImmediate`]: InterpreterError::WriteToImmediate
    /// [`NoInput`]: InterpreterError::NoInput
    /// [`NoOutput`]: InterpreterError::NoOutput
    pub fn step(&mut self) -> Result<StepOutcome, InterpreterError> {
        match self.status {
            Status::Running => (),
            Status::Halted => return Err(InterpreterError::Halted),
            Status::Faulted => return Err(InterpreterError::Poisoned),
        }
        let result = self.exec_instruction();
        match &result {
            Ok(StepOutcome::Running) => (),
            Ok(StepOutcome::Halted) => self.status = Status::Halted,
            Err(e) => {
                log::debug!("interpreter faulted: {e}");
                self.status = Status::Faulted;
            }
        }
        result
    }

    /// Step until the program halts
    ///
    /// # Errors
    ///
    /// Returns the first error from [`step`](Interpreter::step) unchanged.
    pub fn run(&mut self) -> Result<(), InterpreterError> {
        while self.step()? == StepOutcome::Running {}
        Ok(())
    }

    fn exec_instruction(&mut self) -> Result<StepOutcome, InterpreterError> {
        debug_assert!(self.index >= 0, "uncaught negative instruction index");

        let instr = self.current_instruction();
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", self.signature(&instr));
        }

        match instr.opcode() {
            OpCode::Illegal => Err(InterpreterError::IllegalInstruction {
                instruction: instr.word(),
                address: self.index,
            }),
            OpCode::Add => self.op3(&instr, i64::wrapping_add),
            OpCode::Mul => self.op3(&instr, i64::wrapping_mul),
            OpCode::In => {
                let dest = self.resolve_dest(&instr, 0)?;
                let input = self
                    .input
                    .read_int()
                    .map_err(|source| InterpreterError::NoInput {
                        address: self.index,
                        source,
                    })?;
                self.store(&instr, dest, input)?;
                self.record(&instr, &[input]);
                self.advance(2);
                Ok(StepOutcome::Running)
            }
            OpCode::Out => {
                let value = self.resolve_param(&instr, 0)?;
                self.output
                    .write_int(value)
                    .map_err(|source| InterpreterError::NoOutput {
                        address: self.index,
                        value,
                        source,
                    })?;
                self.record(&instr, &[value]);
                self.advance(2);
                Ok(StepOutcome::Running)
            }
            OpCode::Jnz => self.jump(&instr, |i| i != 0),
            OpCode::Jz => self.jump(&instr, |i| i == 0),
            OpCode::Lt => self.op3(&instr, |a, b| i64::from(a < b)),
            OpCode::Eq => self.op3(&instr, |a, b| i64::from(a == b)),
            OpCode::Rbo => {
                let offset = self.resolve_param(&instr, 0)?;
                self.record(&instr, &[offset]);
                self.rel_offset = self.rel_offset.wrapping_add(offset);
                self.advance(2);
                Ok(StepOutcome::Running)
            }
            OpCode::Halt => {
                self.record(&instr, &[]);
                Ok(StepOutcome::Halted)
            }
        }
    }
}

impl<R, W> Interpreter<R, W> {
    /// Read memory at `address`, resolved according to `mode`:
    ///
    /// * [`Immediate`](ParamMode::Immediate): the value stored at `address`
    /// * [`Positional`](ParamMode::Positional): the value stored at the address stored at
    ///   `address`
    /// * [`Relative`](ParamMode::Relative): like positional, but offset by the relative base
    ///
    /// Addresses past the end of allocated memory read as `0`.
    ///
    /// # Errors
    ///
    /// if `address` or the address it resolves to is negative, returns a [`NegativeMemAccess`]
    /// error
    #[doc(alias = "peek")]
    pub fn mem_get(&self, address: i64, mode: ParamMode) -> Result<i64, NegativeMemAccess> {
        let stored = self.code.get(internals::to_index(address)?);
        match mode {
            ParamMode::Immediate => Ok(stored),
            ParamMode::Positional => Ok(self.code.get(internals::to_index(stored)?)),
            ParamMode::Relative => Ok(self.code.get(internals::to_index(
                stored.wrapping_add(self.rel_offset),
            )?)),
        }
    }

    /// Manually set a memory location to a provided value, growing memory if needed
    ///
    /// # Errors
    ///
    /// if `address` is negative, returns [`MemoryError::Negative`], and if memory can't grow to
    /// hold it, returns [`MemoryError::OutOfMemory`]
    #[doc(alias("poke", "write", "mem_override"))]
    pub fn mem_set(&mut self, address: i64, value: i64) -> Result<(), MemoryError> {
        self.code.set(internals::to_index(address)?, value)?;
        Ok(())
    }

    /// Get a range of memory addresses
    ///
    /// ```
    /// use intcode::prelude::*;
    /// let mut interp = Interpreter::new([1101, 90, 9, 4]);
    /// interp.run().unwrap();
    /// let expected: &[i64] = &[1101, 90, 9, 4, 99];
    /// assert_eq!(interp.get_range(0..5).unwrap(), expected);
    /// assert_eq!(interp.get_range(100..110).unwrap(), [0_i64; 10].as_slice());
    /// ```
    ///
    /// # Errors
    ///
    /// If the range starts with a negative index, returns [`NegativeMemAccess`] containing that
    /// index.
    pub fn get_range(&self, range: Range<i64>) -> Result<Cow<'_, [i64]>, NegativeMemAccess> {
        let start = internals::to_index(range.start)?;
        let end = internals::to_index(range.end).unwrap_or(start).max(start);
        Ok(self.code.get_range(start..end))
    }

    /// The current lifecycle state
    pub fn status(&self) -> Status {
        self.status
    }

    /// Address of the next instruction
    #[doc(alias("ip", "pc"))]
    pub fn program_counter(&self) -> i64 {
        self.index
    }

    /// The relative base register
    pub fn relative_base(&self) -> i64 {
        self.rel_offset
    }

    /// Borrow the input and output endpoints
    pub fn io(&self) -> (&R, &W) {
        (&self.input, &self.output)
    }

    /// Mutably borrow the input and output endpoints
    pub fn io_mut(&mut self) -> (&mut R, &mut W) {
        (&mut self.input, &mut self.output)
    }

    /// Discard the interpreter, returning its input and output endpoints
    pub fn into_io(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Consume the interpreter, returning its memory, without trailing zeroes
    pub fn into_memory(self) -> Vec<i64> {
        self.code.into_iter().collect()
    }
}
