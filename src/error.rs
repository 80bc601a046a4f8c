// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Error types for the interpreter, its I/O endpoints, and program loading

use std::io;
use std::num::ParseIntError;
use std::str::Utf8Error;
use thiserror::Error;

use crate::OpCode;

/// Attempted to access the contained negative memory index
#[repr(transparent)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[error("could not convert {0} to unsigned index")]
pub struct NegativeMemAccess(pub i64);

/// Memory couldn't grow to hold the contained address
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[error("could not allocate memory up to address {0}")]
pub struct OutOfMemory(pub usize);

/// Failure of a direct memory access from outside the program
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum MemoryError {
    /// The address was negative
    #[error(transparent)]
    Negative(#[from] NegativeMemAccess),
    /// The address was too far out to allocate
    #[error(transparent)]
    OutOfMemory(#[from] OutOfMemory),
}

/// A parameter mode digit that doesn't correspond to any [`ParamMode`](crate::ParamMode)
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[error("unknown parameter mode {0}")]
pub struct UnknownMode(pub i64);

/// A failure reported by an [`IntReader`](crate::io::IntReader) or
/// [`IntWriter`](crate::io::IntWriter)
#[derive(Debug, Error)]
pub enum IoError {
    /// No further values will ever arrive
    #[error("end of stream")]
    EndOfStream,
    /// A bounded buffer refused a value
    #[error("buffer full")]
    BufferFull,
    /// The receiving side of a channel is gone
    #[error("receiver disconnected")]
    Disconnected,
    /// A strict byte endpoint was given a value outside of `0..=255`
    #[error("{0} does not fit in a byte")]
    ByteOverflow(i64),
    /// A [`SyncIo`](crate::sync_io::SyncIo) program wants input that hasn't been written yet
    #[error("program is waiting for input")]
    NoInput,
    /// An output buffer was popped while empty
    #[error("no output available")]
    NoOutput,
    /// A [`SyncIo`](crate::sync_io::SyncIo) program has halted
    #[error("program has halted")]
    Halted,
    /// A driven interpreter faulted
    #[error(transparent)]
    Interpreter(Box<InterpreterError>),
    /// The underlying byte stream failed
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<InterpreterError> for IoError {
    fn from(err: InterpreterError) -> Self {
        match err {
            InterpreterError::Halted => Self::Halted,
            err => Self::Interpreter(Box::new(err)),
        }
    }
}

/// An error occured when executing an intcode instruction
#[derive(Debug, Error)]
pub enum InterpreterError {
    /// The opcode has no handler
    #[error("illegal instruction {instruction} at address {address}")]
    IllegalInstruction {
        /// the full instruction word
        instruction: i64,
        /// program counter at the time
        address: i64,
    },
    /// A parameter used a mode digit that isn't defined
    #[error("{mode} in instruction {instruction} at address {address}")]
    UnknownMode {
        /// the offending digit
        mode: UnknownMode,
        /// the full instruction word
        instruction: i64,
        /// program counter at the time
        address: i64,
    },
    /// A parameter resolved to a negative memory address
    #[error("{opcode} at address {address}: {access}")]
    NegativeMemAccess {
        /// the executing opcode
        opcode: OpCode,
        /// program counter at the time
        address: i64,
        /// the rejected index
        access: NegativeMemAccess,
    },
    /// A write needed more memory than could be allocated
    #[error("{opcode} at address {address}: {access}")]
    OutOfMemory {
        /// the executing opcode
        opcode: OpCode,
        /// program counter at the time
        address: i64,
        /// the address written to
        access: OutOfMemory,
    },
    /// A jump resolved to a negative address
    #[error("{opcode} at address {address} jumped to negative address {target}")]
    JumpToNegative {
        /// the executing opcode
        opcode: OpCode,
        /// program counter at the time
        address: i64,
        /// the jump target
        target: i64,
    },
    /// An instruction tried to write to an immediate destination
    #[error("{opcode} at address {address} attempted to write to immediate {operand}")]
    WriteToImmediate {
        /// the executing opcode
        opcode: OpCode,
        /// program counter at the time
        address: i64,
        /// the raw destination operand
        operand: i64,
    },
    /// The input endpoint had nothing to give
    #[error("no input for IN at address {address}: {source}")]
    NoInput {
        /// program counter at the time
        address: i64,
        /// why the read failed
        source: IoError,
    },
    /// The output endpoint refused a value
    #[error("output of {value} rejected at address {address}: {source}")]
    NoOutput {
        /// program counter at the time
        address: i64,
        /// the value that couldn't be written
        value: i64,
        /// why the write failed
        source: IoError,
    },
    /// The interpreter was stepped after it halted
    #[error("interpreter has halted")]
    Halted,
    /// An interpreter was used after previously erroring out
    #[error("tried to reuse an interpreter after a fatal error")]
    Poisoned,
}

impl InterpreterError {
    /// The program counter the fault happened at, if the error came from executing an instruction
    pub fn address(&self) -> Option<i64> {
        match self {
            Self::IllegalInstruction { address, .. }
            | Self::UnknownMode { address, .. }
            | Self::NegativeMemAccess { address, .. }
            | Self::OutOfMemory { address, .. }
            | Self::JumpToNegative { address, .. }
            | Self::WriteToImmediate { address, .. }
            | Self::NoInput { address, .. }
            | Self::NoOutput { address, .. } => Some(*address),
            Self::Halted | Self::Poisoned => None,
        }
    }
}

/// Malformed program text
#[derive(Debug, Error)]
pub enum ProgramError {
    /// A token was not a signed decimal integer
    #[error("token {index} ({token:?}) is not an integer: {source}")]
    BadToken {
        /// zero-based position of the token
        index: usize,
        /// the token, with surrounding whitespace removed
        token: String,
        /// the parse failure
        source: ParseIntError,
    },
    /// A text program was not valid UTF-8
    #[error("program text is not UTF-8: {0}")]
    NotUtf8(#[from] Utf8Error),
    /// A binary program's length was not a multiple of 8 bytes
    #[error("expected a multiple of 8 bytes, {0} left over")]
    IncompleteInt(usize),
    /// The program file couldn't be read
    #[error("failed to read program: {0}")]
    Io(#[from] io::Error),
}
