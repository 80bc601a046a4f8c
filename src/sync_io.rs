// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Drive an interpreter from the caller's thread, one value at a time

use crate::error::{InterpreterError, IoError};
use crate::io::{IntReader, IntWriter};
use crate::{Interpreter, Status};

/// An interpreter that runs just far enough to satisfy each read or write
///
/// Reading with [`read_int`](IntReader::read_int) executes instructions until the program
/// outputs a value. Writing with [`write_int`](IntWriter::write_int) executes instructions until
/// the program has consumed it.
///
/// ```
/// use intcode::prelude::*;
/// use intcode::sync_io::SyncIo;
///
/// // outputs the sum of each pair of inputs, forever
/// let mut adder = SyncIo::new([3, 20, 3, 21, 1, 20, 21, 22, 4, 22, 1105, 1, 0]);
/// adder.write_int(2).unwrap();
/// adder.write_int(40).unwrap();
/// assert_eq!(adder.read_int().unwrap(), 42);
/// ```
#[derive(Debug, Clone)]
pub struct SyncIo {
    interp: Interpreter,
}

impl SyncIo {
    /// Create an interpreter for `code` with nothing queued
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        Self::from(Interpreter::new(code))
    }

    /// Run until the program halts
    ///
    /// # Errors
    ///
    /// Returns the [`InterpreterError`] of the first fault. Because buffered input is never
    /// refilled while running, a program that reads more than was written fails with
    /// [`InterpreterError::NoInput`].
    pub fn run(&mut self) -> Result<(), InterpreterError> {
        self.interp.run()
    }

    /// Write `line` followed by a newline, one byte per int
    ///
    /// # Errors
    ///
    /// Returns the first error from [`write_int`](IntWriter::write_int).
    pub fn write_line(&mut self, line: &str) -> Result<(), IoError> {
        line.bytes()
            .chain(std::iter::once(b'\n'))
            .try_for_each(|b| self.write_int(i64::from(b)))
    }

    /// Read bytes until a newline, returning the line without it
    ///
    /// # Errors
    ///
    /// If the program outputs a value that isn't a byte, returns [`IoError::ByteOverflow`]
    /// containing it, discarding the partial line. Otherwise, returns the first error from
    /// [`read_int`](IntReader::read_int).
    pub fn read_line(&mut self) -> Result<String, IoError> {
        let mut line = Vec::new();
        loop {
            let value = self.read_int()?;
            match u8::try_from(value) {
                Ok(b'\n') => break,
                Ok(byte) => line.push(byte),
                Err(_) => return Err(IoError::ByteOverflow(value)),
            }
        }
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Whether the program has halted
    pub fn halted(&self) -> bool {
        self.interp.status() == Status::Halted
    }

    /// Borrow the underlying interpreter
    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    /// Discard the adapter, returning the underlying interpreter
    pub fn into_inner(self) -> Interpreter {
        self.interp
    }
}

impl From<Interpreter> for SyncIo {
    fn from(interp: Interpreter) -> Self {
        Self { interp }
    }
}

impl IntReader for SyncIo {
    fn read_int(&mut self) -> Result<i64, IoError> {
        self.interp.io_pop(true)
    }
}

impl IntWriter for SyncIo {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        self.interp.io_push(value, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_reads_and_writes() {
        let mut echo = SyncIo::new([3, 9, 4, 9, 1105, 1, 0, 99, 99, 0]);
        for i in [5, -3, 1 << 40] {
            echo.write_int(i).unwrap();
            assert_eq!(echo.read_int().unwrap(), i);
        }
        assert!(!echo.halted());
    }

    #[test]
    fn waiting_for_input_does_not_fault() {
        let mut echo = SyncIo::new([3, 9, 4, 9, 1105, 1, 0, 99, 99, 0]);
        assert!(matches!(echo.read_int(), Err(IoError::NoInput)));
        assert_eq!(echo.interpreter().status(), Status::Running);
        echo.write_int(1).unwrap();
        assert_eq!(echo.read_int().unwrap(), 1);
    }

    #[test]
    fn halted_program() {
        let mut sio = SyncIo::new([104, 7, 99]);
        assert_eq!(sio.read_int().unwrap(), 7);
        assert!(matches!(sio.read_int(), Err(IoError::Halted)));
        assert!(sio.halted());
        assert!(matches!(sio.write_int(1), Err(IoError::Halted)));
    }

    #[test]
    fn faults_are_reported() {
        let mut sio = SyncIo::new([104, 7, 42]);
        assert_eq!(sio.read_int().unwrap(), 7);
        let err = sio.read_int().unwrap_err();
        assert!(
            matches!(
                &err,
                IoError::Interpreter(e)
                    if matches!(**e, InterpreterError::IllegalInstruction { address: 2, .. })
            ),
            "{err:?}"
        );
    }

    #[test]
    fn lines() {
        // echo each input back
        let mut sio = SyncIo::new([3, 9, 4, 9, 1105, 1, 0, 99, 99, 0]);
        sio.write_line("hi").unwrap();
        assert_eq!(sio.read_line().unwrap(), "hi");

        let mut big = SyncIo::new([104, 104, 104, 1_000_000, 99]);
        assert!(matches!(big.read_line(), Err(IoError::ByteOverflow(1_000_000))));
    }
}
