// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Loading and running whole programs
//!
//! Programs are usually distributed as comma-separated decimal integers, but can also be stored
//! as packed 64-bit integers of either byte order.

use std::fs;
use std::path::Path;

use crate::error::{InterpreterError, ProgramError};
use crate::io::IntBuffer;
use crate::Interpreter;

/// How a program is encoded
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Encoding {
    /// comma-separated ASCII-encoded decimal numbers
    #[default]
    Text,
    /// little-endian 64-bit integers
    LittleEndian,
    /// big-endian 64-bit integers
    BigEndian,
}

impl Encoding {
    /// Decode `bytes` as a program in this encoding
    ///
    /// # Errors
    ///
    /// Text that isn't UTF-8 is rejected as [`ProgramError::NotUtf8`], and the errors of
    /// [`parse_program`] and [`parse_binary`] are passed through.
    pub fn decode(self, bytes: &[u8]) -> Result<Vec<i64>, ProgramError> {
        match self {
            Self::Text => {
                parse_program(std::str::from_utf8(bytes)?)
            }
            Self::LittleEndian => parse_binary(bytes, i64::from_le_bytes),
            Self::BigEndian => parse_binary(bytes, i64::from_be_bytes),
        }
    }
}

/// Parse comma-separated decimal integers
///
/// Whitespace around each token, including a trailing newline, is ignored.
///
/// ```
/// use intcode::program::parse_program;
/// assert_eq!(parse_program("1,0, 0,-3,99\n").unwrap(), vec![1, 0, 0, -3, 99]);
/// assert!(parse_program("1,,2").is_err());
/// ```
///
/// # Errors
///
/// If a token is not a signed decimal integer, returns [`ProgramError::BadToken`] identifying it.
pub fn parse_program(text: &str) -> Result<Vec<i64>, ProgramError> {
    text.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(index, token)| {
            token.parse().map_err(|source| ProgramError::BadToken {
                index,
                token: token.to_owned(),
                source,
            })
        })
        .collect()
}

/// Parse packed 8-byte integers, converting each with `func`
///
/// # Errors
///
/// If the length isn't a multiple of 8, returns [`ProgramError::IncompleteInt`] with the number
/// of leftover bytes.
pub fn parse_binary<F: Fn([u8; 8]) -> i64>(
    bytes: &[u8],
    func: F,
) -> Result<Vec<i64>, ProgramError> {
    let (chunks, remainder) = bytes.as_chunks::<8>();
    if !remainder.is_empty() {
        return Err(ProgramError::IncompleteInt(remainder.len()));
    }
    Ok(chunks.iter().copied().map(func).collect())
}

/// Read and parse a text program from `path`
///
/// # Errors
///
/// Returns [`ProgramError::Io`] if the file can't be read, [`ProgramError::NotUtf8`] if it isn't
/// text, or the errors of [`parse_program`].
pub fn load_program(path: impl AsRef<Path>) -> Result<Vec<i64>, ProgramError> {
    let bytes = fs::read(path.as_ref())?;
    log::debug!("loaded {} bytes from {}", bytes.len(), path.as_ref().display());
    Encoding::Text.decode(&bytes)
}

/// Run `program` to completion with a fixed list of inputs, returning everything it output
///
/// ```
/// use intcode::program::run_program;
/// // outputs 1 if the input is 8
/// let prog = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
/// assert_eq!(run_program(prog, [8]).unwrap(), vec![1]);
/// assert_eq!(run_program(prog, [7]).unwrap(), vec![0]);
/// ```
///
/// # Errors
///
/// Returns the [`InterpreterError`] of the first fault, including running out of input.
pub fn run_program(
    program: impl IntoIterator<Item = i64>,
    inputs: impl IntoIterator<Item = i64>,
) -> Result<Vec<i64>, InterpreterError> {
    let mut interp = Interpreter::with_io(
        program,
        inputs.into_iter().collect::<IntBuffer>(),
        Vec::new(),
    );
    interp.run()?;
    Ok(interp.into_io().1)
}
