// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Instruction decoding
//!
//! Given a 5 digit number, digits ABCDE are used as follows:
//! DE is the two-digit opcode
//! C is the 1st parameter's mode
//! B is the 2nd parameter's mode
//! A is the 3rd parameter's mode
//!
//! So *0*1202 would be parsed as follows:
//!
//! Opcode 02 is multiply
//! C=2: 1st parameter is in relative mode
//! B=1: 2nd parameter is in immediate mode
//! A=0: 3rd parameter is in positional mode
//!
//! A fourth mode digit is decoded as well, though no instruction has more than 3 parameters.

use std::fmt::{self, Display};

use crate::error::UnknownMode;

/// Parameter mode for Intcode instruction
///
/// Intcode instruction parameters each have a mode:  [positional], [immediate], or [relative].
///
/// When executing an intcode instruction, the instruction's parameters are interpreted in
/// accordance with their associated modes.
///
/// [positional]: ParamMode::Positional
/// [immediate]: ParamMode::Immediate
/// [relative]: ParamMode::Relative
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ParamMode {
    /// Positional Mode
    ///
    /// A parameter in positional mode evaluates to the value at the address specified by the
    /// parameter.
    Positional = 0,
    /// Immediate Mode
    ///
    /// A parameter in immediate mode evaluates directly to the value specified. Instructions which
    /// write to memory may not use immediate mode for their destinations.
    #[doc(alias = "#")]
    Immediate = 1,
    /// Relative Mode
    ///
    /// Like positional mode, but the address is offset by the relative base, which starts out as
    /// `0` and is adjusted by the `RBO` instruction.
    #[doc(alias = "$")]
    Relative = 2,
}

impl TryFrom<i64> for ParamMode {
    type Error = UnknownMode;
    fn try_from(i: i64) -> Result<Self, Self::Error> {
        match i {
            0 => Ok(ParamMode::Positional),
            1 => Ok(ParamMode::Immediate),
            2 => Ok(ParamMode::Relative),
            _ => Err(UnknownMode(i)),
        }
    }
}

/// An Intcode opcode
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(missing_docs, reason = "trivial")]
pub enum OpCode {
    /// Sentinel for any value with no handler
    Illegal = 0,
    Add = 1,
    Mul = 2,
    In = 3,
    Out = 4,
    Jnz = 5,
    Jz = 6,
    Lt = 7,
    Eq = 8,
    Rbo = 9,
    Halt = 99,
}

impl From<i64> for OpCode {
    fn from(i: i64) -> Self {
        opcode_of(i)
    }
}

impl OpCode {
    /// Number of ints the instruction occupies, including the opcode itself
    pub const fn width(self) -> i64 {
        match self {
            Self::Add | Self::Mul | Self::Lt | Self::Eq => 4,
            Self::Jnz | Self::Jz => 3,
            Self::In | Self::Out | Self::Rbo => 2,
            Self::Halt | Self::Illegal => 1,
        }
    }

    /// Number of parameters the instruction takes
    pub const fn arity(self) -> usize {
        (self.width() - 1) as usize
    }

    /// Long-form name used in execution logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Illegal => "illegal",
            Self::Add => "add",
            Self::Mul => "multiply",
            Self::In => "input",
            Self::Out => "output",
            Self::Jnz => "jump-if-true",
            Self::Jz => "jump-if-false",
            Self::Lt => "less-than",
            Self::Eq => "equal",
            Self::Rbo => "adjust-rel-base",
            Self::Halt => "halt",
        }
    }

    /// Names of the instruction's parameters, in order
    pub const fn param_names(self) -> &'static [&'static str] {
        match self {
            Self::Add | Self::Mul | Self::Lt | Self::Eq => &["a", "b", "addr"],
            Self::In => &["addr"],
            Self::Out => &["v"],
            Self::Jnz | Self::Jz => &["v", "addr"],
            Self::Rbo => &["offset"],
            Self::Halt | Self::Illegal => &[],
        }
    }

    /// Whether the final parameter is a write destination
    pub const fn writes(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Mul | Self::In | Self::Lt | Self::Eq
        )
    }
}

impl Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Illegal => write!(f, "ILLEGAL"),
            Self::Add => write!(f, "ADD"),
            Self::Mul => write!(f, "MUL"),
            Self::In => write!(f, "IN"),
            Self::Out => write!(f, "OUT"),
            Self::Jnz => write!(f, "JNZ"),
            Self::Jz => write!(f, "JZ"),
            Self::Lt => write!(f, "LT"),
            Self::Eq => write!(f, "EQ"),
            Self::Rbo => write!(f, "RBO"),
            Self::Halt => write!(f, "HALT"),
        }
    }
}

/// A decoded instruction word
///
/// Mode digits are kept as-is; they only have to be valid for parameters the opcode uses.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Instruction {
    word: i64,
    opcode: OpCode,
    mode_digits: [i64; 4],
}

impl Instruction {
    /// Split `word` into its opcode and four parameter mode digits
    pub const fn decode(word: i64) -> Self {
        let mut mode_digits = [0; 4];
        let mut rest = word / 100;
        let mut i = 0;
        while i < mode_digits.len() {
            mode_digits[i] = rest % 10;
            rest /= 10;
            i += 1;
        }
        Self {
            word,
            opcode: opcode_of(word % 100),
            mode_digits,
        }
    }

    /// The raw instruction word
    pub const fn word(&self) -> i64 {
        self.word
    }

    /// The decoded opcode, [`OpCode::Illegal`] if unrecognized
    pub const fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// The mode of parameter `n`, counting from 0
    ///
    /// # Panics
    ///
    /// Panics if `n` is greater than 3
    pub fn mode(&self, n: usize) -> Result<ParamMode, UnknownMode> {
        ParamMode::try_from(self.mode_digits[n])
    }

    /// The modes of all 4 parameters
    ///
    /// # Errors
    ///
    /// Returns the first digit that isn't a valid mode
    pub fn modes(&self) -> Result<[ParamMode; 4], UnknownMode> {
        Ok([self.mode(0)?, self.mode(1)?, self.mode(2)?, self.mode(3)?])
    }
}

const fn opcode_of(i: i64) -> OpCode {
    match i {
        1 => OpCode::Add,
        2 => OpCode::Mul,
        3 => OpCode::In,
        4 => OpCode::Out,
        5 => OpCode::Jnz,
        6 => OpCode::Jz,
        7 => OpCode::Lt,
        8 => OpCode::Eq,
        9 => OpCode::Rbo,
        99 => OpCode::Halt,
        _ => OpCode::Illegal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_decode() {
        let instr = Instruction::decode(1002);
        assert_eq!(instr.opcode(), OpCode::Mul);
        assert_eq!(
            instr.modes(),
            Ok([
                ParamMode::Positional,
                ParamMode::Immediate,
                ParamMode::Positional,
                ParamMode::Positional
            ])
        );
    }

    #[test]
    fn unknown_modes_only_fail_when_used() {
        let instr = Instruction::decode(30104);
        assert_eq!(instr.opcode(), OpCode::Out);
        assert_eq!(instr.mode(0), Ok(ParamMode::Immediate));
        assert_eq!(instr.mode(2), Err(UnknownMode(3)));
    }

    #[test]
    fn illegal_opcodes_decode() {
        for word in [0, 10, 42, 98, 100, -1, -99] {
            assert_eq!(Instruction::decode(word).opcode(), OpCode::Illegal, "{word}");
        }
        assert_eq!(OpCode::from(99), OpCode::Halt);
    }

    #[test]
    fn widths_match_param_names() {
        for op in [
            OpCode::Add,
            OpCode::Mul,
            OpCode::In,
            OpCode::Out,
            OpCode::Jnz,
            OpCode::Jz,
            OpCode::Lt,
            OpCode::Eq,
            OpCode::Rbo,
            OpCode::Halt,
        ] {
            assert_eq!(op.arity(), op.param_names().len(), "{op}");
        }
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn five_digit_words_decode_to_their_digits(
                modes in prop::array::uniform3(0i64..3),
                op in 0i64..100,
            ) {
                let word = modes[2] * 10000 + modes[1] * 1000 + modes[0] * 100 + op;
                let instr = Instruction::decode(word);
                prop_assert_eq!(instr.opcode(), OpCode::from(word % 100));
                for (n, &digit) in modes.iter().enumerate() {
                    prop_assert_eq!(instr.mode(n), ParamMode::try_from(digit));
                }
                prop_assert_eq!(instr.mode(3), Ok(ParamMode::Positional));
            }
        }
    }
}
