//! Check the example programs from the Advent of Code 2019 puzzles against the described results,
//! driving each through a different combination of endpoints and adapters.
// SPDX-FileCopyrightText: 2024 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use either::Either;
use intcode::error::IoError;
use intcode::io::{ByteWriter, NullIo};
use intcode::prelude::*;
use intcode::program::run_program;
use intcode::sync_io::SyncIo;
use intcode::trace::Trace;
use intcode::{InterpreterError, OpCode};
use itertools::Itertools;

/// Feed `inputs` to `interp` as it asks for them
///
/// Returns everything it output, on the left if it halted, or on the right if it's waiting for
/// more input.
fn drive(
    interp: &mut Interpreter,
    inputs: impl IntoIterator<Item = i64>,
) -> Either<Vec<i64>, Vec<i64>> {
    match interp.run_through_inputs(inputs) {
        Ok((output, State::Halted)) => Either::Left(output),
        Ok((output, State::Awaiting)) => Either::Right(output),
        Err(e) => panic!("faulted at {:?}: {e}", e.address()),
    }
}

/// `(address, instruction, stored value)` of each traced instruction
fn summarize(Trace(trace): &Trace) -> Vec<(i64, i64, Option<i64>)> {
    trace
        .iter()
        .map(|t| (t.instr_ptr(), t.op_int(), t.stored_val()))
        .collect_vec()
}

mod day2 {
    use crate::*;

    #[test]
    fn extended_example() {
        let mut interp = Interpreter::new([1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        interp.start_trace();
        assert_eq!(drive(&mut interp, empty()), Either::Left(vec![]));
        assert_eq!(
            summarize(&interp.end_trace().unwrap()),
            [(0, 1, Some(70)), (4, 2, Some(3500)), (8, 99, None)]
        );
        assert_eq!(
            interp.into_memory(),
            [3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]
        );
    }

    #[test]
    fn small_examples() {
        let cases: [(&[i64], &[i64]); 4] = [
            (&[1, 0, 0, 0, 99], &[2, 0, 0, 0, 99]),
            (&[2, 3, 0, 3, 99], &[2, 3, 0, 6, 99]),
            (&[2, 4, 4, 5, 99, 0], &[2, 4, 4, 5, 99, 9801]),
            (&[1, 1, 1, 4, 99, 5, 6, 0, 99], &[30, 1, 1, 4, 2, 5, 6, 0, 99]),
        ];
        for (program, result) in cases {
            let mut interp = Interpreter::with_io(program.iter().copied(), NullIo, NullIo);
            interp.run().unwrap();
            assert_eq!(interp.status(), Status::Halted);
            assert_eq!(interp.into_memory(), result, "{program:?}");
        }
    }

    /// the extended example with its noun and verb replaced before running
    #[test]
    fn noun_and_verb() {
        let mut interp = Interpreter::new([1, 0, 0, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        interp.mem_set(1, 9).unwrap();
        interp.mem_set(2, 10).unwrap();
        interp.run().unwrap();
        assert_eq!(interp.mem_get(0, ParamMode::Immediate), Ok(3500));
    }
}

mod day5 {
    use crate::*;

    #[test]
    fn echo_through_sync_io() {
        for i in [-128, -1, 0, 1, 1 << 40] {
            let mut echo = SyncIo::new([3, 0, 4, 0, 99]);
            echo.write_int(i).unwrap();
            assert_eq!(echo.read_int().unwrap(), i);
            assert!(matches!(echo.read_int(), Err(IoError::Halted)));
        }
    }

    #[test]
    fn immediate_mode_example() {
        let mut interp = Interpreter::with_io([1002, 4, 3, 4, 33], NullIo, NullIo);
        interp.start_trace();
        interp.run().unwrap();
        let trace = interp.end_trace().unwrap();
        assert_eq!(summarize(&trace), [(0, 1002, Some(99)), (4, 99, None)]);
        assert_eq!(
            trace.0[0].param_modes(),
            [ParamMode::Positional, ParamMode::Immediate, ParamMode::Positional]
        );
    }

    #[test]
    fn negative_immediate() {
        let mut interp = Interpreter::new([1101, 100, -1, 4, 0]);
        interp.run().unwrap();
        assert_eq!(interp[4], 99);
    }

    #[test]
    fn comparison_examples() {
        let cases: [(&[i64], fn(i64) -> bool); 4] = [
            (&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8], |i| i == 8),
            (&[3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8], |i| i < 8),
            (&[3, 3, 1108, -1, 8, 3, 4, 3, 99], |i| i == 8),
            (&[3, 3, 1107, -1, 8, 3, 4, 3, 99], |i| i < 8),
        ];
        for (program, expected) in cases {
            for input in 6..=10 {
                assert_eq!(
                    run_program(program.iter().copied(), [input]).unwrap(),
                    [i64::from(expected(input))],
                    "{program:?} with {input}"
                );
            }
        }
    }

    #[test]
    fn jump_examples() {
        let programs: [&[i64]; 2] = [
            &[3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9],
            &[3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1],
        ];
        for program in programs {
            for input in [-3, 0, 1, 5] {
                let mut interp = Interpreter::with_io(
                    program.iter().copied(),
                    IntBuffer::from(vec![input]),
                    Vec::new(),
                );
                interp.start_trace();
                interp.run().unwrap();
                let jumped = interp.end_trace().unwrap().0[1].op_code();
                assert!(matches!(jumped, OpCode::Jz | OpCode::Jnz), "{jumped:?}");
                assert_eq!(interp.into_io().1, [i64::from(input != 0)]);
            }
        }
    }

    /// outputs 999, 1000, or 1001 as the input is below, equal to, or above 8
    #[test]
    fn larger_example() {
        let program = [
            3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0,
            0, 1002, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 1101, 1000, 1, 20, 4,
            20, 1105, 1, 46, 98, 99,
        ];
        for (input, output) in [(-8, 999), (7, 999), (8, 1000), (9, 1001), (800, 1001)] {
            let mut sio = SyncIo::new(program);
            sio.write_int(input).unwrap();
            assert_eq!(sio.read_int().unwrap(), output, "input {input}");
            assert!(matches!(sio.read_int(), Err(IoError::Halted)));
        }
    }

    #[test]
    fn missing_input() {
        let program = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];

        let mut interp = Interpreter::new(program);
        assert_eq!(drive(&mut interp, empty()), Either::Right(vec![]));
        assert_eq!(interp.status(), Status::Running);
        assert_eq!(drive(&mut interp, [8]), Either::Left(vec![1]));

        let err = run_program(program, []).unwrap_err();
        assert!(
            matches!(
                err,
                InterpreterError::NoInput {
                    address: 0,
                    source: IoError::EndOfStream
                }
            ),
            "{err:?}"
        );
    }
}

mod day9 {
    use crate::*;

    /// takes no input and produces a copy of itself as output
    #[test]
    fn quine() {
        let quine = [
            109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
        ];
        let mut interp = Interpreter::with_io(quine, NullIo, Vec::new());
        interp.run().unwrap();
        assert_eq!(interp.relative_base(), 16);
        assert_eq!(interp.into_io().1, quine);
    }

    #[test]
    fn sixteen_digit_output() {
        let output = run_program([1102, 34915192, 34915192, 7, 4, 7, 99, 0], []).unwrap();
        assert_eq!(output, [34915192 * 34915192]);
        assert_eq!(output[0].to_string().len(), 16);
    }

    /// too large for a byte, so a byte endpoint writes it out in decimal
    #[test]
    fn large_number() {
        let mut out = Vec::new();
        let mut interp =
            Interpreter::with_io([104, 1125899906842624, 99], NullIo, ByteWriter::new(&mut out));
        interp.run().unwrap();
        drop(interp);
        assert_eq!(out, b"1125899906842624\n");
    }

    /// with a relative base of 2000, `109,19` then `204,-34` outputs the value at 1985
    #[test]
    fn relative_base_walkthrough() {
        let mut interp = Interpreter::new([109, 2000, 109, 19, 204, -34, 99]);
        interp.mem_set(1985, 42).unwrap();
        assert_eq!(drive(&mut interp, empty()), Either::Left(vec![42]));
        assert_eq!(interp.relative_base(), 2019);
    }
}
