// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Run an Intcode program interactively, using stdin and stdout for I/O
//!
//! By default, each int is one byte of text, as in Aft Scaffolding Control and Information
//! Interface programs. With `--numeric`, each int is a line of decimal text instead.

use std::fs;
use std::io::{self, BufRead, Cursor, Write, stdin, stdout};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use intcode::error::IoError;
use intcode::io::{ByteReader, ByteWriter, IntReader, IntWriter, OverflowPolicy};
use intcode::program::Encoding;
use intcode::Interpreter;

#[derive(PartialEq, Clone, Copy, ValueEnum)]
enum CodeFormat {
    /// comma-separated ASCII-encoded decimal numbers
    #[value(alias("text"))]
    #[value(alias("aoc"))]
    Ascii,
    /// little-endian 64-bit integers
    #[cfg_attr(target_endian = "little", value(alias("binary-native")))]
    #[value(name("binary-little-endian"), alias("binle"))]
    LittleEndian,
    #[cfg_attr(target_endian = "big", value(alias("binary-native")))]
    #[value(name("binary-big-endian"), alias("binbe"))]
    /// big-endian 64-bit integers
    BigEndian,
}

impl From<CodeFormat> for Encoding {
    fn from(format: CodeFormat) -> Self {
        match format {
            CodeFormat::Ascii => Encoding::Text,
            CodeFormat::LittleEndian => Encoding::LittleEndian,
            CodeFormat::BigEndian => Encoding::BigEndian,
        }
    }
}

const VERSION: &str = concat!(env!("CARGO_CRATE_NAME"), '-', env!("CARGO_PKG_VERSION"));

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = VERSION)]
#[command(about = "Intcode interpreter", long_about = None)]
struct Args {
    #[arg(help = "The program to run")]
    source: PathBuf,
    #[arg(help = "Input format for the intcode")]
    #[arg(short, long)]
    #[arg(default_value = "ascii")]
    format: CodeFormat,
    #[arg(short, long)]
    #[arg(help = "Read and write decimal ints, one per line, instead of bytes")]
    numeric: bool,
    #[arg(short, long = "input", value_name = "LINE")]
    #[arg(help = "Feed these lines as input instead of reading stdin")]
    input: Vec<String>,
    #[arg(short, long)]
    #[arg(help = "Fail on output that doesn't fit in a byte, instead of printing it in decimal")]
    strict: bool,
    #[arg(short, long)]
    #[arg(help = "Print every executed instruction to stderr once the program stops")]
    trace: bool,
}

/// Reads one decimal int per line
struct LineReader<R>(R);

impl<R: BufRead> IntReader for LineReader<R> {
    fn read_int(&mut self) -> Result<i64, IoError> {
        let mut line = String::new();
        if self.0.read_line(&mut line)? == 0 {
            return Err(IoError::EndOfStream);
        }
        line.trim()
            .parse()
            .map_err(|e| IoError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// Writes one decimal int per line
struct LineWriter<W>(W);

impl<W: Write> IntWriter for LineWriter<W> {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        writeln!(self.0, "{value}")?;
        self.0.flush()?;
        Ok(())
    }
}

fn execute<R: IntReader, W: IntWriter>(
    prog: Vec<i64>,
    input: R,
    output: W,
    trace: bool,
) -> anyhow::Result<()> {
    let mut interp = Interpreter::with_io(prog, input, output);
    if trace {
        interp.start_trace();
    }
    let result = interp.run();
    if let Some(trace) = interp.end_trace() {
        let mut stderr = io::stderr().lock();
        for instr in &trace.0 {
            writeln!(stderr, "{instr}")?;
        }
    }
    result.context("program stopped")
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let bytes = fs::read(&args.source)
        .with_context(|| format!("failed to read {}", args.source.display()))?;
    let prog = Encoding::from(args.format)
        .decode(&bytes)
        .with_context(|| format!("failed to parse {}", args.source.display()))?;
    log::debug!("loaded {} ints from {}", prog.len(), args.source.display());

    let input: Box<dyn BufRead> = if args.input.is_empty() {
        Box::new(stdin().lock())
    } else {
        let mut script = args.input.join("\n");
        script.push('\n');
        Box::new(Cursor::new(script.into_bytes()))
    };
    let output = stdout().lock();

    if args.numeric {
        execute(prog, LineReader(input), LineWriter(output), args.trace)
    } else {
        let policy = if args.strict {
            OverflowPolicy::Strict
        } else {
            OverflowPolicy::Decimal
        };
        execute(
            prog,
            ByteReader::new(input),
            ByteWriter::with_policy(output, policy),
            args.trace,
        )
    }
}
