// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Pluggable I/O endpoints for the [`Interpreter`](crate::Interpreter)
//!
//! An interpreter reads from an [`IntReader`] and writes to an [`IntWriter`]. Both calls may
//! block, which is how interpreters running on separate threads synchronize with each other.
//!
//! | Endpoint            | Reads                         | Writes                         |
//! |---------------------|-------------------------------|--------------------------------|
//! | [`IntBuffer`]       | FIFO queue                    | FIFO queue, bounded            |
//! | [`NullIo`]          | always [`EndOfStream`]        | discards                       |
//! | [`ChannelReader`]   | blocks on an [`mpsc`] channel |                                |
//! | [`ChannelWriter`]   |                               | sends on an [`mpsc`] channel   |
//! | [`ByteReader`]      | one byte per int              |                                |
//! | [`ByteWriter`]      |                               | one byte per int               |
//! | [`Vec<i64>`]        |                               | appends                        |
//!
//! [`IntStreamReader`] and [`IntStreamWriter`] go the other way, exposing int endpoints as
//! [`std::io::Read`] and [`std::io::Write`].
//!
//! [`EndOfStream`]: IoError::EndOfStream

use std::collections::VecDeque;
use std::io::{self, BufRead, Read, Write};
use std::sync::mpsc;

use crate::error::IoError;

/// A source of ints for the `IN` instruction
pub trait IntReader {
    /// Produce the next value, blocking until one is available
    ///
    /// # Errors
    ///
    /// Returns an [`IoError`] if no value is available and none ever will be.
    fn read_int(&mut self) -> Result<i64, IoError>;
}

/// A sink of ints for the `OUT` instruction
pub trait IntWriter {
    /// Accept a value, blocking until it's been taken
    ///
    /// # Errors
    ///
    /// Returns an [`IoError`] if the value can't be accepted.
    fn write_int(&mut self, value: i64) -> Result<(), IoError>;
}

impl<T: IntReader + ?Sized> IntReader for &mut T {
    fn read_int(&mut self) -> Result<i64, IoError> {
        (**self).read_int()
    }
}

impl<T: IntReader + ?Sized> IntReader for Box<T> {
    fn read_int(&mut self) -> Result<i64, IoError> {
        (**self).read_int()
    }
}

impl<T: IntWriter + ?Sized> IntWriter for &mut T {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        (**self).write_int(value)
    }
}

impl<T: IntWriter + ?Sized> IntWriter for Box<T> {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        (**self).write_int(value)
    }
}

impl IntWriter for Vec<i64> {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        self.push(value);
        Ok(())
    }
}

/// The most values an [`IntBuffer`] will accept through [`IntWriter::write_int`]
pub const BUFFER_CAPACITY: usize = 4096;

/// A FIFO queue of ints
///
/// Reading from an empty buffer fails with [`IoError::EndOfStream`] rather than blocking, and
/// writing to one holding [`BUFFER_CAPACITY`] values fails with [`IoError::BufferFull`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IntBuffer {
    queue: VecDeque<i64>,
}

impl IntBuffer {
    /// An empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value`, ignoring the capacity limit
    pub fn push(&mut self, value: i64) {
        self.queue.push_back(value);
    }

    /// Take the oldest value
    pub fn pop(&mut self) -> Option<i64> {
        self.queue.pop_front()
    }

    /// Take every value, oldest first
    pub fn drain(&mut self) -> Vec<i64> {
        self.queue.drain(..).collect()
    }

    /// Number of queued values
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl FromIterator<i64> for IntBuffer {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            queue: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<i64>> for IntBuffer {
    fn from(v: Vec<i64>) -> Self {
        Self { queue: v.into() }
    }
}

impl IntReader for IntBuffer {
    fn read_int(&mut self) -> Result<i64, IoError> {
        self.pop().ok_or(IoError::EndOfStream)
    }
}

impl IntWriter for IntBuffer {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        if self.queue.len() >= BUFFER_CAPACITY {
            return Err(IoError::BufferFull);
        }
        self.push(value);
        Ok(())
    }
}

/// An endpoint with nothing to read that discards everything written to it
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NullIo;

impl IntReader for NullIo {
    fn read_int(&mut self) -> Result<i64, IoError> {
        Err(IoError::EndOfStream)
    }
}

impl IntWriter for NullIo {
    fn write_int(&mut self, _: i64) -> Result<(), IoError> {
        Ok(())
    }
}

/// Receiving half of [`channel`]
///
/// Blocks until a value is sent, and fails with [`IoError::EndOfStream`] once every
/// [`ChannelWriter`] is gone and the channel is drained.
#[derive(Debug)]
pub struct ChannelReader(mpsc::Receiver<i64>);

/// Sending half of [`channel`]
///
/// Fails with [`IoError::Disconnected`] once the [`ChannelReader`] is gone.
#[derive(Debug, Clone)]
pub struct ChannelWriter(mpsc::Sender<i64>);

/// Create a connected writer and reader, for piping one interpreter's output into another's
/// input across threads
pub fn channel() -> (ChannelWriter, ChannelReader) {
    let (tx, rx) = mpsc::channel();
    (ChannelWriter(tx), ChannelReader(rx))
}

impl ChannelReader {
    /// Take a value if one is ready, without blocking
    pub fn try_read_int(&mut self) -> Option<i64> {
        self.0.try_recv().ok()
    }
}

impl IntReader for ChannelReader {
    fn read_int(&mut self) -> Result<i64, IoError> {
        self.0.recv().map_err(|_| IoError::EndOfStream)
    }
}

impl IntWriter for ChannelWriter {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        self.0.send(value).map_err(|_| IoError::Disconnected)
    }
}

impl From<mpsc::Receiver<i64>> for ChannelReader {
    fn from(rx: mpsc::Receiver<i64>) -> Self {
        Self(rx)
    }
}

impl From<mpsc::Sender<i64>> for ChannelWriter {
    fn from(tx: mpsc::Sender<i64>) -> Self {
        Self(tx)
    }
}

/// Reads a byte stream one byte per int
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
}

impl<R: BufRead> ByteReader<R> {
    /// Read one int per byte of `inner`
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Discard the reader, returning the underlying stream
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> IntReader for ByteReader<R> {
    fn read_int(&mut self) -> Result<i64, IoError> {
        let byte = loop {
            match self.inner.fill_buf() {
                Ok([]) => return Err(IoError::EndOfStream),
                Ok(&[b, ..]) => break b,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        self.inner.consume(1);
        Ok(i64::from(byte))
    }
}

/// What a [`ByteWriter`] does with a value outside of `0..=255`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Write the value in decimal, followed by a newline
    #[default]
    Decimal,
    /// Fail with [`IoError::ByteOverflow`]
    Strict,
}

/// Writes each int as a single byte
///
/// Flushes after every newline, so line-oriented programs interleave properly with their input.
#[derive(Debug)]
pub struct ByteWriter<W: Write> {
    inner: W,
    policy: OverflowPolicy,
}

impl<W: Write> ByteWriter<W> {
    /// A writer using [`OverflowPolicy::Decimal`]
    pub fn new(inner: W) -> Self {
        Self::with_policy(inner, OverflowPolicy::default())
    }

    /// Write one byte per int to `inner`, handling values outside of `0..=255` per `policy`
    pub fn with_policy(inner: W, policy: OverflowPolicy) -> Self {
        Self { inner, policy }
    }

    /// Discard the writer, returning the underlying stream
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> IntWriter for ByteWriter<W> {
    fn write_int(&mut self, value: i64) -> Result<(), IoError> {
        match (u8::try_from(value), self.policy) {
            (Ok(byte), _) => {
                self.inner.write_all(&[byte])?;
                if byte == b'\n' {
                    self.inner.flush()?;
                }
            }
            (Err(_), OverflowPolicy::Decimal) => {
                writeln!(self.inner, "{value}")?;
                self.inner.flush()?;
            }
            (Err(_), OverflowPolicy::Strict) => return Err(IoError::ByteOverflow(value)),
        }
        Ok(())
    }
}

fn to_io_error(err: IoError) -> io::Error {
    match err {
        IoError::Io(e) => e,
        IoError::EndOfStream => io::ErrorKind::UnexpectedEof.into(),
        IoError::ByteOverflow(_) => io::Error::new(io::ErrorKind::InvalidData, err),
        err => io::Error::other(err),
    }
}

/// Exposes an [`IntReader`] as a [`Read`]er of bytes
///
/// Each int read becomes one byte. [`IoError::EndOfStream`] and [`IoError::Halted`] are treated as
/// the end of the byte stream, and ints outside of `0..=255` fail with [`io::ErrorKind::InvalidData`].
#[derive(Debug)]
pub struct IntStreamReader<R: IntReader>(pub R);

impl<R: IntReader> Read for IntStreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        for (n, slot) in buf.iter_mut().enumerate() {
            match self.0.read_int() {
                Ok(value) => {
                    *slot = u8::try_from(value)
                        .map_err(|_| to_io_error(IoError::ByteOverflow(value)))?;
                }
                Err(IoError::EndOfStream | IoError::Halted) => return Ok(n),
                // hand back what was read, the error will come up again on the next call
                Err(_) if n > 0 => return Ok(n),
                Err(e) => return Err(to_io_error(e)),
            }
        }
        Ok(buf.len())
    }
}

/// Exposes an [`IntWriter`] as a [`Write`]r of bytes, writing one int per byte
#[derive(Debug)]
pub struct IntStreamWriter<W: IntWriter>(pub W);

impl<W: IntWriter> Write for IntStreamWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for (n, &byte) in buf.iter().enumerate() {
            if let Err(e) = self.0.write_int(i64::from(byte)) {
                return if n > 0 { Ok(n) } else { Err(to_io_error(e)) };
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
