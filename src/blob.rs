//! Little-endian binary blobs used by scene save/load.
//!
//! [`OutputBlob`] appends primitive values to a growable byte buffer and
//! [`InputBlob`] reads them back in the same order. Strings are stored as an
//! `i32` byte length followed by the UTF-8 bytes, with no terminator.
//!
//! The layout carries no version tag; readers and writers must agree on the
//! field order of every scene.

use std::io::{Cursor, Read};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::warn;
use thiserror::Error;

/// Longest string accepted by [`InputBlob::read_string`], in bytes.
pub const MAX_STRING_LEN: usize = 4096;

/// Errors raised while decoding a blob.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The stream ended early or could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A count or string length was negative.
    #[error("Negative length in blob: {0}")]
    NegativeLength(i32),

    /// A string length exceeded [`MAX_STRING_LEN`].
    #[error("String too long: {0} bytes (max {MAX_STRING_LEN})")]
    StringTooLong(usize),

    /// String bytes were not valid UTF-8.
    #[error("Invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Append-only writer for scene snapshots.
#[derive(Debug, Default, Clone)]
pub struct OutputBlob {
    data: Vec<u8>,
}

impl OutputBlob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.data.extend_from_slice(&buf);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.data.extend_from_slice(&buf);
    }

    pub fn write_f32(&mut self, value: f32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, value);
        self.data.extend_from_slice(&buf);
    }

    /// Booleans take one byte.
    pub fn write_bool(&mut self, value: bool) {
        self.data.push(u8::from(value));
    }

    /// Write a length-prefixed UTF-8 string.
    ///
    /// Strings longer than [`MAX_STRING_LEN`] bytes are cut at the last
    /// character boundary that fits, so the reader always accepts them.
    pub fn write_string(&mut self, value: &str) {
        let mut end = value.len().min(MAX_STRING_LEN);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        if end < value.len() {
            warn!("String of {} bytes truncated to {}", value.len(), end);
        }
        self.write_i32(end as i32);
        self.data.extend_from_slice(&value.as_bytes()[..end]);
    }
}

/// Sequential reader over a snapshot produced by [`OutputBlob`].
#[derive(Debug)]
pub struct InputBlob<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> InputBlob<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    pub fn read_i32(&mut self) -> Result<i32, BlobError> {
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32, BlobError> {
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32, BlobError> {
        Ok(self.cursor.read_f32::<LittleEndian>()?)
    }

    /// Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> Result<bool, BlobError> {
        Ok(self.cursor.read_u8()? != 0)
    }

    /// Capacity to reserve for `count` entries. Every entry takes at least
    /// one byte, so a corrupt count cannot reserve more than the input holds.
    pub fn capacity_for(&self, count: usize) -> usize {
        count.min(self.remaining())
    }

    /// Read a non-negative `i32` count.
    pub fn read_count(&mut self) -> Result<usize, BlobError> {
        let count = self.read_i32()?;
        if count < 0 {
            return Err(BlobError::NegativeLength(count));
        }
        Ok(count as usize)
    }

    pub fn read_string(&mut self) -> Result<String, BlobError> {
        let len = self.read_count()?;
        if len > MAX_STRING_LEN {
            return Err(BlobError::StringTooLong(len));
        }
        let mut bytes = vec![0u8; len];
        self.cursor.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }
}
