//! Byte queues and the typed primitives commands are built from
//!
//! Integers are big-endian. Fixed-point quantities travel as a signed 32-bit
//! integer holding the value times 100. Strings are a u16 length followed by
//! UTF-8 bytes.

use crate::LinkError;
use bytes::{Buf, BufMut, BytesMut};

/// Longest string kept by a decode; longer strings are consumed in full but
/// cut down to this many bytes.
pub const MAX_STRING_LEN: usize = 1024;

/// Scale applied to fixed-point values on the wire
const FIXED_SCALE: f64 = 100.0;

/// Ordered byte buffer with independent read and write ends.
///
/// Encoding appends at the write end; decoding consumes from the read end.
/// A decode that would run past the buffered bytes fails with
/// [`LinkError::Truncated`] and leaves the queue untouched.
#[derive(Debug, Default, Clone)]
pub struct ByteQueue {
    buf: BytesMut,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue pre-filled with `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(bytes),
        }
    }

    /// Bytes waiting to be read
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Unread bytes, without consuming them
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes at the write end
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drop `n` unread bytes (or everything, if fewer are buffered)
    pub fn skip(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }

    /// Discard everything
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Hand out every unread byte, leaving the queue empty
    pub fn take_all(&mut self) -> BytesMut {
        self.buf.split()
    }

    /// Move every unread byte into `out`, returning how many moved
    pub fn drain_to<B: BufMut>(&mut self, out: &mut B) -> usize {
        let n = self.buf.len();
        out.put(self.buf.split());
        n
    }

    /// Move the unread bytes to the front of a fresh allocation so space
    /// freed by earlier reads is returned
    pub fn compact(&mut self) {
        if self.buf.capacity() > self.buf.len() * 2 {
            let unread = self.buf.split();
            self.buf = BytesMut::with_capacity(unread.len());
            self.buf.extend_from_slice(&unread);
        }
    }

    pub(crate) fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Byte at `offset` from the read end
    pub fn peek_u8_at(&self, offset: usize) -> Option<u8> {
        self.buf.get(offset).copied()
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.peek_u8_at(0)
    }

    /// Big-endian u16 at `offset` from the read end
    pub fn peek_u16_at(&self, offset: usize) -> Option<u16> {
        let bytes = self.buf.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn require(&self, needed: usize) -> Result<(), LinkError> {
        if self.buf.len() < needed {
            return Err(LinkError::Truncated {
                needed,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    /// Encode `value` with two decimal digits of precision.
    ///
    /// Values outside the 32-bit range saturate.
    pub fn put_fixed(&mut self, value: f64) {
        let scaled = (value * FIXED_SCALE).round();
        let clamped = if scaled.is_nan() {
            0
        } else {
            scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32
        };
        self.buf.put_i32(clamped);
    }

    /// Encode a length-prefixed string, cut to [`MAX_STRING_LEN`] bytes on a
    /// character boundary.
    pub fn put_str(&mut self, value: &str) {
        let value = truncate_str(value, MAX_STRING_LEN);
        self.buf.put_u16(value.len() as u16);
        self.buf.put_slice(value.as_bytes());
    }

    pub fn get_u8(&mut self) -> Result<u8, LinkError> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u16(&mut self) -> Result<u16, LinkError> {
        self.require(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn get_u32(&mut self) -> Result<u32, LinkError> {
        self.require(4)?;
        Ok(self.buf.get_u32())
    }

    pub fn get_u64(&mut self) -> Result<u64, LinkError> {
        self.require(8)?;
        Ok(self.buf.get_u64())
    }

    pub fn get_fixed(&mut self) -> Result<f64, LinkError> {
        self.require(4)?;
        Ok(f64::from(self.buf.get_i32()) / FIXED_SCALE)
    }

    /// Decode a length-prefixed string.
    ///
    /// The whole encoded string is consumed; at most [`MAX_STRING_LEN`] bytes
    /// are kept. Invalid UTF-8 is replaced rather than rejected.
    pub fn get_str(&mut self) -> Result<String, LinkError> {
        let len = match self.peek_u16_at(0) {
            Some(len) => len as usize,
            None => {
                return Err(LinkError::Truncated {
                    needed: 2,
                    available: self.buf.len(),
                })
            }
        };
        self.require(2 + len)?;
        self.buf.advance(2);

        let raw = self.buf.split_to(len);
        let text = String::from_utf8_lossy(&raw);
        Ok(truncate_str(&text, MAX_STRING_LEN).to_string())
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char
fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
