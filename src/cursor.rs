//! A read cursor over an in-memory GIF byte buffer.
//!
//! `spec.md` §9 ("Raw-byte layout parsing") rules out overlaying structures
//! on borrowed bytes; every multi-byte field is read through this cursor
//! instead, which owns endianness via `byteorder` rather than relying on
//! host-endian casts. That makes every read here platform-independent: a
//! big-endian host produces byte-for-byte identical results to a
//! little-endian one, which is what `spec.md` §3 requires ("on big-endian
//! hosts it byte-swaps on read").

use byteorder::{ByteOrder, LittleEndian};

use crate::error::DecodeError;

/// A forward-only cursor over a borrowed byte slice.
///
/// Distinct from a `std::io::Cursor` in that every read reports how many
/// bytes are left rather than erroring lazily on exhaustion, mirroring the
/// "remaining bytes counter" the chunk skipper and frame-header parser
/// carry alongside their cursor in `spec.md` §4.1 and §4.2.
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes from the current position to the end of the buffer, without
    /// consuming them. Used by the metadata sink to hand back a raw pointer
    /// into the application-extension payload.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated);
        }
        self.pos += n;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        if self.remaining() < 1 {
            return Err(DecodeError::Truncated);
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        if self.remaining() < 2 {
            return Err(DecodeError::Truncated);
        }
        let v = LittleEndian::read_u16(&self.data[self.pos..self.pos + 2]);
        self.pos += 2;
        Ok(v)
    }

    /// Borrows the next `n` bytes and advances past them.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated);
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let s = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(s);
        Ok(out)
    }

    /// Slices the underlying buffer by absolute offsets, independent of the
    /// cursor's current position. Used to hand a bounded raw view (e.g. an
    /// application-extension payload) to a sink after scanning past it.
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.data[start..end]
    }

    pub fn peek_u8(&self) -> Result<u8, DecodeError> {
        if self.remaining() < 1 {
            return Err(DecodeError::Truncated);
        }
        Ok(self.data[self.pos])
    }
}
