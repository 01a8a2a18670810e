//! A length-checked view over the remaining bytes of the input buffer.
//!
//! Every multi-byte read in the decoder goes through a `Cursor`: callers
//! `require` a count of bytes before issuing any `*_at` reads against that
//! range, then `advance` past what they consumed. No read is ever allowed
//! to reach past the end of the original buffer.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{eof, Result};

pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Fails with `Error::Eof` unless at least `n` bytes remain.
    pub fn require(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(eof!(
                "needed {} bytes but only {} remain at offset {}",
                n,
                self.remaining(),
                self.pos
            ));
        }
        Ok(())
    }

    /// Reads a single byte at `pos + offset`. Caller must have called
    /// `require(offset + 1)` or greater first.
    #[inline]
    pub fn u8_at(&self, offset: usize) -> u8 {
        self.buf[self.pos + offset]
    }

    /// Reads a little-endian u16 at `pos + offset`. Caller must have
    /// called `require(offset + 2)` or greater first.
    #[inline]
    pub fn u16_le_at(&self, offset: usize) -> u16 {
        LittleEndian::read_u16(&self.buf[self.pos + offset..])
    }

    /// Returns the `n` bytes starting at `pos + offset` without advancing.
    /// Caller must have called `require(offset + n)` or greater first.
    #[inline]
    pub fn slice_at(&self, offset: usize, n: usize) -> &'a [u8] {
        &self.buf[self.pos + offset..self.pos + offset + n]
    }

    /// Advances the read pointer by `n`. Fails with `Error::Eof` if that
    /// would move past the end of the buffer.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_succeeds_within_bounds() {
        let c = Cursor::new(&[1, 2, 3]);
        assert!(c.require(3).is_ok());
        assert!(c.require(4).is_err());
    }

    #[test]
    fn reads_little_endian() {
        let c = Cursor::new(&[0x34, 0x12]);
        assert_eq!(c.u16_le_at(0), 0x1234);
    }

    #[test]
    fn advance_checks_bounds() {
        let mut c = Cursor::new(&[1, 2, 3]);
        c.advance(2).unwrap();
        assert_eq!(c.remaining(), 1);
        assert!(c.advance(2).is_err());
    }
}
