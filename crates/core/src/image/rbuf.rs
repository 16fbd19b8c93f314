//! Big-endian cursor over an in-memory byte buffer.
//!
//! Reading past the end is a bug in the caller and panics; parsers of
//! untrusted input check [`ReadBuffer::remaining`] first.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

#[derive(Debug, Clone)]
pub struct ReadBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReadBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn u8(&mut self) -> u8 {
        assert!(self.pos < self.data.len(), "read past end of buffer");
        let v = self.data[self.pos];
        self.pos += 1;
        v
    }

    pub fn u16(&mut self) -> u16 {
        BigEndian::read_u16(self.next(2))
    }

    pub fn u16_le(&mut self) -> u16 {
        LittleEndian::read_u16(self.next(2))
    }

    pub fn u32(&mut self) -> u32 {
        BigEndian::read_u32(self.next(4))
    }

    pub fn i32(&mut self) -> i32 {
        self.u32() as i32
    }

    /// Return the next `n` bytes and advance past them.
    pub fn next(&mut self, n: usize) -> &'a [u8] {
        assert!(n <= self.remaining(), "read past end of buffer");
        let start = self.pos;
        self.pos += n;
        &self.data[start..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let mut rb = ReadBuffer::new(&[0, 0, 1, 2, 0xff, 0xfe, 7]);
        assert_eq!(rb.u32(), 258);
        assert_eq!(rb.u16(), 0xfffe);
        assert_eq!(rb.remaining(), 1);
        assert_eq!(rb.u8(), 7);
        assert_eq!(rb.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "read past end of buffer")]
    fn overrun_panics() {
        let mut rb = ReadBuffer::new(&[1, 2, 3]);
        rb.u32();
    }
}
