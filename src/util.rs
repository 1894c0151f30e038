use std::ops::Range;

use bytes::Buf;

use crate::error::{Result, TagError};

/// Largest value a four byte synchsafe integer can hold.
pub const SYNCHSAFE_MAX: u32 = (1 << 28) - 1;

/// Sequential reader over a borrowed byte image. Every read is bounds
/// checked and reports what it was trying to read on failure.
#[derive(Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn read_bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(TagError::Truncated {
                what,
                offset: self.pos,
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_bytes(N, what)?);
        Ok(array)
    }

    pub fn read_byte(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.read_bytes(1, what)?[0])
    }

    /// Plain big-endian `u32`, as used by ID3v2.3 frame sizes.
    pub fn read_u32_be(&mut self, what: &'static str) -> Result<u32> {
        let mut bytes = self.read_bytes(4, what)?;
        Ok(bytes.get_u32())
    }

    pub fn skip(&mut self, len: usize, what: &'static str) -> Result<()> {
        self.read_bytes(len, what).map(|_| ())
    }
}

/// True when `data` holds `pattern` starting at `offset`. Out of range
/// comparisons are simply a mismatch.
pub fn bytes_match_at(data: &[u8], offset: usize, pattern: &[u8]) -> bool {
    data.get(offset..)
        .is_some_and(|rest| rest.starts_with(pattern))
}

/// Append `src[range]` to `dest`, failing instead of panicking when the
/// range runs past the end of `src`.
pub fn copy_range(
    src: &[u8],
    range: Range<usize>,
    dest: &mut Vec<u8>,
    what: &'static str,
) -> Result<()> {
    let offset = range.start;
    let bytes = src
        .get(range)
        .ok_or(TagError::Truncated { what, offset })?;
    dest.extend_from_slice(bytes);
    Ok(())
}

/// Decode four 7-bit groups, most significant first.
pub fn decode_synchsafe(bytes: [u8; 4]) -> u32 {
    bytes
        .iter()
        .fold(0, |acc, &b| (acc << 7) | (b & 0x7f) as u32)
}

pub fn encode_synchsafe(value: u32) -> Option<[u8; 4]> {
    if value > SYNCHSAFE_MAX {
        return None;
    }
    Some([
        ((value >> 21) & 0x7f) as u8,
        ((value >> 14) & 0x7f) as u8,
        ((value >> 7) & 0x7f) as u8,
        (value & 0x7f) as u8,
    ])
}
