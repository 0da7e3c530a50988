// MSB-first bit packing.
//
// The writer pads the final partial byte with zero bits. The reader has no
// notion of where the payload ends inside that last byte; callers must bound
// decoding by symbol count, not by running out of bits.

use super::code_table::Code;

/// Largest chunk pushed into the accumulator at once. Keeps `acc` below
/// 2^63 since at most 7 bits are carried between writes.
const MAX_CHUNK: u32 = 56;

#[inline]
fn low_mask(count: u32) -> u64 {
    if count >= 64 { u64::MAX } else { (1u64 << count) - 1 }
}

/// Packs bits into bytes, most significant bit first.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Pending bits, right-aligned; only the low `pending` bits are live.
    acc: u64,
    pending: u32,
    bits_written: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer whose buffer already holds `bytes` bytes of capacity.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Append the low `count` bits of `value`, highest of them first.
    pub fn write_bits(&mut self, value: u64, count: u32) {
        debug_assert!(count <= MAX_CHUNK);
        self.acc = (self.acc << count) | (value & low_mask(count));
        self.pending += count;
        self.bits_written += u64::from(count);
        while self.pending >= 8 {
            self.pending -= 8;
            self.bytes.push((self.acc >> self.pending) as u8);
        }
        self.acc &= low_mask(self.pending);
    }

    /// Append a whole Huffman code.
    pub fn write_code(&mut self, code: Code) {
        let mut remaining = u32::from(code.len());
        while remaining > 0 {
            let take = remaining.min(MAX_CHUNK);
            remaining -= take;
            let chunk = (code.bits() >> remaining) as u64;
            self.write_bits(chunk, take);
        }
    }

    /// Total bits written so far (excluding padding).
    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Flush the partial byte (zero-padded) and return the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending > 0 {
            self.bytes.push((self.acc << (8 - self.pending)) as u8);
        }
        self.bytes
    }
}

/// Reads bits MSB-first from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit offset of the next bit.
    pos: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Next bit, or `None` once every byte (padding included) is consumed.
    #[inline]
    pub fn read_bit(&mut self) -> Option<u8> {
        let byte = *self.data.get((self.pos / 8) as usize)?;
        let bit = (byte >> (7 - (self.pos % 8))) & 1;
        self.pos += 1;
        Some(bit)
    }

    /// Bit offset of the next bit to be read.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bytes touched so far, counting a partially read byte as consumed.
    pub fn bytes_consumed(&self) -> usize {
        self.pos.div_ceil(8) as usize
    }

    pub fn remaining_bits(&self) -> u64 {
        (self.data.len() as u64 * 8).saturating_sub(self.pos)
    }
}
