// Byte-frequency table: the only model state the Huffman code needs.
//
// The table is stored verbatim in the container header, so the decoder
// rebuilds exactly the tree the encoder used without the tree ever being
// serialized.

use crate::error::CodecError;

/// Number of distinct symbols (one per byte value).
pub const SYMBOLS: usize = 256;

/// Serialized size: 256 little-endian u64 counts.
pub const ENCODED_LEN: usize = SYMBOLS * 8;

/// Occurrence count per byte value.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; SYMBOLS],
}

impl FrequencyTable {
    /// An all-zero table (describes the empty payload).
    pub fn new() -> Self {
        Self {
            counts: [0; SYMBOLS],
        }
    }

    /// Count every byte of `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut counts = [0u64; SYMBOLS];
        for &b in data {
            counts[b as usize] += 1;
        }
        Self { counts }
    }

    /// Wrap raw counts, e.g. ones read back from a container.
    pub fn from_counts(counts: [u64; SYMBOLS]) -> Self {
        Self { counts }
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    pub fn counts(&self) -> &[u64; SYMBOLS] {
        &self.counts
    }

    /// Sum of all counts, i.e. the plaintext length this table describes.
    pub fn total(&self) -> Result<u64, CodecError> {
        self.counts
            .iter()
            .try_fold(0u64, |acc, &c| acc.checked_add(c))
            .ok_or(CodecError::FrequencyOverflow)
    }

    /// Symbols with a nonzero count, ascending.
    pub fn symbols(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
    }

    pub fn distinct_symbols(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Serialize as 256 little-endian u64 values.
    pub fn to_le_bytes(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        for (chunk, count) in out.chunks_exact_mut(8).zip(self.counts.iter()) {
            chunk.copy_from_slice(&count.to_le_bytes());
        }
        out
    }

    /// Inverse of [`to_le_bytes`](Self::to_le_bytes).
    pub fn from_le_bytes(bytes: &[u8; ENCODED_LEN]) -> Self {
        let mut counts = [0u64; SYMBOLS];
        for (count, chunk) in counts.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *count = u64::from_le_bytes(word);
        }
        Self { counts }
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only the populated entries; 256 zeros are noise.
        f.debug_map().entries(self.symbols()).finish()
    }
}
