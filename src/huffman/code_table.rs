// Code assignment: one prefix-free bit string per symbol, read off the tree.

use std::fmt;

use crate::error::CodecError;

use super::frequency::{FrequencyTable, SYMBOLS};
use super::tree::{HuffmanTree, Node};

/// A Huffman code: the low `len` bits of `bits`, most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Code {
    bits: u128,
    len: u8,
}

impl Code {
    /// Widest code representable. A tree whose total weight fits in a u64
    /// never gets deeper than ~92 levels, so this is never hit in practice.
    pub const MAX_LEN: u8 = 128;

    pub fn new(bits: u128, len: u8) -> Self {
        debug_assert!(len <= Self::MAX_LEN);
        let mask = if len >= 128 { u128::MAX } else { (1u128 << len) - 1 };
        Self {
            bits: bits & mask,
            len,
        }
    }

    pub fn bits(&self) -> u128 {
        self.bits
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit `i`, counting from the first (most significant) bit.
    pub fn bit(&self, i: u8) -> u8 {
        debug_assert!(i < self.len);
        ((self.bits >> (self.len - 1 - i)) & 1) as u8
    }

    /// Whether `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len
            && other
                .bits
                .checked_shr(u32::from(other.len - self.len))
                .unwrap_or(0)
                == self.bits
    }

    fn child(self, bit: u8) -> Option<Code> {
        if self.len >= Self::MAX_LEN {
            return None;
        }
        Some(Code {
            bits: (self.bits << 1) | bit as u128,
            len: self.len + 1,
        })
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.bit(i) == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Symbol → code mapping derived from a [`HuffmanTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<Code>; SYMBOLS],
}

impl CodeTable {
    /// Walk `tree` assigning 0 to left edges and 1 to right edges.
    pub fn from_tree(tree: &HuffmanTree) -> Result<Self, CodecError> {
        let mut codes = [None; SYMBOLS];

        // The generic walk would give a lone symbol the empty code.
        if let Some(symbol) = tree.single_symbol() {
            codes[symbol as usize] = Some(Code::new(0, 1));
            return Ok(Self { codes });
        }

        let mut stack = vec![(tree.root(), Code::default())];
        while let Some((id, code)) = stack.pop() {
            match *tree.node(id) {
                Node::Leaf { symbol, .. } => codes[symbol as usize] = Some(code),
                Node::Internal {
                    children: [None, None],
                    ..
                } => return Err(CodecError::MalformedTree("internal node without children")),
                Node::Internal { children, .. } => {
                    for (bit, child) in children.into_iter().enumerate() {
                        if let Some(child) = child {
                            let code = code
                                .child(bit as u8)
                                .ok_or(CodecError::MalformedTree("code exceeds 128 bits"))?;
                            stack.push((child, code));
                        }
                    }
                }
            }
        }

        Ok(Self { codes })
    }

    pub fn get(&self, symbol: u8) -> Option<Code> {
        self.codes[symbol as usize]
    }

    /// Assigned codes in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(s, c)| c.map(|c| (s as u8, c)))
    }

    /// Number of symbols that have a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_len(&self) -> u8 {
        self.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Exact packed size in bits of a payload with these frequencies.
    /// Symbols without a code contribute nothing.
    pub fn encoded_bits(&self, freq: &FrequencyTable) -> u128 {
        self.iter()
            .map(|(s, c)| freq.get(s) as u128 * c.len() as u128)
            .sum()
    }
}
