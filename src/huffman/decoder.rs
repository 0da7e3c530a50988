// Huffman decoding: packed bitstream -> bytes.
//
// Decoding is bounded by the symbol count recorded in the frequency table.
// The zero padding in the last byte can trace a valid path to a leaf (any
// tree whose all-zero path ends in a leaf), so stopping on end-of-stream
// would append spurious symbols.

use crate::error::CodecError;

use super::bitio::BitReader;
use super::frequency::FrequencyTable;
use super::tree::{HuffmanTree, Node};

/// Decode exactly `count` symbols from `packed` using `tree`.
///
/// The stream must be consumed exactly: running out of bits early is
/// [`CodecError::Truncated`], and whole unused bytes after the last symbol
/// are [`CodecError::TrailingData`].
pub fn decode(packed: &[u8], tree: &HuffmanTree, count: u64) -> Result<Vec<u8>, CodecError> {
    let available_bits = packed.len() as u64 * 8;

    // One-leaf tree: every code is a single 0 bit, no walk needed.
    if let Some(symbol) = tree.single_symbol() {
        if count > available_bits {
            return Err(CodecError::Truncated {
                decoded: available_bits,
                expected: count,
            });
        }
        check_consumed(packed, count.div_ceil(8) as usize)?;
        return Ok(vec![symbol; count as usize]);
    }

    let mut out = Vec::with_capacity(count.min(available_bits) as usize);
    let mut reader = BitReader::new(packed);
    let root = tree.root();

    while (out.len() as u64) < count {
        let mut id = root;
        loop {
            match *tree.node(id) {
                Node::Leaf { symbol, .. } => {
                    out.push(symbol);
                    break;
                }
                Node::Internal { children, .. } => {
                    let bit_offset = reader.position();
                    let bit = reader.read_bit().ok_or(CodecError::Truncated {
                        decoded: out.len() as u64,
                        expected: count,
                    })?;
                    id = children[bit as usize].ok_or(CodecError::DeadEnd { bit_offset })?;
                }
            }
        }
    }

    check_consumed(packed, reader.bytes_consumed())?;
    Ok(out)
}

fn check_consumed(packed: &[u8], consumed: usize) -> Result<(), CodecError> {
    match packed.len().checked_sub(consumed) {
        Some(0) | None => Ok(()),
        Some(extra) => Err(CodecError::TrailingData { extra }),
    }
}

/// Rebuild the tree from `freq` and decode the stream it describes.
pub fn decompress(packed: &[u8], freq: &FrequencyTable) -> Result<Vec<u8>, CodecError> {
    let count = freq.total()?;
    match HuffmanTree::build(freq) {
        Some(tree) => decode(packed, &tree, count),
        None if packed.is_empty() => Ok(Vec::new()),
        None => Err(CodecError::TrailingData {
            extra: packed.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::encoder::compress;

    fn roundtrip(data: &[u8]) {
        let (freq, packed) = compress(data).unwrap();
        assert_eq!(decompress(&packed, &freq).unwrap(), data);
    }

    #[test]
    fn roundtrips() {
        roundtrip(b"");
        roundtrip(b"a");
        roundtrip(&[0u8; 1000]);
        roundtrip(b"abracadabra");
        roundtrip(&(0..=255u8).collect::<Vec<_>>());
        roundtrip(&(0..=255u8).cycle().take(5000).collect::<Vec<_>>());
    }

    #[test]
    fn padding_does_not_produce_extra_symbols() {
        // a=0, b=1. "ba" packs to 10|000000: the six padding zeros each
        // spell another 'a' if decoding ran until the stream was empty.
        let (freq, packed) = compress(b"ba").unwrap();
        assert_eq!(packed, vec![0b1000_0000]);
        assert_eq!(decompress(&packed, &freq).unwrap(), b"ba");
    }

    #[test]
    fn single_symbol_bypasses_walk() {
        let freq = FrequencyTable::from_bytes(&[7u8; 9]);
        // Contents are irrelevant for the one-leaf tree, only the length.
        let out = decompress(&[0xFF, 0xFF], &freq).unwrap();
        assert_eq!(out, vec![7u8; 9]);
    }

    #[test]
    fn truncated_stream() {
        let (freq, packed) = compress(b"hello, world").unwrap();
        let err = decompress(&packed[..packed.len() - 1], &freq).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { expected: 12, .. }), "{err:?}");
    }

    #[test]
    fn truncated_single_symbol_stream() {
        let freq = FrequencyTable::from_bytes(&[1u8; 17]);
        assert_eq!(
            decompress(&[0, 0], &freq),
            Err(CodecError::Truncated {
                decoded: 16,
                expected: 17
            })
        );
    }

    #[test]
    fn trailing_bytes_rejected() {
        let (freq, mut packed) = compress(b"hello").unwrap();
        packed.push(0);
        assert_eq!(
            decompress(&packed, &freq),
            Err(CodecError::TrailingData { extra: 1 })
        );
        assert_eq!(
            decompress(&[1, 2], &FrequencyTable::new()),
            Err(CodecError::TrailingData { extra: 2 })
        );
    }

    #[test]
    fn dead_end_is_an_error() {
        // Root's 1-child is missing.
        let tree = HuffmanTree::from_parts(
            vec![
                Node::Leaf { symbol: 3, weight: 1 },
                Node::Leaf { symbol: 4, weight: 1 },
                Node::Internal {
                    weight: 1,
                    children: [Some(0), None],
                },
                Node::Internal {
                    weight: 2,
                    children: [Some(2), Some(1)],
                },
            ],
            3,
        );
        // 0 -> node 2, then 1 -> missing.
        assert_eq!(
            decode(&[0b0100_0000], &tree, 1),
            Err(CodecError::DeadEnd { bit_offset: 1 })
        );
    }
}
