// Huffman encoding: bytes -> packed bitstream.

use crate::error::CodecError;

use super::bitio::BitWriter;
use super::code_table::CodeTable;
use super::frequency::FrequencyTable;
use super::tree::HuffmanTree;

/// Encode `data` with `table`, zero-padding the final byte.
///
/// Fails with [`CodecError::MissingCode`] if `data` holds a byte the table
/// was not built for.
pub fn encode(data: &[u8], table: &CodeTable) -> Result<Vec<u8>, CodecError> {
    encode_into(data, table, BitWriter::new())
}

fn encode_into(data: &[u8], table: &CodeTable, mut writer: BitWriter) -> Result<Vec<u8>, CodecError> {
    for &b in data {
        let code = table.get(b).ok_or(CodecError::MissingCode(b))?;
        writer.write_code(code);
    }
    Ok(writer.finish())
}

/// Count, build the code and encode in one go.
///
/// Returns the frequency table (needed to decode) and the packed stream.
/// Empty input yields an all-zero table and an empty stream.
pub fn compress(data: &[u8]) -> Result<(FrequencyTable, Vec<u8>), CodecError> {
    let freq = FrequencyTable::from_bytes(data);
    let Some(tree) = HuffmanTree::build(&freq) else {
        return Ok((freq, Vec::new()));
    };
    let table = CodeTable::from_tree(&tree)?;

    let packed_len = table.encoded_bits(&freq).div_ceil(8);
    log::trace!(
        "huffman: {} symbols, max code {} bits, {} -> {} bytes",
        table.len(),
        table.max_len(),
        data.len(),
        packed_len
    );

    let writer = BitWriter::with_capacity(usize::try_from(packed_len).unwrap_or(0));
    let packed = encode_into(data, &table, writer)?;
    debug_assert_eq!(packed.len() as u128, packed_len);
    Ok((freq, packed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let (freq, packed) = compress(b"").unwrap();
        assert!(freq.is_empty());
        assert!(packed.is_empty());
    }

    #[test]
    fn single_symbol_is_one_bit_each() {
        let (freq, packed) = compress(&[b'x'; 20]).unwrap();
        assert_eq!(freq.get(b'x'), 20);
        assert_eq!(packed, vec![0, 0, 0]);
    }

    #[test]
    fn known_bit_pattern() {
        // a=1, b=01, c=00 (see code_table tests); "aaaabbc" -> 1111 0101 00
        let (_, packed) = compress(b"aaaabbc").unwrap();
        assert_eq!(packed, vec![0b1111_0101, 0b0000_0000]);
    }

    #[test]
    fn missing_code_is_reported() {
        let freq = FrequencyTable::from_bytes(b"ab");
        let table = CodeTable::from_tree(&HuffmanTree::build(&freq).unwrap()).unwrap();
        assert_eq!(encode(b"abc", &table), Err(CodecError::MissingCode(b'c')));
    }

    #[test]
    fn output_length_is_ceil_of_bits() {
        let data: Vec<u8> = (0..=255u8).collect();
        let (_, packed) = compress(&data).unwrap();
        // 256 equiprobable symbols -> 8 bits each.
        assert_eq!(packed, data);
    }
}
