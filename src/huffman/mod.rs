// Static order-0 Huffman codec.
//
// - `frequency`  — FrequencyTable: 256 byte counts, the only stored model
// - `tree`       — HuffmanTree: min-heap construction over nonzero symbols
// - `code_table` — CodeTable: prefix-free codes read off the tree
// - `bitio`      — MSB-first BitWriter / BitReader
// - `encoder`    — bytes -> packed bits
// - `decoder`    — packed bits -> bytes, bounded by the frequency total

pub mod bitio;
pub mod code_table;
pub mod decoder;
pub mod encoder;
pub mod frequency;
pub mod tree;

pub use code_table::{Code, CodeTable};
pub use decoder::{decode, decompress};
pub use encoder::{compress, encode};
pub use frequency::FrequencyTable;
pub use tree::{HuffmanTree, Node, NodeId};
