#![no_main]
use hufflock::huffman;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (freq, packed) = huffman::compress(data).unwrap();
    assert_eq!(freq.total().unwrap(), data.len() as u64);
    let decoded = huffman::decompress(&packed, &freq).unwrap();
    assert_eq!(decoded, data);
});
