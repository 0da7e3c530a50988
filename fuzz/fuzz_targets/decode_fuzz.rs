#![no_main]
use hufflock::container::Envelope;
use hufflock::huffman::{self, FrequencyTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Container parsing and opening must only ever return errors.
    if let Ok(envelope) = Envelope::from_bytes(data) {
        let _ = hufflock::archive::list(&envelope, "fuzz");
    }

    // Feed the Huffman decoder arbitrary bits under an arbitrary model:
    // the first byte picks how many symbols get nonzero counts.
    if data.len() < 2 {
        return;
    }
    let distinct = (data[0] as usize % 16) + 1;
    let mut counts = [0u64; 256];
    for (i, &b) in data[1..].iter().take(distinct).enumerate() {
        counts[b as usize] += (i as u64 % 7) + 1;
    }
    let freq = FrequencyTable::from_counts(counts);
    let _ = huffman::decompress(&data[1..], &freq);
});
