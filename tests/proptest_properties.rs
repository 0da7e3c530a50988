use hufflock::ArchiveError;
use hufflock::archive;
use hufflock::container::envelope::{self, NONCE_LEN};
use hufflock::container::{ArchiveKey, Envelope, HEADER_LEN, PayloadEntry};
use hufflock::huffman::{self, CodeTable, FrequencyTable, HuffmanTree};
use proptest::prelude::*;

fn entry_strategy() -> impl Strategy<Value = PayloadEntry> {
    (
        "[a-z]{1,8}(/[a-z0-9_.]{1,8}){0,3}",
        proptest::collection::vec(any::<u8>(), 0..512),
    )
        .prop_map(|(name, content)| PayloadEntry::new(name, content))
}

proptest! {
    #[test]
    fn prop_huffman_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let (freq, packed) = huffman::compress(&data).unwrap();
        prop_assert_eq!(freq.total().unwrap(), data.len() as u64);
        prop_assert_eq!(huffman::decompress(&packed, &freq).unwrap(), data);
    }

    #[test]
    fn prop_skewed_alphabet_roundtrip(
        data in proptest::collection::vec(prop_oneof![9 => Just(b'a'), 1 => any::<u8>()], 1..4096)
    ) {
        let (freq, packed) = huffman::compress(&data).unwrap();
        prop_assert_eq!(huffman::decompress(&packed, &freq).unwrap(), data);
    }

    #[test]
    fn prop_codes_are_prefix_free_and_complete(
        data in proptest::collection::vec(any::<u8>(), 2..2048)
    ) {
        let freq = FrequencyTable::from_bytes(&data);
        let tree = HuffmanTree::build(&freq).unwrap();
        let table = CodeTable::from_tree(&tree).unwrap();
        let codes: Vec<_> = table.iter().map(|(_, c)| c).collect();
        prop_assert_eq!(codes.len(), freq.distinct_symbols());

        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    prop_assert!(!a.is_prefix_of(b), "{} prefixes {}", a, b);
                }
            }
        }

        if codes.len() >= 2 {
            // Kraft sum of a full binary tree is exactly 1.
            let max = table.max_len() as u32;
            let sum: u128 = codes.iter().map(|c| 1u128 << (max - c.len() as u32)).sum();
            prop_assert_eq!(sum, 1u128 << max);
        }
    }

    #[test]
    fn prop_single_symbol_is_one_bit_each(byte in any::<u8>(), count in 1usize..5000) {
        let data = vec![byte; count];
        let (_, packed) = huffman::compress(&data).unwrap();
        prop_assert_eq!(packed.len(), count.div_ceil(8));
        prop_assert_eq!(huffman::decompress(&packed, &FrequencyTable::from_bytes(&data)).unwrap(), data);
    }

    #[test]
    fn prop_seal_open_roundtrip(
        plaintext in proptest::collection::vec(any::<u8>(), 0..1024),
        aad in proptest::collection::vec(any::<u8>(), 0..64),
        key in any::<[u8; 32]>(),
        nonce in any::<[u8; NONCE_LEN]>(),
    ) {
        let key = ArchiveKey::from_bytes(key);
        let sealed = envelope::seal(&key, &nonce, &aad, &plaintext).unwrap();
        prop_assert_eq!(envelope::open(&key, &nonce, &aad, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn prop_any_bit_flip_fails_authentication(
        entries in proptest::collection::vec(entry_strategy(), 0..4),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let sealed = archive::create(&entries, "pw").unwrap();
        let mut bytes = sealed.to_bytes();

        // Skip magic, version and length: those fail parsing instead.
        let nonce_and_table = 5..HEADER_LEN - 8;
        let ciphertext = HEADER_LEN..bytes.len();
        let candidates: Vec<usize> = nonce_and_table.chain(ciphertext).collect();
        let at = candidates[position.index(candidates.len())];
        bytes[at] ^= 1 << bit;

        let tampered = Envelope::from_bytes(&bytes).unwrap();
        prop_assert!(matches!(
            archive::list(&tampered, "pw"),
            Err(ArchiveError::AuthenticationFailure)
        ));
    }

    #[test]
    fn prop_archive_roundtrip(
        entries in proptest::collection::vec(entry_strategy(), 0..6),
        password in ".{0,16}",
    ) {
        let sealed = archive::create(&entries, &password).unwrap();
        let reopened = Envelope::from_bytes(&sealed.to_bytes()).unwrap();
        let mut restored: Vec<PayloadEntry> = Vec::new();
        prop_assert_eq!(archive::extract(&reopened, &password, &mut restored).unwrap(), entries.len());
        prop_assert_eq!(restored, entries);
    }

    #[test]
    fn prop_wrong_password_fails(
        entries in proptest::collection::vec(entry_strategy(), 1..3),
        password in "[a-z]{1,12}",
    ) {
        let sealed = archive::create(&entries, &password).unwrap();
        let wrong = format!("{password}!");
        let mut restored: Vec<PayloadEntry> = Vec::new();
        prop_assert!(matches!(
            archive::extract(&sealed, &wrong, &mut restored),
            Err(ArchiveError::AuthenticationFailure)
        ));
        prop_assert!(restored.is_empty());
    }
}

#[test]
fn decode_ignores_padding_that_looks_like_a_symbol() {
    // "ab": a=0, b=1. Packed 0b0100_0000; the six zero padding bits would
    // decode as six more 'a's if decoding were not bounded by the count.
    let (freq, packed) = huffman::compress(b"ab").unwrap();
    assert_eq!(packed, vec![0x40]);
    assert_eq!(huffman::decompress(&packed, &freq).unwrap(), b"ab");
}
