#![no_main]
use hufflock::container::payload::{self, EntryRef};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whatever parses must re-encode to the same bytes.
    if let Ok(entries) = payload::decode_entries(data) {
        let owned: Vec<_> = entries.iter().map(EntryRef::to_entry).collect();
        assert_eq!(payload::encode_entries(&owned).unwrap(), data);
    }
    let _ = payload::list_entries(data);
});
