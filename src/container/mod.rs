// Archive container: plaintext framing, key derivation and the sealed
// on-disk envelope.
//
// - `payload`  — ordered (name, size, content) records in one buffer
// - `key`      — password -> AES-256 key
// - `envelope` — header layout + AES-256-GCM seal/open

pub mod envelope;
pub mod key;
pub mod payload;

pub use envelope::{Envelope, HEADER_LEN, MAGIC, NONCE_LEN, TAG_LEN, VERSION};
pub use key::ArchiveKey;
pub use payload::{EntryRef, PayloadEntry};
