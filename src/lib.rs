//! Hufflock: password-protected multi-file archives.
//!
//! Files are framed into one payload, compressed with a static Huffman code
//! and sealed with AES-256-GCM. The crate provides:
//! - The Huffman codec (`huffman`)
//! - Payload framing, key derivation and the on-disk envelope (`container`)
//! - In-memory create/list/extract (`archive`)
//! - Filesystem walking and atomic extraction (`io`, `file-io` feature)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use hufflock::archive;
//! use hufflock::container::{Envelope, PayloadEntry};
//!
//! let entries = vec![
//!     PayloadEntry::new("notes.txt", b"hello hello hello".to_vec()),
//!     PayloadEntry::new("data/empty.bin", Vec::new()),
//! ];
//! let envelope = archive::create(&entries, "correct horse").unwrap();
//!
//! let bytes = envelope.to_bytes();
//! let reopened = Envelope::from_bytes(&bytes).unwrap();
//!
//! let mut restored: Vec<PayloadEntry> = Vec::new();
//! archive::extract(&reopened, "correct horse", &mut restored).unwrap();
//! assert_eq!(restored, entries);
//! ```

pub mod archive;
pub mod container;
pub mod error;
pub mod huffman;

#[cfg(feature = "file-io")]
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{ArchiveError, CodecError, Result};
