// Error types shared by the codec, container and archive layers.
//
// Every public operation returns `Result<T, ArchiveError>`. The Huffman layer
// has its own `CodecError` so the bit-level code can report precisely what
// went wrong; it folds into `ArchiveError::CorruptPayload` at the boundary.

use std::io;

use thiserror::Error;

/// Failure of a create/list/extract operation.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Container header is not ours, or is a version we cannot read.
    #[error("unrecognized archive: {0}")]
    InvalidMagicOrVersion(String),

    /// Header was recognized but the container is truncated or inconsistent.
    #[error("malformed archive: {0}")]
    MalformedContainer(String),

    /// AEAD tag verification failed: wrong password or tampered archive.
    #[error("authentication failed (wrong password or tampered archive)")]
    AuthenticationFailure,

    /// Decrypted payload does not decompress or parse.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// Entry name does not fit the 16-bit length field.
    #[error("entry name is {len} bytes, maximum is {max}: {name}")]
    NameTooLong { name: String, len: usize, max: usize },

    /// The cipher refused to seal a payload of this size.
    #[error("payload of {len} bytes is too large to encrypt")]
    PayloadTooLarge { len: usize },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure inside the Huffman codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Tree has an internal node without children, or is too deep to encode.
    #[error("malformed huffman tree: {0}")]
    MalformedTree(&'static str),

    /// Input byte has no code in the table built from the frequencies.
    #[error("no code for byte {0:#04x}")]
    MissingCode(u8),

    /// A bit walk stepped into a child that does not exist.
    #[error("bit walk reached a dead end at bit {bit_offset}")]
    DeadEnd { bit_offset: u64 },

    /// Stream ran out before the expected number of symbols was decoded.
    #[error("stream exhausted after {decoded} of {expected} symbols")]
    Truncated { decoded: u64, expected: u64 },

    /// Packed stream is longer than the decoded symbols account for.
    #[error("{extra} unused byte(s) after the last symbol")]
    TrailingData { extra: usize },

    /// Frequency counts do not sum into a u64.
    #[error("frequency table total overflows u64")]
    FrequencyOverflow,
}

impl From<CodecError> for ArchiveError {
    fn from(e: CodecError) -> Self {
        Self::CorruptPayload(e.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
