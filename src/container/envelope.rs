// On-disk container and its AES-256-GCM seal.
//
// Layout (little-endian, fixed width):
//
//   offset  size   field
//   0       4      magic "GHA1"
//   4       1      version (1)
//   5       12     nonce
//   17      2048   frequency table, 256 x u64
//   2065    8      ciphertext length
//   2073    N      ciphertext (compressed stream + 16-byte tag)
//
// The whole 2073-byte header is the AEAD associated data. The frequency
// table travels in the clear but cannot be altered without the tag check
// failing, and neither can the nonce or the length field.

use std::io::{Read, Write};

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{ArchiveError, Result};
use crate::huffman::frequency::{self, FrequencyTable};

use super::key::ArchiveKey;

/// Identifies a hufflock container.
pub const MAGIC: [u8; 4] = *b"GHA1";

/// Current (and only) container version.
pub const VERSION: u8 = 1;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

const VERSION_OFFSET: usize = MAGIC.len(); // 4
const NONCE_OFFSET: usize = VERSION_OFFSET + 1; // 5
const FREQ_OFFSET: usize = NONCE_OFFSET + NONCE_LEN; // 17
const CT_LEN_OFFSET: usize = FREQ_OFFSET + frequency::ENCODED_LEN; // 2065

/// Bytes before the ciphertext.
pub const HEADER_LEN: usize = CT_LEN_OFFSET + 8; // 2073

// ---------------------------------------------------------------------------
// AEAD primitives
// ---------------------------------------------------------------------------

fn cipher(key: &ArchiveKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.expose_secret()))
}

/// Encrypt `plaintext`, binding `aad`. Output is ciphertext followed by the tag.
pub fn seal(
    key: &ArchiveKey,
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| ArchiveError::PayloadTooLarge {
            len: plaintext.len(),
        })
}

/// Verify and decrypt. Nothing is returned unless the tag matches.
pub fn open(
    key: &ArchiveKey,
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    cipher(key)
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| ArchiveError::AuthenticationFailure)
}

/// Fresh random nonce from the OS RNG.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

fn build_header(
    nonce: &[u8; NONCE_LEN],
    frequencies: &FrequencyTable,
    ciphertext_len: u64,
) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(&MAGIC);
    header.push(VERSION);
    header.extend_from_slice(nonce);
    header.extend_from_slice(&frequencies.to_le_bytes());
    header.extend_from_slice(&ciphertext_len.to_le_bytes());
    debug_assert_eq!(header.len(), HEADER_LEN);
    header
}

/// Parsed header fields.
struct Header {
    nonce: [u8; NONCE_LEN],
    frequencies: FrequencyTable,
    ciphertext_len: u64,
}

fn parse_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Err(ArchiveError::InvalidMagicOrVersion(
            "magic mismatch, not a hufflock archive".into(),
        ));
    }
    let version = *bytes
        .get(VERSION_OFFSET)
        .ok_or_else(|| ArchiveError::InvalidMagicOrVersion("missing version byte".into()))?;
    if version != VERSION {
        return Err(ArchiveError::InvalidMagicOrVersion(format!(
            "unsupported version {version}, expected {VERSION}"
        )));
    }
    if bytes.len() < HEADER_LEN {
        return Err(ArchiveError::MalformedContainer(format!(
            "header truncated: {} of {HEADER_LEN} bytes",
            bytes.len()
        )));
    }

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&bytes[NONCE_OFFSET..FREQ_OFFSET]);

    let mut table = [0u8; frequency::ENCODED_LEN];
    table.copy_from_slice(&bytes[FREQ_OFFSET..CT_LEN_OFFSET]);

    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[CT_LEN_OFFSET..HEADER_LEN]);

    Ok(Header {
        nonce,
        frequencies: FrequencyTable::from_le_bytes(&table),
        ciphertext_len: u64::from_le_bytes(len),
    })
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A sealed archive: everything that is written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_LEN],
    /// Counts of the plaintext payload; rebuilds the Huffman tree on open.
    pub frequencies: FrequencyTable,
    /// Encrypted compressed stream, tag included.
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt a compressed stream under a fresh random nonce.
    pub fn seal(key: &ArchiveKey, frequencies: FrequencyTable, compressed: &[u8]) -> Result<Self> {
        Self::seal_with_nonce(key, generate_nonce(), frequencies, compressed)
    }

    /// Encrypt with a caller-chosen nonce. Never reuse a nonce with a key.
    pub fn seal_with_nonce(
        key: &ArchiveKey,
        nonce: [u8; NONCE_LEN],
        frequencies: FrequencyTable,
        compressed: &[u8],
    ) -> Result<Self> {
        let ciphertext_len = (compressed.len() + TAG_LEN) as u64;
        let header = build_header(&nonce, &frequencies, ciphertext_len);
        let ciphertext = seal(key, &nonce, &header, compressed)?;
        debug_assert_eq!(ciphertext.len() as u64, ciphertext_len);
        Ok(Self {
            nonce,
            frequencies,
            ciphertext,
        })
    }

    /// Verify the tag and return the compressed stream.
    pub fn open(&self, key: &ArchiveKey) -> Result<Vec<u8>> {
        open(key, &self.nonce, &self.header(), &self.ciphertext)
    }

    /// The serialized header, which doubles as associated data.
    pub fn header(&self) -> Vec<u8> {
        build_header(&self.nonce, &self.frequencies, self.ciphertext.len() as u64)
    }

    /// Size of the compressed stream inside the ciphertext.
    pub fn compressed_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_LEN)
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.ciphertext.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header();
        out.reserve_exact(self.ciphertext.len());
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.header())?;
        w.write_all(&self.ciphertext)
    }

    /// Parse a complete container. The ciphertext must fill the rest of
    /// `bytes` exactly.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = parse_header(bytes)?;
        let body = &bytes[HEADER_LEN..];

        if header.ciphertext_len != body.len() as u64 {
            return Err(ArchiveError::MalformedContainer(format!(
                "header declares {} ciphertext bytes, found {}",
                header.ciphertext_len,
                body.len()
            )));
        }
        if body.len() < TAG_LEN {
            return Err(ArchiveError::MalformedContainer(format!(
                "ciphertext of {} bytes is shorter than the {TAG_LEN}-byte tag",
                body.len()
            )));
        }

        Ok(Self {
            nonce: header.nonce,
            frequencies: header.frequencies,
            ciphertext: body.to_vec(),
        })
    }

    /// Read a whole container from `r`.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}
