// Password -> AES-256 key.
//
// The key is SHA-256 of the password bytes. There is no salt and no work
// factor: the same password always yields the same key. Archives are only as
// strong as their passwords against offline guessing.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key length.
pub const KEY_LEN: usize = 32;

/// Symmetric key for one archive. Wiped on drop, never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ArchiveKey([u8; KEY_LEN]);

impl ArchiveKey {
    /// Derive the key for `password`. The password is treated as opaque bytes.
    pub fn from_password(password: &str) -> Self {
        let digest = Sha256::digest(password.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest);
        Self(key)
    }

    /// Wrap raw key material.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub(crate) fn expose_secret(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for ArchiveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ArchiveKey([REDACTED])")
    }
}
