//! The content hash used by S5 CIDs (blake3, 32 bytes).

use std::fmt;

/// BLAKE3 content hash.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Hash(blake3::Hash);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hash").field(&self.fmt_short()).finish()
    }
}

impl Hash {
    /// The size of the hash in bytes.
    pub const SIZE: usize = 32;

    /// Hashes `buf` with BLAKE3.
    pub fn new(buf: impl AsRef<[u8]>) -> Self {
        Hash(blake3::hash(buf.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from_bytes(bytes))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// First 5 bytes as lowercase hex, for log lines.
    pub fn fmt_short(&self) -> String {
        data_encoding::HEXLOWER.encode(&self.as_bytes()[..5])
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<[u8; 32]> for Hash {
    fn from(value: [u8; 32]) -> Self {
        Self::from_bytes(value)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(value: Hash) -> Self {
        *value.as_bytes()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
