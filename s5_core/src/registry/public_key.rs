use super::{BASE64URL, EntryError, SIGNATURE_SIZE};
use base64::Engine;
use ed25519_dalek::{Signature, VerifyingKey};
use std::fmt;

/// Size of a raw Ed25519 public key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a public key with its one-byte type tag.
pub const TAGGED_KEY_SIZE: usize = 1 + KEY_SIZE;

/// Type tag for Ed25519 keys.
pub const KEY_TYPE_ED25519: u8 = 0xed;

/// Owner key of a registry entry.
///
/// On the wire a key is always carried in tagged form: the type byte
/// followed by the raw key bytes.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum PublicKey {
    /// An Ed25519 verification key.
    Ed25519([u8; KEY_SIZE]),
}

impl PublicKey {
    /// Splits the key into its type tag and raw bytes.
    pub fn to_bytes(&self) -> (u8, &[u8]) {
        match self {
            PublicKey::Ed25519(key) => (KEY_TYPE_ED25519, key),
        }
    }

    /// Builds a key from a type tag and raw key bytes.
    pub fn from_bytes(key_type: u8, data: &[u8]) -> Result<Self, EntryError> {
        let key: [u8; KEY_SIZE] = data
            .try_into()
            .map_err(|_| EntryError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: data.len(),
            })?;

        match key_type {
            KEY_TYPE_ED25519 => Ok(PublicKey::Ed25519(key)),
            other => Err(EntryError::UnknownKeyType(other)),
        }
    }

    pub fn key_type(&self) -> u8 {
        self.to_bytes().0
    }

    /// Raw key bytes without the type tag.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        match self {
            PublicKey::Ed25519(key) => key,
        }
    }

    pub fn to_tagged_bytes(&self) -> [u8; TAGGED_KEY_SIZE] {
        let (key_type, key) = self.to_bytes();
        let mut out = [0u8; TAGGED_KEY_SIZE];
        out[0] = key_type;
        out[1..].copy_from_slice(key);
        out
    }

    pub fn from_tagged_bytes(bytes: &[u8]) -> Result<Self, EntryError> {
        if bytes.len() != TAGGED_KEY_SIZE {
            return Err(EntryError::InvalidKeyLength {
                expected: TAGGED_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        Self::from_bytes(bytes[0], &bytes[1..])
    }

    /// Tagged key as unpadded URL-safe base64, the form used in `?pk=`.
    pub fn to_base64url(&self) -> String {
        BASE64URL.encode(self.to_tagged_bytes())
    }

    pub fn from_base64url(s: &str) -> Result<Self, EntryError> {
        let bytes = BASE64URL
            .decode(s)
            .map_err(|source| EntryError::Base64 { field: "pk", source })?;
        Self::from_tagged_bytes(&bytes)
    }

    /// Checks `signature` over `message` with this key.
    ///
    /// Returns `false` for keys that are not valid curve points.
    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_SIZE]) -> bool {
        match self {
            PublicKey::Ed25519(key) => {
                let Ok(verifying_key) = VerifyingKey::from_bytes(key) else {
                    return false;
                };
                let signature = Signature::from_bytes(signature);
                verifying_key.verify_strict(message, &signature).is_ok()
            }
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKey::Ed25519(_) => write!(f, "PublicKey(ed25519:{})", self.to_base64url()),
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64url())
    }
}

impl std::str::FromStr for PublicKey {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64url(s)
    }
}
