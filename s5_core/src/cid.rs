//! Content identifiers for blobs stored on a portal.
//!
//! A [`Cid`] names immutable content by its BLAKE3 hash and size. Registry
//! entries usually point at a CID; [`Cid::to_registry_entry`] produces the
//! canonical `data` payload for that case.

use crate::Hash;
use std::fmt;
use std::str::FromStr;

const S5_MAGIC_BYTE: u8 = 0x5b;
const BLOB_TYPE_DEFAULT: u8 = 0x82;
const MULTIHASH_BLAKE3: u8 = 0x1e;

/// Prefix marking a registry `data` payload that holds a CID.
pub const REGISTRY_S5_MAGIC_BYTE: u8 = 0x5a;

/// Length of a CID without any size bytes.
const CID_PREFIX_LEN: usize = 3 + Hash::SIZE;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum CidError {
    #[error("invalid multibase string: {0}")]
    Multibase(#[from] multibase::Error),
    #[error("invalid length: expected 35 to 43 bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid magic byte: expected {0:#x}, got {1:#x}")]
    InvalidMagicByte(u8, u8),
    #[error("invalid blob type: expected {0:#x}, got {1:#x}")]
    InvalidBlobType(u8, u8),
    #[error("invalid multihash type: expected {0:#x}, got {1:#x}")]
    InvalidMultihashType(u8, u8),
}

/// Content identifier: BLAKE3 hash plus blob size.
///
/// ```
/// use s5_core::{Cid, Hash};
///
/// let data = b"hello";
/// let cid = Cid::new(Hash::new(data), data.len() as u64);
/// let parsed: Cid = cid.to_string().parse().unwrap();
/// assert_eq!(parsed, cid);
/// ```
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Cid {
    pub hash: Hash,
    pub size: u64,
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cid")
            .field("hash", &self.hash)
            .field("size", &self.size)
            .finish()
    }
}

impl Cid {
    pub fn new(hash: Hash, size: u64) -> Self {
        Self { hash, size }
    }

    /// Computes the CID of an in-memory blob.
    pub fn for_bytes(data: &[u8]) -> Self {
        Self::new(Hash::new(data), data.len() as u64)
    }

    /// Parses any multibase string form.
    pub fn parse(s: &str) -> Result<Self, CidError> {
        let (_, bytes) = multibase::decode(s)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CidError> {
        if bytes.len() < CID_PREFIX_LEN || bytes.len() > CID_PREFIX_LEN + 8 {
            return Err(CidError::InvalidLength(bytes.len()));
        }
        if bytes[0] != S5_MAGIC_BYTE {
            return Err(CidError::InvalidMagicByte(S5_MAGIC_BYTE, bytes[0]));
        }
        if bytes[1] != BLOB_TYPE_DEFAULT {
            return Err(CidError::InvalidBlobType(BLOB_TYPE_DEFAULT, bytes[1]));
        }
        if bytes[2] != MULTIHASH_BLAKE3 {
            return Err(CidError::InvalidMultihashType(MULTIHASH_BLAKE3, bytes[2]));
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[3..CID_PREFIX_LEN]);

        // Size is little endian with trailing zero bytes trimmed.
        let size_slice = &bytes[CID_PREFIX_LEN..];
        let mut size_bytes = [0u8; 8];
        size_bytes[..size_slice.len()].copy_from_slice(size_slice);

        Ok(Self {
            hash: hash.into(),
            size: u64::from_le_bytes(size_bytes),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut size_bytes = self.size.to_le_bytes().to_vec();
        match size_bytes.iter().rposition(|&x| x != 0) {
            Some(pos) => size_bytes.truncate(pos + 1),
            None => size_bytes.clear(),
        }

        let mut out = Vec::with_capacity(CID_PREFIX_LEN + size_bytes.len());
        out.extend_from_slice(&[S5_MAGIC_BYTE, BLOB_TYPE_DEFAULT, MULTIHASH_BLAKE3]);
        out.extend_from_slice(self.hash.as_bytes());
        out.extend_from_slice(&size_bytes);
        out
    }

    /// Encodes this CID as a registry entry `data` payload.
    pub fn to_registry_entry(&self) -> Vec<u8> {
        let mut out = vec![REGISTRY_S5_MAGIC_BYTE];
        out.extend_from_slice(&self.to_bytes());
        out
    }

    /// Inverse of [`Cid::to_registry_entry`].
    pub fn from_registry_entry(data: &[u8]) -> Result<Self, CidError> {
        match data.split_first() {
            Some((&REGISTRY_S5_MAGIC_BYTE, rest)) => Self::from_bytes(rest),
            Some((&other, _)) => Err(CidError::InvalidMagicByte(REGISTRY_S5_MAGIC_BYTE, other)),
            None => Err(CidError::InvalidLength(0)),
        }
    }

    pub fn to_base32(&self) -> String {
        multibase::encode(multibase::Base::Base32Lower, self.to_bytes())
    }

    pub fn to_base58(&self) -> String {
        multibase::encode(multibase::Base::Base58Btc, self.to_bytes())
    }

    pub fn to_base64url(&self) -> String {
        multibase::encode(multibase::Base::Base64Url, self.to_bytes())
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for Cid {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cid::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_size_encoding_is_trimmed() {
        let hash = Hash::new(b"test");
        assert_eq!(Cid::new(hash, 0).to_bytes().len(), 35);
        assert_eq!(Cid::new(hash, 255).to_bytes().len(), 36);
        assert_eq!(Cid::new(hash, 256).to_bytes().len(), 37);
        assert_eq!(Cid::new(hash, u64::MAX).to_bytes().len(), 43);
    }

    #[test]
    fn test_cid_parses_every_string_form() {
        let cid = Cid::for_bytes(b"hello world");
        for s in [cid.to_base32(), cid.to_base58(), cid.to_base64url()] {
            assert_eq!(Cid::parse(&s).unwrap(), cid);
        }
        assert_eq!(cid.to_string().parse::<Cid>().unwrap(), cid);
    }

    #[test]
    fn test_cid_registry_entry_form() {
        let cid = Cid::for_bytes(b"pointer target");
        let data = cid.to_registry_entry();
        assert_eq!(data[0], REGISTRY_S5_MAGIC_BYTE);
        assert!(data.len() >= 33);
        assert_eq!(Cid::from_registry_entry(&data).unwrap(), cid);

        assert!(matches!(
            Cid::from_registry_entry(&cid.to_bytes()),
            Err(CidError::InvalidMagicByte(REGISTRY_S5_MAGIC_BYTE, S5_MAGIC_BYTE))
        ));
        assert!(matches!(
            Cid::from_registry_entry(&[]),
            Err(CidError::InvalidLength(0))
        ));
    }

    #[test]
    fn test_cid_rejects_bad_prefix() {
        let mut bytes = Cid::for_bytes(b"x").to_bytes();
        bytes[2] = 0x12;
        assert!(matches!(
            Cid::from_bytes(&bytes),
            Err(CidError::InvalidMultihashType(MULTIHASH_BLAKE3, 0x12))
        ));
        assert!(matches!(
            Cid::from_bytes(&bytes[..20]),
            Err(CidError::InvalidLength(20))
        ));
    }
}
