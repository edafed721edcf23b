//! Registry entries and their binary wire form.
//!
//! Wire format (CBOR, definite-length array):
//!
//! ```text
//! [ kind = 0x07, tagged_public_key (33 bytes), revision, data, signature? ]
//! ```
//!
//! The revision is a CBOR unsigned integer and therefore uses the shortest
//! encoding for its value. `data` and `signature` are byte strings carrying
//! their own length. Unsigned entries omit the trailing signature.
//!
//! Signatures cover the canonical payload `[0x07, revision, data]`, encoded
//! with the same rules. The key is not part of the payload; it is bound by
//! being the verification key.

use super::{EntryError, KeyPair, PublicKey};
use bytes::Bytes;
use minicbor::{Decoder, Encoder, encode};
use std::convert::Infallible;

/// Record kind marking a registry entry.
pub const RECORD_KIND_REGISTRY_ENTRY: u8 = 0x07;

/// Maximum size of the opaque `data` payload.
pub const MAX_DATA_SIZE: usize = 255;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

const UNSIGNED_FIELDS: u64 = 4;
const SIGNED_FIELDS: u64 = 5;

/// The unsigned part of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    public_key: PublicKey,
    data: Bytes,
    revision: u64,
}

/// A registry entry with a detached signature over its canonical payload.
///
/// There are no mutators: a new revision is a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRegistryEntry {
    entry: RegistryEntry,
    signature: [u8; SIGNATURE_SIZE],
}

/// Result of [`decode_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEntry {
    Unsigned(RegistryEntry),
    Signed(SignedRegistryEntry),
}

pub(crate) fn encode_cbor(
    f: impl FnOnce(&mut Encoder<Vec<u8>>) -> Result<(), encode::Error<Infallible>>,
) -> Bytes {
    let mut encoder = Encoder::new(Vec::new());
    f(&mut encoder).expect("cbor encoding into a Vec is infallible");
    Bytes::from(encoder.into_writer())
}

/// Canonical bytes covered by an entry signature.
pub fn signing_payload(data: &[u8], revision: u64) -> Bytes {
    encode_cbor(|e| {
        e.array(3)?
            .u8(RECORD_KIND_REGISTRY_ENTRY)?
            .u64(revision)?
            .bytes(data)?;
        Ok(())
    })
}

impl RegistryEntry {
    /// Creates an entry, enforcing `1..=MAX_DATA_SIZE` bytes of data.
    pub fn new(
        public_key: PublicKey,
        data: impl Into<Bytes>,
        revision: u64,
    ) -> Result<Self, EntryError> {
        let data = data.into();
        if data.is_empty() {
            return Err(EntryError::EmptyData);
        }
        if data.len() > MAX_DATA_SIZE {
            return Err(EntryError::DataTooLarge {
                size: data.len(),
                max: MAX_DATA_SIZE,
            });
        }

        Ok(Self {
            public_key,
            data,
            revision,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn signing_payload(&self) -> Bytes {
        signing_payload(&self.data, self.revision)
    }

    /// Signs the entry. `keypair` must own the entry's public key.
    pub fn sign(self, keypair: &KeyPair) -> Result<SignedRegistryEntry, EntryError> {
        if keypair.public_key() != self.public_key {
            return Err(EntryError::SigningKeyMismatch);
        }
        let signature = keypair.sign(&self.signing_payload());
        Ok(SignedRegistryEntry::from_parts(self, signature))
    }

    /// Binary form without a signature.
    pub fn encode(&self) -> Bytes {
        encode_cbor(|e| {
            self.encode_fields(e, UNSIGNED_FIELDS)?;
            Ok(())
        })
    }

    fn encode_fields<'e>(
        &self,
        e: &'e mut Encoder<Vec<u8>>,
        fields: u64,
    ) -> Result<&'e mut Encoder<Vec<u8>>, encode::Error<Infallible>> {
        e.array(fields)?
            .u8(RECORD_KIND_REGISTRY_ENTRY)?
            .bytes(&self.public_key.to_tagged_bytes())?
            .u64(self.revision)?
            .bytes(&self.data)
    }
}

impl SignedRegistryEntry {
    /// Pairs an entry with a signature without checking it.
    ///
    /// Use [`SignedRegistryEntry::verify`] before trusting the result.
    pub fn from_parts(entry: RegistryEntry, signature: [u8; SIGNATURE_SIZE]) -> Self {
        Self { entry, signature }
    }

    pub fn entry(&self) -> &RegistryEntry {
        &self.entry
    }

    pub fn into_entry(self) -> RegistryEntry {
        self.entry
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.entry.public_key
    }

    pub fn data(&self) -> &Bytes {
        &self.entry.data
    }

    pub fn revision(&self) -> u64 {
        self.entry.revision
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.signature
    }

    /// True iff the signature is valid for this entry's key and payload.
    pub fn verify(&self) -> bool {
        self.entry
            .public_key
            .verify(&self.entry.signing_payload(), &self.signature)
    }

    /// Binary wire form, including the signature.
    pub fn encode(&self) -> Bytes {
        encode_cbor(|e| {
            self.entry
                .encode_fields(e, SIGNED_FIELDS)?
                .bytes(&self.signature)?;
            Ok(())
        })
    }

    /// Decodes the binary form, requiring a signature to be present.
    pub fn decode(bytes: &[u8]) -> Result<Self, EntryError> {
        match decode_entry(bytes)? {
            DecodedEntry::Signed(entry) => Ok(entry),
            DecodedEntry::Unsigned(_) => Err(EntryError::InvalidFieldCount(UNSIGNED_FIELDS)),
        }
    }
}

/// Free-function form of [`SignedRegistryEntry::verify`].
pub fn verify(entry: &SignedRegistryEntry) -> bool {
    entry.verify()
}

/// Decodes the binary form of a signed or unsigned entry.
pub fn decode_entry(bytes: &[u8]) -> Result<DecodedEntry, EntryError> {
    let mut d = Decoder::new(bytes);

    let fields = d.array()?.ok_or(EntryError::IndefiniteLength)?;
    if fields != UNSIGNED_FIELDS && fields != SIGNED_FIELDS {
        return Err(EntryError::InvalidFieldCount(fields));
    }

    let kind = d.u8()?;
    if kind != RECORD_KIND_REGISTRY_ENTRY {
        return Err(EntryError::InvalidRecordKind(kind));
    }

    let public_key = PublicKey::from_tagged_bytes(d.bytes()?)?;
    let revision = d.u64()?;
    let data = Bytes::copy_from_slice(d.bytes()?);
    let entry = RegistryEntry::new(public_key, data, revision)?;

    let decoded = if fields == SIGNED_FIELDS {
        let raw = d.bytes()?;
        let signature: [u8; SIGNATURE_SIZE] =
            raw.try_into()
                .map_err(|_| EntryError::InvalidSignatureLength {
                    expected: SIGNATURE_SIZE,
                    actual: raw.len(),
                })?;
        DecodedEntry::Signed(SignedRegistryEntry::from_parts(entry, signature))
    } else {
        DecodedEntry::Unsigned(entry)
    };

    let trailing = bytes.len() - d.position();
    if trailing > 0 {
        return Err(EntryError::TrailingBytes(trailing));
    }

    Ok(decoded)
}
