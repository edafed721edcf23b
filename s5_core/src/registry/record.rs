//! Transport-safe text form of a signed registry entry.
//!
//! This is the JSON body exchanged with the portal's HTTP registry
//! endpoints: `{"pk": .., "revision": .., "data": .., "signature": ..}`.

use super::{EntryError, PublicKey, RegistryEntry, SIGNATURE_SIZE, SignedRegistryEntry};
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Deserialize, Serialize};

/// URL-safe base64 that writes no padding and accepts input with or
/// without it.
pub const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// JSON representation of a [`SignedRegistryEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntryRecord {
    /// Tagged public key, base64url.
    pub pk: String,
    pub revision: u64,
    /// Entry data, base64url.
    pub data: String,
    /// Detached signature, base64url.
    pub signature: String,
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, EntryError> {
    BASE64URL
        .decode(value)
        .map_err(|source| EntryError::Base64 { field, source })
}

impl RegistryEntryRecord {
    /// Parses a record from a JSON body. Missing or mistyped fields are an
    /// [`EntryError::Json`].
    pub fn from_json(body: &[u8]) -> Result<Self, EntryError> {
        Ok(serde_json::from_slice(body)?)
    }
}

impl From<&SignedRegistryEntry> for RegistryEntryRecord {
    fn from(entry: &SignedRegistryEntry) -> Self {
        Self {
            pk: entry.public_key().to_base64url(),
            revision: entry.revision(),
            data: BASE64URL.encode(entry.data()),
            signature: BASE64URL.encode(entry.signature()),
        }
    }
}

impl TryFrom<&RegistryEntryRecord> for SignedRegistryEntry {
    type Error = EntryError;

    fn try_from(record: &RegistryEntryRecord) -> Result<Self, Self::Error> {
        let public_key = PublicKey::from_tagged_bytes(&decode_field("pk", &record.pk)?)?;
        let data = decode_field("data", &record.data)?;
        let raw_signature = decode_field("signature", &record.signature)?;
        let signature: [u8; SIGNATURE_SIZE] =
            raw_signature
                .as_slice()
                .try_into()
                .map_err(|_| EntryError::InvalidSignatureLength {
                    expected: SIGNATURE_SIZE,
                    actual: raw_signature.len(),
                })?;

        let entry = RegistryEntry::new(public_key, data, record.revision)?;
        Ok(SignedRegistryEntry::from_parts(entry, signature))
    }
}

impl SignedRegistryEntry {
    pub fn to_record(&self) -> RegistryEntryRecord {
        RegistryEntryRecord::from(self)
    }

    pub fn from_record(record: &RegistryEntryRecord) -> Result<Self, EntryError> {
        Self::try_from(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::KeyPair;

    fn signed() -> SignedRegistryEntry {
        let keypair = KeyPair::from_seed(&[5; 32]);
        RegistryEntry::new(keypair.public_key(), &b"hello registry"[..], 77)
            .unwrap()
            .sign(&keypair)
            .unwrap()
    }

    #[test]
    fn test_record_roundtrip_through_json() {
        let entry = signed();
        let json = serde_json::to_string(&entry.to_record()).unwrap();
        let record: RegistryEntryRecord = serde_json::from_str(&json).unwrap();
        let decoded = SignedRegistryEntry::from_record(&record).unwrap();
        assert_eq!(decoded, entry);
        assert!(decoded.verify());
    }

    #[test]
    fn test_record_fields_are_unpadded_base64url() {
        let record = signed().to_record();
        for field in [&record.pk, &record.data, &record.signature] {
            assert!(!field.contains('='));
            assert!(!field.contains('+') && !field.contains('/'));
        }
        assert_eq!(record.revision, 77);
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["revision"], 77);
    }

    #[test]
    fn test_record_accepts_padded_input() {
        let entry = signed();
        let mut record = entry.to_record();
        // 14 data bytes need one padding character, 64 signature bytes two.
        record.data.push('=');
        record.signature.push_str("==");
        assert_eq!(SignedRegistryEntry::from_record(&record).unwrap(), entry);
    }

    #[test]
    fn test_record_from_json_rejects_missing_fields() {
        let record = signed().to_record();
        let body = format!(
            r#"{{"pk":"{}","revision":1,"data":"{}"}}"#,
            record.pk, record.data
        );
        assert!(matches!(
            RegistryEntryRecord::from_json(body.as_bytes()),
            Err(EntryError::Json(_))
        ));
        assert!(matches!(
            RegistryEntryRecord::from_json(b"not json"),
            Err(EntryError::Json(_))
        ));

        let json = serde_json::to_vec(&record).unwrap();
        assert_eq!(RegistryEntryRecord::from_json(&json).unwrap(), record);
    }

    #[test]
    fn test_record_rejects_malformed_fields() {
        let mut record = signed().to_record();
        record.pk = "not base64!".to_owned();
        assert!(matches!(
            SignedRegistryEntry::from_record(&record),
            Err(EntryError::Base64 { field: "pk", .. })
        ));

        let mut record = signed().to_record();
        record.signature = BASE64URL.encode([0u8; 32]);
        assert!(matches!(
            SignedRegistryEntry::from_record(&record),
            Err(EntryError::InvalidSignatureLength {
                expected: 64,
                actual: 32
            })
        ));

        let mut record = signed().to_record();
        record.data = String::new();
        assert!(matches!(
            SignedRegistryEntry::from_record(&record),
            Err(EntryError::EmptyData)
        ));
    }
}
