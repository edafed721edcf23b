use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use s5_core::{
    PublicKey, PublishAck, RegistryApi, RegistryEntryRecord, RequestOptions, SignedRegistryEntry,
    TransportError,
};
use tracing::debug;

/// In-memory registry.
///
/// Behaves like a portal that keeps the highest revision per key: stale
/// or equal revisions are acknowledged and dropped. Entries with a bad
/// signature are rejected with status 400. Useful for tests and as a
/// local stand-in for a portal.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: DashMap<PublicKey, SignedRegistryEntry>,
    publish_count: AtomicUsize,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls received, accepted or not.
    pub fn publish_count(&self) -> usize {
        self.publish_count.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn bad_request(message: impl ToString) -> TransportError {
    TransportError::Status {
        status: 400,
        message: message.to_string(),
    }
}

#[async_trait]
impl RegistryApi for MemoryRegistry {
    async fn get(
        &self,
        key: &PublicKey,
        _options: &RequestOptions,
    ) -> Result<Option<RegistryEntryRecord>, TransportError> {
        Ok(self.entries.get(key).map(|entry| entry.to_record()))
    }

    async fn set(
        &self,
        record: RegistryEntryRecord,
        _options: &RequestOptions,
    ) -> Result<PublishAck, TransportError> {
        self.publish_count.fetch_add(1, Ordering::Relaxed);

        let entry = SignedRegistryEntry::from_record(&record).map_err(bad_request)?;
        if !entry.verify() {
            return Err(bad_request("invalid signature"));
        }

        let key = *entry.public_key();
        let revision = entry.revision();
        let mut slot = self.entries.entry(key).or_insert_with(|| entry.clone());
        if slot.revision() < revision {
            *slot = entry;
        } else if *slot != entry {
            debug!(
                "memory registry: ignoring revision {revision} for {key}, holding {}",
                slot.revision()
            );
        }

        Ok(PublishAck { status: 204 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s5_core::{KeyPair, RegistryEntry};

    fn signed(keypair: &KeyPair, data: &'static [u8], revision: u64) -> SignedRegistryEntry {
        RegistryEntry::new(keypair.public_key(), data, revision)
            .unwrap()
            .sign(keypair)
            .unwrap()
    }

    #[tokio::test]
    async fn test_keeps_highest_revision() {
        let registry = MemoryRegistry::new();
        let keypair = KeyPair::from_seed(&[1; 32]);
        let options = RequestOptions::default();

        registry
            .set(signed(&keypair, b"v2", 2).to_record(), &options)
            .await
            .unwrap();
        let ack = registry
            .set(signed(&keypair, b"v1", 1).to_record(), &options)
            .await
            .unwrap();
        assert_eq!(ack.status, 204);

        let record = registry
            .get(&keypair.public_key(), &options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.revision, 2);
        assert_eq!(registry.publish_count(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_bad_signature() {
        let registry = MemoryRegistry::new();
        let keypair = KeyPair::from_seed(&[1; 32]);
        let mut record = signed(&keypair, b"v1", 1).to_record();
        record.revision = 9;

        let err = registry
            .set(record, &RequestOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(registry.is_empty());
    }
}
