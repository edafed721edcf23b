use bytes::Bytes;
use s5_core::{
    KeyPair, PublicKey, PublishAck, RegistryApi, RegistryEntry, RequestOptions,
    SignedRegistryEntry,
};
use tracing::{debug, info};

use crate::RegistryError;

/// Result of [`RegistryClient::create_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new revision was signed and accepted by the portal.
    Published {
        entry: SignedRegistryEntry,
        ack: PublishAck,
    },
    /// The portal already holds the same data; nothing was published.
    Unchanged(SignedRegistryEntry),
}

impl CreateOutcome {
    /// The entry the portal holds after the call.
    pub fn entry(&self) -> &SignedRegistryEntry {
        match self {
            CreateOutcome::Published { entry, .. } => entry,
            CreateOutcome::Unchanged(entry) => entry,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, CreateOutcome::Published { .. })
    }
}

/// Registry read, publish and read-modify-write operations over any
/// [`RegistryApi`] transport.
///
/// Every entry read through the client is verified before it is returned,
/// and every entry is verified again before it is published.
#[derive(Debug, Clone)]
pub struct RegistryClient<R> {
    api: R,
}

impl<R: RegistryApi> RegistryClient<R> {
    pub fn new(api: R) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &R {
        &self.api
    }

    /// Fetches and verifies the current entry for `public_key`. An entry
    /// signed by any other key is a [`RegistryError::KeyMismatch`].
    pub async fn get_entry(
        &self,
        public_key: &PublicKey,
        options: &RequestOptions,
    ) -> Result<Option<SignedRegistryEntry>, RegistryError> {
        let Some(record) = self.api.get(public_key, options).await? else {
            debug!("registry get: no entry for {public_key}");
            return Ok(None);
        };

        let entry = SignedRegistryEntry::from_record(&record)?;
        if entry.public_key() != public_key {
            return Err(RegistryError::KeyMismatch {
                expected: *public_key,
                found: *entry.public_key(),
            });
        }
        if !entry.verify() {
            return Err(RegistryError::InvalidEntry);
        }
        debug!(
            "registry get: {public_key} at revision {}",
            entry.revision()
        );
        Ok(Some(entry))
    }

    /// Publishes a signed entry after checking its signature locally.
    pub async fn publish_entry(
        &self,
        entry: &SignedRegistryEntry,
        options: &RequestOptions,
    ) -> Result<PublishAck, RegistryError> {
        if !entry.verify() {
            return Err(RegistryError::InvalidEntry);
        }

        let ack = self.api.set(entry.to_record(), options).await?;
        debug!(
            "registry set: {} at revision {} (status {})",
            entry.public_key(),
            entry.revision(),
            ack.status
        );
        Ok(ack)
    }

    /// Points the registry entry of `key` at `data`.
    ///
    /// Reads the current entry first. Publishes `initial_revision` when none
    /// exists, the next revision when the data differs, and nothing when
    /// the data is already current. This is not a transaction: concurrent
    /// writers may race for the same revision and the portal decides.
    pub async fn create_entry(
        &self,
        key: impl Into<KeyPair>,
        data: impl Into<Bytes>,
        initial_revision: u64,
        options: &RequestOptions,
    ) -> Result<CreateOutcome, RegistryError> {
        let keypair = key.into();
        let public_key = keypair.public_key();
        let data = data.into();

        // Rejects empty or oversized data before any network call.
        let mut entry = RegistryEntry::new(public_key, data.clone(), initial_revision)?;

        if let Some(current) = self.get_entry(&public_key, options).await? {
            if current.public_key() != &public_key {
                return Err(RegistryError::KeyMismatch {
                    expected: public_key,
                    found: *current.public_key(),
                });
            }
            if current.data() == &data {
                debug!(
                    "registry create: {public_key} already at revision {} with same data",
                    current.revision()
                );
                return Ok(CreateOutcome::Unchanged(current));
            }

            let revision = current
                .revision()
                .checked_add(1)
                .ok_or(RegistryError::RevisionOverflow)?;
            entry = RegistryEntry::new(public_key, data, revision)?;
        }

        let entry = entry.sign(&keypair)?;
        let ack = self.publish_entry(&entry, options).await?;
        info!(
            "published registry entry {public_key} at revision {}",
            entry.revision()
        );
        Ok(CreateOutcome::Published { entry, ack })
    }
}
