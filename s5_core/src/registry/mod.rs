//! Registry entries: signed, versioned pointers keyed by a public key.
//!
//! This module holds the wire-stable pieces of the registry protocol:
//!
//! - [`PublicKey`] and [`KeyPair`]: the Ed25519 identity that owns an entry.
//! - [`RegistryEntry`] / [`SignedRegistryEntry`]: the entry itself, its
//!   binary codec and the signature check ([`verify`]).
//! - [`RegistryEntryRecord`]: the JSON/base64url form used over HTTP.
//! - [`SubscribeRequest`]: the control frame of the push channel.
//! - [`RegistryApi`]: the transport seam the client protocol is written
//!   against.
//!
//! Read-modify-write logic (revision increments, conflict checks) lives in
//! the `s5_registry` crate.

mod entry;
mod error;
mod keypair;
mod message;
mod public_key;
mod record;

pub use entry::{
    DecodedEntry, MAX_DATA_SIZE, RECORD_KIND_REGISTRY_ENTRY, RegistryEntry, SIGNATURE_SIZE,
    SignedRegistryEntry, decode_entry, signing_payload, verify,
};
pub use error::{EntryError, TransportError};
pub use keypair::KeyPair;
pub use message::{OPCODE_SUBSCRIBE, SubscribeRequest};
pub use public_key::{KEY_SIZE, KEY_TYPE_ED25519, PublicKey, TAGGED_KEY_SIZE};
pub use record::{BASE64URL, RegistryEntryRecord};

use crate::RequestOptions;
use async_trait::async_trait;

/// Acknowledgement of a successful publish.
///
/// Only the status is meaningful; portals document no response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishAck {
    pub status: u16,
}

/// Transport used by the registry client protocol.
///
/// Implementations move [`RegistryEntryRecord`]s to and from a portal (or
/// any other store) and report failures as [`TransportError`]. They do not
/// decode or verify entries; that is the caller's job.
///
/// # Semantics
///
/// - `get` returns `Ok(None)` when the portal has no entry for the key.
/// - `set` returns the portal's acknowledgement. Whether a stale revision is
///   rejected or overwritten is decided by the portal, not the client.
#[async_trait]
pub trait RegistryApi: std::fmt::Debug + Send + Sync {
    /// Fetches the current entry for `key`.
    async fn get(
        &self,
        key: &PublicKey,
        options: &RequestOptions,
    ) -> Result<Option<RegistryEntryRecord>, TransportError>;

    /// Submits a signed entry.
    async fn set(
        &self,
        record: RegistryEntryRecord,
        options: &RequestOptions,
    ) -> Result<PublishAck, TransportError>;
}

#[async_trait]
impl<T: RegistryApi + ?Sized> RegistryApi for std::sync::Arc<T> {
    async fn get(
        &self,
        key: &PublicKey,
        options: &RequestOptions,
    ) -> Result<Option<RegistryEntryRecord>, TransportError> {
        (**self).get(key, options).await
    }

    async fn set(
        &self,
        record: RegistryEntryRecord,
        options: &RequestOptions,
    ) -> Result<PublishAck, TransportError> {
        (**self).set(record, options).await
    }
}

#[async_trait]
impl<T: RegistryApi + ?Sized> RegistryApi for Box<T> {
    async fn get(
        &self,
        key: &PublicKey,
        options: &RequestOptions,
    ) -> Result<Option<RegistryEntryRecord>, TransportError> {
        (**self).get(key, options).await
    }

    async fn set(
        &self,
        record: RegistryEntryRecord,
        options: &RequestOptions,
    ) -> Result<PublishAck, TransportError> {
        (**self).set(record, options).await
    }
}
