//! Core S5 portal client types.
//!
//! This crate defines the types shared by all portal client crates.
//!
//! ## Protocol types (wire-stable)
//!
//! - Content hashes (`hash::Hash`)
//! - Content identifiers (`cid::Cid`) and their registry `data` form
//! - Registry entries, their binary and JSON forms, public keys and the
//!   subscription control frame (`registry::*`)
//!
//! Changes to these are protocol changes.
//!
//! ## Convenience APIs (non-wire)
//!
//! - The registry transport seam (`RegistryApi`); implementations live in
//!   `s5_registry` (`MemoryRegistry`) and `s5_portal` (`PortalClient`)
//! - Layered request options (`RequestOptions`)

pub mod cid;
pub mod hash;
pub mod options;
pub mod registry;

pub use cid::{Cid, CidError};
pub use hash::Hash;
pub use options::{RequestOptions, ResolvedOptions};
pub use registry::{
    EntryError, KeyPair, PublicKey, PublishAck, RegistryApi, RegistryEntry, RegistryEntryRecord,
    SignedRegistryEntry, TransportError,
};
