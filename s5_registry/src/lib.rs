//! Registry client protocol for S5 portals.
//!
//! This crate implements the read-modify-write side of the registry on top
//! of any [`s5_core::RegistryApi`] transport:
//!
//! - [`RegistryClient`]: verified reads, verified publishes and
//!   [`RegistryClient::create_entry`], which bumps the revision only when
//!   the data changes.
//! - [`Subscription`]: a WebSocket push channel delivering signed entries
//!   for one public key.
//! - [`MemoryRegistry`]: an in-process [`s5_core::RegistryApi`] that keeps
//!   the highest revision per key.
//!
//! The HTTP transport for real portals lives in `s5_portal`.

mod client;
mod error;
mod memory;
mod subscription;

pub use client::{CreateOutcome, RegistryClient};
pub use error::RegistryError;
pub use memory::MemoryRegistry;
pub use subscription::{SubscribeOptions, Subscription};
