//! HTTP and WebSocket transport for S5 portals.
//!
//! [`PortalClient`] implements [`s5_core::RegistryApi`] against a portal's
//! registry endpoints and adds content upload/download. Wrap it with
//! [`PortalClient::registry`] for the verified registry protocol, or call
//! [`PortalClient::subscribe`] for pushed updates.
//!
//! Requests are sent to the *resolved* portal URL, which is looked up once
//! per initial URL and kept in a [`PortalUrlCache`].

mod cache;
mod client;
mod config;
mod error;

pub use cache::PortalUrlCache;
pub use client::PortalClient;
pub use config::PortalConfig;
pub use error::PortalError;
