use s5_core::{Cid, CidError, TransportError};
use s5_registry::RegistryError;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum PortalError {
    #[error("invalid portal url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("portal returned an invalid cid: {0}")]
    InvalidCid(#[from] CidError),

    #[error("content does not match cid: expected {expected}, got {actual}")]
    HashMismatch { expected: Cid, actual: Cid },

    #[error("unexpected portal response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
