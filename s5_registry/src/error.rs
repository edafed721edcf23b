use s5_core::{EntryError, PublicKey, TransportError};

/// Failure of a registry client operation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    /// The bytes or record could not be decoded into an entry.
    #[error("malformed registry entry: {0}")]
    MalformedEntry(#[from] EntryError),

    /// The entry decoded but its signature does not verify.
    #[error("registry entry signature is invalid")]
    InvalidEntry,

    #[error("registry entry belongs to {found}, expected {expected}")]
    KeyMismatch {
        expected: PublicKey,
        found: PublicKey,
    },

    #[error("registry entry revision cannot be incremented past u64::MAX")]
    RevisionOverflow,

    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for RegistryError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Malformed(err) => RegistryError::MalformedEntry(err),
            err => RegistryError::Transport(err),
        }
    }
}
