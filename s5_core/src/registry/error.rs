/// Structural failures of the registry entry codec.
///
/// Any of these means the bytes or text could not be turned into a
/// well-formed entry; they never describe a signature problem.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum EntryError {
    #[error("invalid public key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("unknown public key type: {0:#x}")]
    UnknownKeyType(u8),

    #[error("invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("entry data is empty")]
    EmptyData,

    #[error("entry data too large: {size} bytes (max: {max})")]
    DataTooLarge { size: usize, max: usize },

    #[error("unexpected record kind: {0:#x}")]
    InvalidRecordKind(u8),

    #[error("unexpected opcode: {0}")]
    InvalidOpcode(u8),

    #[error("unexpected field count: {0}")]
    InvalidFieldCount(u64),

    #[error("indefinite-length arrays are not allowed")]
    IndefiniteLength,

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),

    #[error("invalid cbor: {0}")]
    Cbor(#[from] minicbor::decode::Error),

    #[error("invalid base64url in field `{field}`: {source}")]
    Base64 {
        field: &'static str,
        source: base64::DecodeError,
    },

    #[error("invalid record json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("signing key does not match the entry public key")]
    SigningKeyMismatch,
}

/// Failure reported by a [`RegistryApi`](super::RegistryApi) transport.
///
/// The registry protocol never retries these; they are handed to the caller
/// as produced by the transport.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The portal answered with a non-success status (other than the
    /// "not found" status on reads, which is not an error).
    #[error("portal responded with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The portal answered successfully but its body is not an entry record.
    #[error("portal returned a malformed entry record: {0}")]
    Malformed(#[from] EntryError),

    /// Network, IO or protocol failure below the HTTP status level.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    /// The HTTP status code, if the portal produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Malformed(_) | TransportError::Other(_) => None,
        }
    }
}
