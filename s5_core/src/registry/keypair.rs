use super::{PublicKey, SIGNATURE_SIZE};
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;

/// BLAKE3 derivation context for [`KeyPair::derive`].
const DERIVE_CONTEXT: &str = "s5/registry/ed25519";

/// Ed25519 keypair used to sign registry entries.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Expands a 32-byte secret seed into the full keypair.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Derives a keypair from arbitrary secret material.
    ///
    /// The seed is `blake3::derive_key("s5/registry/ed25519", secret)`, so the
    /// same secret always yields the same registry identity.
    pub fn derive(secret: &[u8]) -> Self {
        Self::from_seed(&blake3::derive_key(DERIVE_CONTEXT, secret))
    }

    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::Ed25519(self.signing_key.verifying_key().to_bytes())
    }

    /// Detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl From<[u8; 32]> for KeyPair {
    fn from(seed: [u8; 32]) -> Self {
        Self::from_seed(&seed)
    }
}

impl From<SigningKey> for KeyPair {
    fn from(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }
}

impl From<&KeyPair> for KeyPair {
    fn from(keypair: &KeyPair) -> Self {
        keypair.clone()
    }
}
