//! Control frames sent over the registry subscription channel.

use super::{EntryError, PublicKey, entry::encode_cbor};
use bytes::Bytes;
use minicbor::Decoder;

/// Opcode asking the portal to push updates for one public key.
pub const OPCODE_SUBSCRIBE: u8 = 2;

/// `[opcode = 2, tagged_public_key]`, framed like an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub public_key: PublicKey,
}

impl SubscribeRequest {
    pub fn new(public_key: PublicKey) -> Self {
        Self { public_key }
    }

    pub fn encode(&self) -> Bytes {
        encode_cbor(|e| {
            e.array(2)?
                .u8(OPCODE_SUBSCRIBE)?
                .bytes(&self.public_key.to_tagged_bytes())?;
            Ok(())
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EntryError> {
        let mut d = Decoder::new(bytes);
        let fields = d.array()?.ok_or(EntryError::IndefiniteLength)?;
        if fields != 2 {
            return Err(EntryError::InvalidFieldCount(fields));
        }
        let opcode = d.u8()?;
        if opcode != OPCODE_SUBSCRIBE {
            return Err(EntryError::InvalidOpcode(opcode));
        }
        let public_key = PublicKey::from_tagged_bytes(d.bytes()?)?;

        let trailing = bytes.len() - d.position();
        if trailing > 0 {
            return Err(EntryError::TrailingBytes(trailing));
        }
        Ok(Self { public_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::KEY_TYPE_ED25519;

    #[test]
    fn test_subscribe_frame_layout() {
        let key = PublicKey::Ed25519([4; 32]);
        let frame = SubscribeRequest::new(key).encode();
        // array(2), uint 2, bytes(33) head, tag, key
        assert_eq!(&frame[..5], &[0x82, 0x02, 0x58, 0x21, KEY_TYPE_ED25519]);
        assert_eq!(frame.len(), 4 + 33);
        assert_eq!(SubscribeRequest::decode(&frame).unwrap().public_key, key);
    }

    #[test]
    fn test_subscribe_frame_rejects_other_opcode() {
        let mut frame = SubscribeRequest::new(PublicKey::Ed25519([4; 32]))
            .encode()
            .to_vec();
        frame[1] = 0x01;
        assert!(matches!(
            SubscribeRequest::decode(&frame),
            Err(EntryError::InvalidOpcode(1))
        ));
    }
}
