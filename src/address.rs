use std::sync::Arc;

use crate::errors::IndexerError;

/// Encodes and decodes raw public keys for storage in documents. Address
/// encoders beyond hex (bech32 and friends) are external collaborators; the
/// hex converter is the implementation the crate and its tests use.
pub trait PubkeyConverter: Send + Sync {
    fn encode(&self, pubkey: &[u8]) -> String;
    fn decode(&self, encoded: &str) -> anyhow::Result<Vec<u8>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed-length hex converter. The optional human-readable prefix from the
/// configuration is kept for validation of incoming encoded addresses.
pub struct HexPubkeyConverter {
    length: usize,
    prefix: String,
}

impl HexPubkeyConverter {
    pub fn new(length: usize, prefix: impl Into<String>) -> Self {
        HexPubkeyConverter {
            length,
            prefix: prefix.into(),
        }
    }
}

impl PubkeyConverter for HexPubkeyConverter {
    fn encode(&self, pubkey: &[u8]) -> String {
        hex::encode(pubkey)
    }

    fn decode(&self, encoded: &str) -> anyhow::Result<Vec<u8>> {
        let stripped = encoded.strip_prefix(&self.prefix).unwrap_or(encoded);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != self.length {
            return Err(IndexerError::InvalidPubkeyLength {
                got: bytes.len(),
                want: self.length,
            }
            .into());
        }
        Ok(bytes)
    }

    fn len(&self) -> usize {
        self.length
    }
}

pub fn new_address_converter(length: usize, prefix: &str) -> Arc<dyn PubkeyConverter> {
    Arc::new(HexPubkeyConverter::new(length, prefix))
}

pub fn new_validator_keys_converter(length: usize) -> Arc<dyn PubkeyConverter> {
    Arc::new(HexPubkeyConverter::new(length, ""))
}

/// A smart-contract address: fixed 32 bytes with the leading 8 bytes zeroed
/// (the VM type bytes follow).
pub fn is_smart_contract_address(address: &[u8]) -> bool {
    address.len() == 32 && address[..8].iter().all(|b| *b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let converter = HexPubkeyConverter::new(4, "");
        let encoded = converter.encode(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(encoded, "deadbeef");
        assert_eq!(converter.decode(&encoded).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let converter = HexPubkeyConverter::new(4, "");
        assert!(converter.decode("dead").is_err());
    }

    #[test]
    fn smart_contract_addresses_have_zeroed_prefix() {
        let mut address = vec![0u8; 32];
        address[8] = 5;
        assert!(is_smart_contract_address(&address));

        address[0] = 1;
        assert!(!is_smart_contract_address(&address));
        assert!(!is_smart_contract_address(&[0u8; 20]));
    }
}
