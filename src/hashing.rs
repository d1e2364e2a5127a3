use std::sync::Arc;

use blake2::{digest::consts::U32, Blake2b, Digest};
use sha2::Sha256;

use crate::errors::IndexerError;

/// Cryptographic hasher used for miniblock and header hashes.
pub trait Hasher: Send + Sync {
    fn compute(&self, data: &[u8]) -> Vec<u8>;
}

pub struct Blake2bHasher;

impl Hasher for Blake2bHasher {
    fn compute(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }
}

pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn compute(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().to_vec()
    }
}

/// Builds a hasher from its configured name.
pub fn new_hasher(kind: &str) -> anyhow::Result<Arc<dyn Hasher>> {
    match kind {
        "blake2b" => Ok(Arc::new(Blake2bHasher)),
        "sha256" => Ok(Arc::new(Sha256Hasher)),
        other => Err(IndexerError::UnknownHasherType(other.to_string()).into()),
    }
}
