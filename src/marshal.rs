use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::{errors::IndexerError, hashing::Hasher};

/// Serializes chain objects for hashing, sizing and the websocket wire.
pub trait Marshalizer: Send + Sync {
    fn marshal_value(&self, value: &serde_json::Value) -> anyhow::Result<Vec<u8>>;
}

impl dyn Marshalizer + '_ {
    pub fn marshal<T: Serialize>(&self, value: &T) -> anyhow::Result<Vec<u8>> {
        self.marshal_value(&serde_json::to_value(value)?)
    }

    pub fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

pub struct JsonMarshalizer;

impl Marshalizer for JsonMarshalizer {
    fn marshal_value(&self, value: &serde_json::Value) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }
}

/// Builds a marshalizer from its configured name.
pub fn new_marshalizer(kind: &str) -> anyhow::Result<Arc<dyn Marshalizer>> {
    match kind {
        "json" => Ok(Arc::new(JsonMarshalizer)),
        other => Err(IndexerError::UnknownMarshalizerType(other.to_string()).into()),
    }
}

/// Hash of the marshalled representation of an object, the identity used for
/// miniblocks and headers.
pub fn calculate_hash<T: Serialize>(
    marshalizer: &dyn Marshalizer,
    hasher: &dyn Hasher,
    value: &T,
) -> anyhow::Result<Vec<u8>> {
    let bytes = marshalizer.marshal(value)?;
    Ok(hasher.compute(&bytes))
}
